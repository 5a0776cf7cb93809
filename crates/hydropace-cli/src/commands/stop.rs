use super::open_service;

pub fn run(user: i64) -> Result<(), Box<dyn std::error::Error>> {
    let service = open_service()?;
    service.unsubscribe(user)?;
    println!(
        "Settings cleared for user {user}. No more reminders will be sent; \
         run `setup` to start again."
    );
    Ok(())
}
