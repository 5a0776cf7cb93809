use super::open_service;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let service = open_service()?;
    let count = service.reset_daily()?;
    if count == 0 {
        println!("No initialized users found. Nothing to do.");
    } else {
        println!("Reset daily state for {count} user(s).");
    }
    Ok(())
}
