use clap::Args;
use hydropace_core::UserRecordStore;

use super::open_service;

#[derive(Args)]
pub struct StatusArgs {
    /// Print the raw reminder state as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(user: i64, args: StatusArgs) -> Result<(), Box<dyn std::error::Error>> {
    let service = open_service()?;
    if args.json {
        let state = service.store().load(user)?;
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        println!("{}", service.daily_overview(user)?);
    }
    Ok(())
}
