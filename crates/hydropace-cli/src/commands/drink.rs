use clap::Args;

use super::open_service;

#[derive(Args)]
pub struct DrinkArgs {
    /// Amount in milliliters; defaults to the configured dose
    #[arg(long)]
    ml: Option<u32>,
}

pub fn run(user: i64, args: DrinkArgs) -> Result<(), Box<dyn std::error::Error>> {
    let service = open_service()?;
    // The confirmation goes out through the messenger (stdout here).
    service.log_consumption(user, args.ml)?;
    Ok(())
}
