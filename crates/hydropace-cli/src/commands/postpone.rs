use clap::Args;

use super::open_service;

#[derive(Args)]
pub struct PostponeArgs {
    /// Postpone duration in seconds; defaults to the configured value
    #[arg(long)]
    seconds: Option<f64>,
}

pub fn run(user: i64, args: PostponeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let service = open_service()?;
    let message = service.postpone(user, args.seconds)?;
    println!("{message}");
    Ok(())
}
