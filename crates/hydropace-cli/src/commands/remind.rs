use clap::Args;

use super::open_service;

#[derive(Args)]
pub struct RemindArgs {
    /// Keep polling instead of running a single pass
    #[arg(long)]
    watch: bool,
    /// Poll interval in seconds; keep this below the smallest
    /// configured minimum reminder interval
    #[arg(long, default_value_t = 60)]
    interval_seconds: u64,
}

pub fn run(args: RemindArgs) -> Result<(), Box<dyn std::error::Error>> {
    let service = open_service()?;
    loop {
        let report = service.run_all_ticks()?;
        log::debug!(
            "poll pass: {} users, {} sent, {} failed",
            report.polled,
            report.sent,
            report.failed
        );
        if !args.watch {
            if report.sent == 0 {
                println!("Nothing due ({} users polled).", report.polled);
            }
            return Ok(());
        }
        std::thread::sleep(std::time::Duration::from_secs(args.interval_seconds));
    }
}
