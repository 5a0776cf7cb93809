use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "hydropace-cli", version, about = "Hydropace CLI")]
struct Cli {
    /// User id to operate on
    #[arg(long, global = true, default_value_t = 1)]
    user: i64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up (or replace) a hydration profile
    Setup(commands::setup::SetupArgs),
    /// Log a drink
    Drink(commands::drink::DrinkArgs),
    /// Postpone the current reminder without logging
    Postpone(commands::postpone::PostponeArgs),
    /// Show today's consumption overview
    Status(commands::status::StatusArgs),
    /// Run the reminder poller
    Remind(commands::remind::RemindArgs),
    /// Midnight job: reset daily state for all users
    Reset,
    /// Delete the profile and stop all reminders
    Stop,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Setup(args) => commands::setup::run(cli.user, args),
        Commands::Drink(args) => commands::drink::run(cli.user, args),
        Commands::Postpone(args) => commands::postpone::run(cli.user, args),
        Commands::Status(args) => commands::status::run(cli.user, args),
        Commands::Remind(args) => commands::remind::run(args),
        Commands::Reset => commands::reset::run(),
        Commands::Stop => commands::stop::run(cli.user),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
