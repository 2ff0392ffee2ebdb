use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "guardian-cli", version, about = "Guardian personal-safety CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Raise an SOS alert after a cancellable countdown
    Sos(commands::sos::SosArgs),
    /// Current position
    Location {
        #[command(subcommand)]
        action: commands::location::LocationAction,
    },
    /// Journey tracking
    Journey {
        #[command(subcommand)]
        action: commands::journey::JourneyAction,
    },
    /// Emergency contacts
    Contacts {
        #[command(subcommand)]
        action: commands::contacts::ContactsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Logs go to stderr so stdout stays machine-readable. Filter with GUARDIAN_LOG.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("GUARDIAN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Sos(args) => commands::sos::run(args).await,
        Commands::Location { action } => commands::location::run(action).await,
        Commands::Journey { action } => commands::journey::run(action).await,
        Commands::Contacts { action } => commands::contacts::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
