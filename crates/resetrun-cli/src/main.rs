use clap::{Parser, Subcommand};
use resetrun_core::DateKey;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "resetrun-cli", version, about = "Reset Run CLI")]
struct Cli {
    /// Treat this calendar day as today (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<DateKey>,
    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// The 7-day run
    Run {
        #[command(subcommand)]
        action: commands::run::RunAction,
    },
    /// Daily goal, modes and session length
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Account sign-in and profile sync
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RESETRUN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let context = || commands::Context::load(cli.today, cli.json);
    let result = match cli.command {
        Commands::Run { action } => context().and_then(|ctx| commands::run::run(action, &ctx)),
        Commands::Settings { action } => {
            context().and_then(|ctx| commands::settings::run(action, &ctx))
        }
        Commands::Profile { action } => {
            context().and_then(|ctx| commands::profile::run(action, &ctx))
        }
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
