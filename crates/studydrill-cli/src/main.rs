use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "studydrill-cli", version, about = "Studydrill CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick the next exercise to practice
    Pick(commands::pick::PickArgs),
    /// Attempt timer control
    Attempt {
        #[command(subcommand)]
        action: commands::attempt::AttemptAction,
    },
    /// Interrupted-attempt recovery
    Recover {
        #[command(subcommand)]
        action: commands::recover::RecoverAction,
    },
    /// Round progress for a score range
    Progress(commands::progress::ProgressArgs),
    /// Attempt statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Exercise catalog queries
    Catalog {
        #[command(subcommand)]
        action: commands::catalog::CatalogAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Pick(args) => commands::pick::run(args),
        Commands::Attempt { action } => commands::attempt::run(action),
        Commands::Recover { action } => commands::recover::run(action),
        Commands::Progress(args) => commands::progress::run(args),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Catalog { action } => commands::catalog::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
