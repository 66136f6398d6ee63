use clap::Args;
use studydrill_core::round_progress;
use studydrill_core::storage::{Config, Database};

#[derive(Args)]
pub struct ProgressArgs {
    /// Minimum point value (inclusive)
    #[arg(long)]
    min: Option<u32>,
    /// Maximum point value (inclusive)
    #[arg(long)]
    max: Option<u32>,
    /// Restrict to one exam
    #[arg(long)]
    exam: Option<i64>,
}

pub fn run(args: ProgressArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let filter = super::filter_from_args(args.min, args.max, args.exam, &config)?;
    let progress = round_progress(&db, &filter)?;
    println!("{}", serde_json::to_string_pretty(&progress)?);
    Ok(())
}
