use clap::Subcommand;
use studydrill_core::storage::{Config, Database};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Aggregate statistics over a score range
    Summary {
        /// Minimum point value (inclusive)
        #[arg(long)]
        min: Option<u32>,
        /// Maximum point value (inclusive)
        #[arg(long)]
        max: Option<u32>,
        /// Restrict to one exam
        #[arg(long)]
        exam: Option<i64>,
    },
    /// Per-exercise attempt statistics
    Exercise { exercise_id: i64 },
    /// Time-per-point history, oldest first
    Series {
        /// Restrict to one exam
        #[arg(long)]
        exam: Option<i64>,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;

    match action {
        StatsAction::Summary { min, max, exam } => {
            let filter = super::filter_from_args(min, max, exam, &config)?;
            let stats = db.aggregate_stats(&filter)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Exercise { exercise_id } => match db.exercise_stats(exercise_id)? {
            Some(stats) => println!("{}", serde_json::to_string_pretty(&stats)?),
            None => println!("{{\"type\": \"no_completed_attempts\"}}"),
        },
        StatsAction::Series { exam } => {
            let series = db.time_per_point_series(exam)?;
            println!("{}", serde_json::to_string_pretty(&series)?);
        }
    }
    Ok(())
}
