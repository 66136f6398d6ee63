use clap::{Args, ValueEnum};
use studydrill_core::storage::{Config, Database};
use studydrill_core::{round_progress, select_next, Policy};

#[derive(Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    /// Breadth-first: finish the current round before repeating anything
    Round,
    /// Target the exercise with the worst time per point
    Slowest,
}

impl From<PolicyArg> for Policy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Round => Policy::RoundBased,
            PolicyArg::Slowest => Policy::SlowestTimePerPoint,
        }
    }
}

#[derive(Args)]
pub struct PickArgs {
    /// Minimum point value (inclusive)
    #[arg(long)]
    min: Option<u32>,
    /// Maximum point value (inclusive)
    #[arg(long)]
    max: Option<u32>,
    /// Restrict to one exam
    #[arg(long)]
    exam: Option<i64>,
    /// Selection policy
    #[arg(long, value_enum, default_value = "round")]
    policy: PolicyArg,
}

pub fn run(args: PickArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let filter = super::filter_from_args(args.min, args.max, args.exam, &config)?;

    let picked = select_next(&db, &filter, args.policy.into(), &mut rand::thread_rng())?;
    let progress = round_progress(&db, &filter)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "picked": picked,
            "progress": progress,
        }))?
    );
    Ok(())
}
