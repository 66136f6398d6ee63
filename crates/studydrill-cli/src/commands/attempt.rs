use clap::Subcommand;
use studydrill_core::storage::{Config, Database};
use studydrill_core::Session;

#[derive(Subcommand)]
pub enum AttemptAction {
    /// Start timing an attempt on an exercise
    Start {
        /// Exercise id (from `pick`)
        exercise_id: i64,
    },
    /// Pause the running attempt
    Pause,
    /// Resume the paused attempt
    Resume,
    /// Print the current attempt state as JSON (also drives the autosave)
    Status,
    /// Finish the attempt and record the duration
    Finalize,
    /// Abandon the attempt without recording a completion
    Cancel,
}

pub fn run(action: AttemptAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    // The timer survives between invocations through the checkpoint row.
    let mut session = Session::load(&config, &db)?;

    let event = match action {
        AttemptAction::Start { exercise_id } => session.start(&db, exercise_id)?,
        AttemptAction::Pause => session.pause(&db)?,
        AttemptAction::Resume => session.resume(&db)?,
        AttemptAction::Status => {
            if let Some(saved) = session.tick(&db)? {
                eprintln!("{}", serde_json::to_string(&saved)?);
            }
            session.snapshot()
        }
        AttemptAction::Finalize => session.finalize(&db)?,
        AttemptAction::Cancel => session.cancel(&db)?,
    };

    println!("{}", serde_json::to_string_pretty(&event)?);
    Ok(())
}
