use clap::Subcommand;
use studydrill_core::storage::{Config, Database};
use studydrill_core::Session;

#[derive(Subcommand)]
pub enum RecoverAction {
    /// Show the interrupted attempt, if any
    Show,
    /// Reconstruct the interrupted attempt (paused at the saved elapsed time)
    Resume,
    /// Delete the interrupted attempt without recording anything
    Discard,
}

pub fn run(action: RecoverAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;

    match action {
        RecoverAction::Show => match Session::recoverable(&db)? {
            Some(cp) => {
                let exercise = db.get_exercise(cp.exercise_id)?;
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "checkpoint": cp,
                        "exercise": exercise,
                    }))?
                );
            }
            None => println!("{{\"type\": \"nothing_to_recover\"}}"),
        },
        RecoverAction::Resume => {
            let mut session = Session::new(&config);
            let snapshot = session.resume_recovered(&db)?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        RecoverAction::Discard => {
            Session::discard_recovered(&db)?;
            println!("{{\"type\": \"recovery_discarded\"}}");
        }
    }
    Ok(())
}
