use clap::Subcommand;
use studydrill_core::storage::Database;

#[derive(Subcommand)]
pub enum CatalogAction {
    /// List all exams with worksheet and exercise counts
    Exams,
    /// Show one exercise
    Exercise { exercise_id: i64 },
}

pub fn run(action: CatalogAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        CatalogAction::Exams => {
            let exams = db.list_exams()?;
            println!("{}", serde_json::to_string_pretty(&exams)?);
        }
        CatalogAction::Exercise { exercise_id } => match db.get_exercise(exercise_id)? {
            Some(exercise) => println!("{}", serde_json::to_string_pretty(&exercise)?),
            None => {
                eprintln!("error: exercise {exercise_id} not found");
                std::process::exit(1);
            }
        },
    }
    Ok(())
}
