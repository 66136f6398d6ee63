pub mod attempt;
pub mod catalog;
pub mod config;
pub mod pick;
pub mod progress;
pub mod recover;
pub mod stats;

use studydrill_core::{ExerciseFilter, ScoreRange};

/// Build a candidate filter from CLI bounds, falling back to the configured
/// defaults when a bound is omitted.
pub fn filter_from_args(
    min: Option<u32>,
    max: Option<u32>,
    exam: Option<i64>,
    config: &studydrill_core::Config,
) -> Result<ExerciseFilter, Box<dyn std::error::Error>> {
    let range = ScoreRange::new(
        min.unwrap_or(config.selection.default_min_points),
        max.unwrap_or(config.selection.default_max_points),
    )?;
    Ok(match exam {
        Some(exam_id) => ExerciseFilter::for_exam(range, exam_id),
        None => ExerciseFilter::new(range),
    })
}
