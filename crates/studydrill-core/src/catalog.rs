//! Read-only exercise catalog model.
//!
//! Exams, worksheets and exercises are imported by an external tool and never
//! mutated by this library; the types here are the flattened read shapes the
//! selection engine and the CLI work with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SelectionError;

/// One exam with its catalog footprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub worksheet_count: u32,
    pub exercise_count: u32,
}

/// One exercise, flattened with its worksheet/exam identity for display.
///
/// `points` is strictly positive; the importer enforces this and the schema
/// carries a CHECK constraint as a backstop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,
    pub exam_id: i64,
    pub semester: u32,
    pub sheet_number: u32,
    pub label: String,
    pub points: u32,
}

impl Exercise {
    /// Short human-readable identity, e.g. `Sem3 Sheet5 Ex2b`.
    pub fn display_name(&self) -> String {
        format!(
            "Sem{} Sheet{} Ex{}",
            self.semester, self.sheet_number, self.label
        )
    }
}

/// Inclusive point-value filter bounding which exercises are eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRange {
    min: u32,
    max: u32,
}

impl ScoreRange {
    /// Build a range, rejecting `min > max`.
    ///
    /// # Errors
    /// Returns `SelectionError::InvalidRange` when the bounds are inverted.
    pub fn new(min: u32, max: u32) -> Result<Self, SelectionError> {
        if min > max {
            return Err(SelectionError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn contains(&self, points: u32) -> bool {
        points >= self.min && points <= self.max
    }
}

/// Candidate filter: a score range, optionally scoped to one exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseFilter {
    pub range: ScoreRange,
    pub exam_id: Option<i64>,
}

impl ExerciseFilter {
    pub fn new(range: ScoreRange) -> Self {
        Self {
            range,
            exam_id: None,
        }
    }

    pub fn for_exam(range: ScoreRange, exam_id: i64) -> Self {
        Self {
            range,
            exam_id: Some(exam_id),
        }
    }
}
