mod engine;

pub use engine::{AttemptTimer, TimerState};
