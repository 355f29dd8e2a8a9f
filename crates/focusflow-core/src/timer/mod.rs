mod engine;

pub use engine::{TimerRecord, TimerService, TimerState};
