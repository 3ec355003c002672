pub mod controller;
pub mod loop_worker;
pub mod tracker;

pub use controller::SamplingController;
pub use tracker::{FrameOutcome, GazeTracker, SkipReason};
