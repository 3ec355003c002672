pub mod controller;
pub mod state;

pub use controller::{FrameTicket, RecorderSnapshot, SampleRecorder};
pub use state::RecorderState;
