pub mod connectivity;
pub mod controller;
pub mod engine;
pub mod loop_worker;

pub use connectivity::{Connectivity, NetworkProbe};
pub use controller::SyncController;
pub use engine::{SyncEngine, SyncOutcome, Uploader};
