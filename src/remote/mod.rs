pub mod client;
pub mod types;

pub use client::RemoteClient;
pub use types::{to_time_series, MeasurementRecord, RemoteMeasurement};
