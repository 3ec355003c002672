pub mod connection;
pub mod helpers;
pub mod models;
pub mod repositories;

mod migrations;

pub use connection::Database;
pub use models::GazeSample;
