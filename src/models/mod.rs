pub mod session;

pub use session::{RecorderStatus, Session};
