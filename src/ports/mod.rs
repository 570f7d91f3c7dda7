//! Port traits the domain talks through.

pub mod candle_port;
pub mod config_port;
pub mod notify_port;
pub mod result_port;
pub mod session_port;
