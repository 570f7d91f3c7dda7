//! Concrete implementations of the ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod log_notifier;
pub mod memory_store;
pub mod source;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
