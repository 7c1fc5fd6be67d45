//! Logger initialization.
//!
//! Everything logs through the `log` facade; `env_logger` is installed once.

mod init;

pub use init::{init_logging, LoggingConfig};
