//! Logging utilities.
//!
//! Centralizes logger initialization. The library itself only uses the
//! `log` facade; hosts that want output call [`init_logging`] early in
//! `main` or install their own backend.

mod init;

pub use init::{LoggingConfig, init_logging};
