//! Logging setup shared by gateway binaries.
//!
//! Filtering follows `RUST_LOG`, defaulting to `info`.

pub mod init;

pub use init::{LogFormat, init_json_telemetry, init_telemetry, init_with_format};
