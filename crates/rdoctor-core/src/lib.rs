//! `rdoctor` Core Library
//!
//! Shared functionality for `rdoctor` components:
//! - Captured line model for child process output
//! - Wire encoding for the remote collector
//! - Configuration resolution
//! - Common error types

pub mod config;
pub mod encoder;
pub mod error;
pub mod line;
pub mod tracing_init;

pub use config::Config;
pub use encoder::encode_line;
pub use error::{Error, Result};
pub use line::{CapturedLine, Origin};
