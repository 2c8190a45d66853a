//! rdoctor Library
//!
//! Wraps a child command and forwards its output:
//! - Line capture from the child's stdout/stderr with local echo
//! - Subprocess supervision, signal relay and exit-code resolution
//! - Lossy buffering and a reconnecting WebSocket client for the collector
//! - First-run setup of the collector credentials

pub mod capture;
pub mod forward;
pub mod runner;
pub mod setup;
pub mod subprocess;
