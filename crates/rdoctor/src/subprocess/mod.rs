//! Supervision of the wrapped child process.

pub mod exit;
pub mod signals;
pub mod supervisor;

pub use exit::exit_code;
pub use signals::SignalRelay;
pub use supervisor::{SupervisedChild, Supervisor, SupervisorError};
