//! Exit status decoding.

use std::process::ExitStatus;

/// Offset added to a terminating signal number, as shells report it.
pub const SIGNAL_EXIT_BASE: i32 = 128;

/// Map a child's exit status to the code this process exits with.
///
/// A normal exit yields its code; a signal-terminated child yields
/// `128 + signal` on Unix. Anything undecodable yields 0.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return SIGNAL_EXIT_BASE + signal;
        }
    }
    0
}
