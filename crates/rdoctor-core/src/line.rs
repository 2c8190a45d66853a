//! Captured output line model.
//!
//! A [`CapturedLine`] is created once per line read from a child stream (plus
//! one terminal record per stream) and never mutated afterwards.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Which child stream produced a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Stdout,
    Stderr,
}

impl Origin {
    /// Single-letter wire marker: `O` for stdout, `E` for stderr.
    pub const fn marker(self) -> char {
        match self {
            Self::Stdout => 'O',
            Self::Stderr => 'E',
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of child output, stamped at capture time.
///
/// Sequence numbers are 1-based and private to the originating stream. The
/// terminal record carries the sequence number one past the last content line
/// and an empty `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLine {
    pub timestamp: SystemTime,
    pub text: String,
    pub sequence: u64,
    pub origin: Origin,
    pub terminal: bool,
}

impl CapturedLine {
    /// A content line captured now.
    pub fn content(origin: Origin, sequence: u64, text: impl Into<String>) -> Self {
        Self::at(SystemTime::now(), origin, sequence, text, false)
    }

    /// The end-of-stream record captured now.
    pub fn terminal(origin: Origin, sequence: u64) -> Self {
        Self::at(SystemTime::now(), origin, sequence, String::new(), true)
    }

    /// A record with an explicit timestamp.
    pub fn at(
        timestamp: SystemTime,
        origin: Origin,
        sequence: u64,
        text: impl Into<String>,
        terminal: bool,
    ) -> Self {
        Self {
            timestamp,
            text: text.into(),
            sequence,
            origin,
            terminal,
        }
    }

    /// Milliseconds since the Unix epoch; negative for earlier instants.
    pub fn epoch_millis(&self) -> i128 {
        match self.timestamp.duration_since(UNIX_EPOCH) {
            Ok(elapsed) => i128::try_from(elapsed.as_millis()).unwrap_or(i128::MAX),
            Err(before) => -i128::try_from(before.duration().as_millis()).unwrap_or(i128::MAX),
        }
    }
}

impl fmt::Display for CapturedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let origin = match self.origin {
            Origin::Stdout => "STDOUT",
            Origin::Stderr => "STDERR",
        };
        if self.terminal {
            write!(
                f,
                "{origin} {} EOF L{:03} {}",
                self.epoch_millis(),
                self.sequence,
                self.text
            )
        } else {
            write!(
                f,
                "{origin} {} L{:03} {}",
                self.epoch_millis(),
                self.sequence,
                self.text
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn terminal_record_has_empty_text() {
        let line = CapturedLine::terminal(Origin::Stderr, 4);
        assert!(line.terminal);
        assert!(line.text.is_empty());
        assert_eq!(line.sequence, 4);
        assert_eq!(line.origin, Origin::Stderr);
    }

    #[test]
    fn epoch_millis_truncates_sub_millisecond_part() {
        let ts = UNIX_EPOCH + Duration::from_micros(1_700_000_000_123_999);
        let line = CapturedLine::at(ts, Origin::Stdout, 1, "x", false);
        assert_eq!(line.epoch_millis(), 1_700_000_000_123);
    }

    #[test]
    fn epoch_millis_before_epoch_is_negative() {
        let ts = UNIX_EPOCH - Duration::from_millis(1500);
        let line = CapturedLine::at(ts, Origin::Stdout, 1, "", false);
        assert_eq!(line.epoch_millis(), -1500);
    }

    #[test]
    fn display_marks_terminal_records() {
        let ts = UNIX_EPOCH + Duration::from_millis(42);
        let content = CapturedLine::at(ts, Origin::Stdout, 7, "hi", false);
        let eof = CapturedLine::at(ts, Origin::Stderr, 8, "", true);
        assert_eq!(content.to_string(), "STDOUT 42 L007 hi");
        assert_eq!(eof.to_string(), "STDERR 42 EOF L008 ");
    }

    #[test]
    fn origin_markers() {
        assert_eq!(Origin::Stdout.marker(), 'O');
        assert_eq!(Origin::Stderr.marker(), 'E');
    }
}
