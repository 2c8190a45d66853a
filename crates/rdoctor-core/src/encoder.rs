//! Wire encoding for captured lines.
//!
//! Frame layout: `<origin><kind>|<epoch millis>|<sequence>|<text>` where
//! origin is `O`/`E` and kind is `L` (content) or `C` (stream closed). The
//! text is not escaped, so only the first three `|` are structural.

use std::fmt::Write as _;

use crate::line::CapturedLine;

/// Encode a captured line as a single text frame payload.
pub fn encode_line(line: &CapturedLine) -> String {
    let mut frame = String::with_capacity(line.text.len() + 32);
    frame.push(line.origin.marker());
    frame.push(if line.terminal { 'C' } else { 'L' });
    // Writing into a String cannot fail.
    let _ = write!(frame, "|{}|{}|", line.epoch_millis(), line.sequence);
    frame.push_str(&line.text);
    frame
}
