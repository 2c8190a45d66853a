//! Line capture from child output streams.

pub mod combiner;
pub mod reader;

pub use combiner::combine;
pub use reader::{READER_HANDOFF_CAPACITY, read_lines};
