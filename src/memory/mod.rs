//! Scanning and patching of process memory
//!
//! - [`scanner`]: chunked search for a fixed byte needle
//! - [`patcher`]: validate-then-write of the cells the scanner found

pub mod patcher;
pub mod scanner;

pub use patcher::{classify, PatchOutcome, ValidatingPatcher};
pub use scanner::{ChunkRead, ChunkedScanner, ScanOptions, ScanWindow};
