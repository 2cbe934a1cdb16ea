//! Windows-specific type definitions and wrappers

pub mod handle;

pub use handle::Handle;
