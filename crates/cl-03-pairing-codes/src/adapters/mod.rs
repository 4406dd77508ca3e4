//! Adapters layer for pairing codes.

pub mod code_source;

pub use code_source::{RandomCodeSource, SequenceCodeSource};
