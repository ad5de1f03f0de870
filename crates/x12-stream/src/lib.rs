//! # x12-stream
//!
//! Streaming tokenizer for ANSI X12 interchanges.
//!
//! This crate locates and validates the fixed-width ISA interchange
//! header (including the line-wrapped variants found in real files),
//! derives the delimiter set, and splits the remaining byte stream
//! into segments and elements.

pub mod isa;
pub mod reader;
pub mod segment;
pub mod syntax;

pub use isa::{ISA_LENGTH, IsaSegment};
pub use reader::InterchangeReader;
pub use segment::Segment;
pub use syntax::Delimiters;

use thiserror::Error;

/// Errors that can occur when tokenizing an X12 stream
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid interchange header: {reason}")]
    InvalidHeader { reason: &'static str },

    #[error("unrecognized interchange header")]
    UnrecognizedHeader,

    #[error("interchange header has not been read")]
    HeaderNotRead,

    #[error("incomplete segment at end of stream")]
    IncompleteSegment,

    #[error("segment contains no elements")]
    EmptySegment,

    #[error("element index {index} out of bounds (segment has {count} elements)")]
    ElementIndex { index: usize, count: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
