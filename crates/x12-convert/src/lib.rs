//! # x12-convert
//!
//! Structural conversion of one X12 interchange into scoped events.
//!
//! The interchange arrives as a flat segment stream; the loop structure
//! inside each transaction set exists only in its implementation guide.
//! [`X12Converter`] validates the envelope sequencing, binds the
//! matching schema per transaction set, and drives the loop-match
//! engine, which classifies every detail segment with no lookahead and
//! emits LIFO-balanced open/close/segment events to a [`ScopedSink`].

pub mod converter;
pub mod engine;
pub mod envelope;
pub mod json;
pub mod sink;

pub use converter::X12Converter;
pub use engine::LoopMatcher;
pub use envelope::EnvelopeState;
pub use json::JsonTreeSink;
pub use sink::{EventCollector, ScopedSink, StructureEvent};

use thiserror::Error;

/// Errors that can occur during conversion
#[derive(Error, Debug)]
pub enum Error {
    #[error("unexpected segment {id} while {context}")]
    UnexpectedSegment { id: String, context: &'static str },

    #[error("transaction start segment is missing its transaction set id")]
    MalformedTransactionStart,

    #[error("sink error: {0}")]
    Sink(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Stream(#[from] x12_stream::Error),

    #[error(transparent)]
    Schema(#[from] x12_schema::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
