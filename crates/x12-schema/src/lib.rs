//! # x12-schema
//!
//! Schema model, registry, and loader for X12 loop structure.
//!
//! An X12 transaction set carries no explicit grouping markers; its
//! nested, repeatable loops exist only in the implementation guide.
//! This crate models that guide as an immutable tree of [`Loop`]
//! definitions rooted at a [`TransactionSet`], registered by
//! transaction type and implementation convention.

pub mod loader;
pub mod model;
pub mod registry;

pub use model::{Loop, Repetition, SegmentUse, TransactionSet};
pub use registry::SchemaRegistry;

use thiserror::Error;

/// Errors that can occur when building or loading schemas
#[derive(Error, Debug)]
pub enum Error {
    #[error("loop definition is missing an id or start segment")]
    MissingLoopAttributes,

    #[error("transaction set definition is missing an id")]
    MissingTransactionSetId,

    #[error("invalid repetition value: {0}")]
    InvalidRepetition(i64),

    #[error("invalid schema format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
