//! Schema model definitions
//!
//! Loops are immutable once built and are shared by reference across
//! all runtime stack frames of a conversion; nothing here is mutated
//! after registration.

use crate::{Error, Result};
use std::collections::HashMap;

/// How many times a loop or segment may occur within its parent scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repetition {
    Bounded(u32),
    Unbounded,
}

impl Repetition {
    /// Whether one more occurrence is allowed after `used` occurrences
    pub fn allows_another(&self, used: u32) -> bool {
        match self {
            Repetition::Unbounded => true,
            Repetition::Bounded(bound) => used < *bound,
        }
    }
}

impl Default for Repetition {
    fn default() -> Self {
        Repetition::Bounded(1)
    }
}

/// A data segment directly owned by a loop
#[derive(Debug, Clone)]
pub struct SegmentUse {
    pub id: String,
    pub repetition: Repetition,
}

/// One node of the loop tree: a named, repeatable group of segments
/// recognized by its starting segment (optionally narrowed by a
/// qualifier value in that segment's second field)
#[derive(Debug, Clone)]
pub struct Loop {
    id: String,
    repetition: Repetition,
    start_segment: String,
    start_qualifier: Option<String>,
    end_segment: Option<String>,
    segments: HashMap<String, SegmentUse>,
    children: Vec<Loop>,
}

impl Loop {
    /// Create a loop definition; the id and starting segment id are
    /// required and must be non-empty
    pub fn new(
        id: impl Into<String>,
        repetition: Repetition,
        start_segment: impl Into<String>,
    ) -> Result<Self> {
        let id = id.into();
        let start_segment = start_segment.into();
        if id.is_empty() || start_segment.is_empty() {
            return Err(Error::MissingLoopAttributes);
        }
        Ok(Self {
            id,
            repetition,
            start_segment,
            start_qualifier: None,
            end_segment: None,
            segments: HashMap::new(),
            children: Vec::new(),
        })
    }

    /// Require a qualifier value in the starting segment's second field
    pub fn with_start_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.start_qualifier = Some(qualifier.into());
        self
    }

    /// Declare an explicit ending segment for the loop
    pub fn with_end_segment(mut self, end_segment: impl Into<String>) -> Self {
        self.end_segment = Some(end_segment.into());
        self
    }

    /// Declare a directly-owned data segment
    pub fn add_segment(&mut self, id: impl Into<String>, repetition: Repetition) {
        let id = id.into();
        self.segments.insert(
            id.to_ascii_uppercase(),
            SegmentUse { id, repetition },
        );
    }

    /// Append a child loop; declared order decides match priority
    pub fn add_child(&mut self, child: Loop) {
        self.children.push(child);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn repetition(&self) -> Repetition {
        self.repetition
    }

    pub fn start_segment(&self) -> &str {
        &self.start_segment
    }

    /// Whether a segment opens this loop.
    ///
    /// When a qualifier is declared, the segment id must match and the
    /// qualifier must equal the segment's second field. A segment that
    /// has no second field at all still matches on id alone; schemas
    /// relying on qualifiers to split near-duplicate segment ids can
    /// over-match through this branch.
    pub fn is_starting_segment(&self, id: &str, qualifier: Option<&str>) -> bool {
        if !self.start_segment.eq_ignore_ascii_case(id) {
            return false;
        }
        match (&self.start_qualifier, qualifier) {
            (Some(want), Some(got)) => want.eq_ignore_ascii_case(got),
            _ => true,
        }
    }

    pub fn has_end_segment(&self) -> bool {
        self.end_segment.as_deref().is_some_and(|e| !e.is_empty())
    }

    pub fn is_end_segment(&self, id: &str) -> bool {
        self.end_segment
            .as_deref()
            .is_some_and(|e| e.eq_ignore_ascii_case(id))
    }

    /// Whether a segment id belongs to this loop's direct data segments
    pub fn has_segment(&self, id: &str) -> bool {
        self.segments.contains_key(&id.to_ascii_uppercase())
    }

    pub fn segment_use(&self, id: &str) -> Option<&SegmentUse> {
        self.segments.get(&id.to_ascii_uppercase())
    }

    pub fn children(&self) -> &[Loop] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// Transaction boundary markers fixed by the X12 standard
const TRANSACTION_START: &str = "ST";
const TRANSACTION_END: &str = "SE";

/// The distinguished root loop of a transaction set, bounded by the
/// ST/SE markers and keyed by (transaction type, implementation
/// convention)
#[derive(Debug, Clone)]
pub struct TransactionSet {
    convention: Option<String>,
    root: Loop,
}

impl TransactionSet {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::MissingTransactionSetId);
        }
        let root = Loop::new(id, Repetition::default(), TRANSACTION_START)?
            .with_end_segment(TRANSACTION_END);
        Ok(Self {
            convention: None,
            root,
        })
    }

    /// Narrow this definition to one implementation convention
    pub fn with_convention(mut self, convention: impl Into<String>) -> Self {
        self.convention = Some(convention.into());
        self
    }

    pub fn id(&self) -> &str {
        self.root.id()
    }

    pub fn convention(&self) -> Option<&str> {
        self.convention.as_deref()
    }

    pub fn root(&self) -> &Loop {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Loop {
        &mut self.root
    }
}
