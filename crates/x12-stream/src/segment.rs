//! Segment and element model
//!
//! A [`Segment`] owns one delimited record exactly as the tokenizer
//! produced it (terminator included) and exposes its elements as
//! offset/length views into that buffer. Nothing is copied per element.

use crate::{Error, Result};

/// Half-open view into the segment buffer
#[derive(Debug, Clone, Copy)]
struct Span {
    offset: usize,
    len: usize,
}

/// One delimited X12 record and its elements
#[derive(Debug, Clone)]
pub struct Segment {
    data: String,
    elements: Vec<Span>,
}

impl Segment {
    /// Split a normalized record into elements using the element and
    /// segment delimiters simultaneously.
    ///
    /// Bytes after the last delimiter are not part of any element and
    /// are dropped. Fails with [`Error::EmptySegment`] when no element
    /// results, which cannot happen for tokenizer output.
    pub fn new(data: String, element_sep: u8, segment_sep: u8) -> Result<Self> {
        let mut elements = Vec::new();
        let mut start = 0;

        for (i, &b) in data.as_bytes().iter().enumerate() {
            if b == element_sep || b == segment_sep {
                elements.push(Span {
                    offset: start,
                    len: i - start,
                });
                start = i + 1;
            }
        }

        if elements.is_empty() {
            return Err(Error::EmptySegment);
        }

        Ok(Self { data, elements })
    }

    /// Number of elements, counting the segment id as element 0
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Check whether an element exists at the given index
    pub fn has_element(&self, index: usize) -> bool {
        index < self.elements.len()
    }

    /// Bounds-checked element access
    pub fn element(&self, index: usize) -> Result<&str> {
        let span = self
            .elements
            .get(index)
            .ok_or(Error::ElementIndex {
                index,
                count: self.elements.len(),
            })?;
        Ok(&self.data[span.offset..span.offset + span.len])
    }

    /// The segment id (first element); always present by construction
    pub fn id(&self) -> &str {
        let span = self.elements[0];
        &self.data[span.offset..span.offset + span.len]
    }

    /// The second element, often a qualifier value, when present
    pub fn qualifier(&self) -> Option<&str> {
        self.elements
            .get(1)
            .map(|span| &self.data[span.offset..span.offset + span.len])
    }

    /// Case-insensitive compare of the segment id
    pub fn is_named(&self, name: &str) -> bool {
        self.id().eq_ignore_ascii_case(name)
    }

    /// The underlying record, terminator included
    pub fn raw(&self) -> &str {
        &self.data
    }
}
