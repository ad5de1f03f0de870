//! X12 delimiter set
//!
//! Unlike EDIFACT there are no standard defaults: all four delimiters
//! are dictated by fixed byte positions inside the ISA header and stay
//! constant for the lifetime of one interchange.

/// The four single-byte delimiters of an interchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    /// Element separator (commonly `*`)
    pub element: u8,
    /// Sub-element (component) separator (commonly `:`)
    pub component: u8,
    /// Repetition separator (commonly `^`)
    pub repetition: u8,
    /// Segment terminator (commonly `~`)
    pub segment: u8,
}

impl Delimiters {
    /// Check whether a byte is one of the structural delimiters
    pub fn is_delimiter(&self, byte: u8) -> bool {
        byte == self.element
            || byte == self.component
            || byte == self.repetition
            || byte == self.segment
    }
}
