//! ISA interchange header
//!
//! The ISA segment is the only fixed-width record in X12: exactly 106
//! bytes, with the element separator defined by byte 3 and repeated at
//! fourteen further fixed positions. Every field is addressed by byte
//! offset rather than by delimiter scanning, which is what lets the
//! header carry the component separator as data.

use crate::segment::Segment;
use crate::syntax::Delimiters;
use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::borrow::Cow;

/// Length of the ISA header in bytes
pub const ISA_LENGTH: usize = 106;

/// Positions that must repeat the element separator found at byte 3.
/// The first nine fall inside the first 80 bytes and can be checked
/// before any line-wrap normalization; the last six cannot.
const LEADING_SEPARATORS: [usize; 9] = [6, 17, 20, 31, 34, 50, 53, 69, 76];
const TRAILING_SEPARATORS: [usize; 6] = [81, 83, 89, 99, 101, 103];

pub(crate) fn leading_separators_valid(buf: &[u8]) -> bool {
    let sep = buf[3];
    LEADING_SEPARATORS.iter().all(|&i| buf[i] == sep)
}

pub(crate) fn trailing_separators_valid(buf: &[u8]) -> bool {
    let sep = buf[3];
    TRAILING_SEPARATORS.iter().all(|&i| buf[i] == sep)
}

/// Validated, normalized 106-byte interchange header
#[derive(Debug, Clone)]
pub struct IsaSegment {
    data: [u8; ISA_LENGTH],
}

impl IsaSegment {
    /// Validate the header tag and all fifteen separator positions
    pub fn new(data: [u8; ISA_LENGTH]) -> Result<Self> {
        if &data[0..3] != b"ISA" {
            return Err(Error::InvalidHeader {
                reason: "invalid ISA tag",
            });
        }

        if !leading_separators_valid(&data) || !trailing_separators_valid(&data) {
            return Err(Error::InvalidHeader {
                reason: "invalid ISA element separators",
            });
        }

        Ok(Self { data })
    }

    /// Validate a header from a slice, checking its length first
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let data: [u8; ISA_LENGTH] = data.try_into().map_err(|_| Error::InvalidHeader {
            reason: "invalid ISA length",
        })?;
        Self::new(data)
    }

    fn field(&self, offset: usize, len: usize) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data[offset..offset + len])
    }

    /// The raw header bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// ISA01 - authorization information qualifier
    pub fn authorization_qualifier(&self) -> Cow<'_, str> {
        self.field(4, 2)
    }

    /// ISA02 - authorization information
    pub fn authorization_information(&self) -> Cow<'_, str> {
        self.field(7, 10)
    }

    /// ISA03 - security information qualifier
    pub fn security_qualifier(&self) -> Cow<'_, str> {
        self.field(18, 2)
    }

    /// ISA04 - security information
    pub fn security_information(&self) -> Cow<'_, str> {
        self.field(21, 10)
    }

    /// ISA05 - interchange sender id qualifier
    pub fn sender_id_qualifier(&self) -> Cow<'_, str> {
        self.field(32, 2)
    }

    /// ISA06 - interchange sender id
    pub fn sender_id(&self) -> Cow<'_, str> {
        self.field(35, 15)
    }

    /// ISA07 - interchange receiver id qualifier
    pub fn receiver_id_qualifier(&self) -> Cow<'_, str> {
        self.field(51, 2)
    }

    /// ISA08 - interchange receiver id
    pub fn receiver_id(&self) -> Cow<'_, str> {
        self.field(54, 15)
    }

    /// ISA09 - interchange date (YYMMDD)
    pub fn interchange_date(&self) -> Cow<'_, str> {
        self.field(70, 6)
    }

    /// ISA10 - interchange time (HHMM)
    pub fn interchange_time(&self) -> Cow<'_, str> {
        self.field(77, 4)
    }

    /// ISA09/ISA10 combined, when both parse cleanly
    pub fn interchange_datetime(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::parse_from_str(self.interchange_date().as_ref(), "%y%m%d").ok()?;
        let time = NaiveTime::parse_from_str(self.interchange_time().as_ref(), "%H%M").ok()?;
        Some(NaiveDateTime::new(date, time))
    }

    /// ISA12 - interchange control version number
    pub fn control_version(&self) -> Cow<'_, str> {
        self.field(84, 5)
    }

    /// ISA13 - interchange control number
    pub fn control_number(&self) -> Cow<'_, str> {
        self.field(90, 9)
    }

    /// ISA14 - acknowledgment requested flag
    pub fn ack_requested(&self) -> u8 {
        self.data[100]
    }

    /// ISA15 - usage indicator (P=production, T=test)
    pub fn usage_indicator(&self) -> u8 {
        self.data[102]
    }

    /// Element separator (byte 3)
    pub fn element_separator(&self) -> u8 {
        self.data[3]
    }

    /// ISA11 - repetition separator (byte 82)
    pub fn repetition_separator(&self) -> u8 {
        self.data[82]
    }

    /// ISA16 - component (sub-element) separator (byte 104)
    pub fn component_separator(&self) -> u8 {
        self.data[104]
    }

    /// Segment terminator (byte 105)
    pub fn segment_separator(&self) -> u8 {
        self.data[105]
    }

    /// The full delimiter set for the interchange
    pub fn delimiters(&self) -> Delimiters {
        Delimiters {
            element: self.element_separator(),
            component: self.component_separator(),
            repetition: self.repetition_separator(),
            segment: self.segment_separator(),
        }
    }

    /// View the header as an ordinary segment for structural emission
    pub fn to_segment(&self) -> Result<Segment> {
        Segment::new(
            String::from_utf8_lossy(&self.data).into_owned(),
            self.element_separator(),
            self.segment_separator(),
        )
    }
}
