//! Envelope sequencing state machine
//!
//! The ISA/GS/ST markers nest strictly; this coarse state gates which
//! segment ids are legal before a segment is routed any deeper.

/// Envelope segment ids fixed by the X12 standard
pub const INTERCHANGE_START: &str = "ISA";
pub const INTERCHANGE_END: &str = "IEA";
pub const INTERCHANGE_ACK: &str = "TA1";
pub const GROUP_START: &str = "GS";
pub const GROUP_END: &str = "GE";
pub const TRANSACTION_START: &str = "ST";
pub const TRANSACTION_END: &str = "SE";

/// Where the conversion currently sits inside the envelope nesting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,
    InterchangeOpen,
    GroupOpen,
    TransactionOpen,
}

impl EnvelopeState {
    /// Whether a segment id is legal in this state. Inside an open
    /// transaction every id is legal; detail segments are classified
    /// further by the loop-match engine.
    pub fn allows(self, id: &str) -> bool {
        match self {
            EnvelopeState::Idle => id.eq_ignore_ascii_case(INTERCHANGE_START),
            EnvelopeState::InterchangeOpen => {
                id.eq_ignore_ascii_case(GROUP_START)
                    || id.eq_ignore_ascii_case(INTERCHANGE_END)
                    || id.eq_ignore_ascii_case(INTERCHANGE_ACK)
            }
            EnvelopeState::GroupOpen => {
                id.eq_ignore_ascii_case(TRANSACTION_START) || id.eq_ignore_ascii_case(GROUP_END)
            }
            EnvelopeState::TransactionOpen => true,
        }
    }

    /// Human-readable position, used in error context
    pub fn context(self) -> &'static str {
        match self {
            EnvelopeState::Idle => "no interchange is open",
            EnvelopeState::InterchangeOpen => "an interchange is open",
            EnvelopeState::GroupOpen => "a functional group is open",
            EnvelopeState::TransactionOpen => "a transaction set is open",
        }
    }
}
