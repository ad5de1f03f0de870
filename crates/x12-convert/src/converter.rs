//! Conversion orchestration
//!
//! Ties the tokenizer, the envelope state machine, and the loop-match
//! engine together: one `convert` call reads exactly one interchange
//! from the input and emits its complete, balanced event stream to the
//! sink. Trailing data after the interchange trailer is left in the
//! stream untouched.

use crate::engine::LoopMatcher;
use crate::envelope::{
    EnvelopeState, GROUP_END, GROUP_START, INTERCHANGE_ACK, INTERCHANGE_END, TRANSACTION_END,
    TRANSACTION_START,
};
use crate::sink::ScopedSink;
use crate::{Error, Result};
use std::io::BufRead;
use tracing::{debug, warn};
use x12_schema::SchemaRegistry;
use x12_stream::{InterchangeReader, Segment};

/// Scope names for the three envelope levels
const SCOPE_INTERCHANGE: &str = "InterchangeControl";
const SCOPE_GROUP: &str = "FunctionalGroup";
const SCOPE_TRANSACTION: &str = "TransactionSet";

/// Structural converter for one X12 interchange at a time.
///
/// The registry, when present, supplies loop schemas per transaction
/// set; transactions without a resolvable schema pass their detail
/// segments through flat. The converter itself is stateless across
/// calls; all per-interchange state lives in the call.
pub struct X12Converter<'r> {
    registry: Option<&'r SchemaRegistry>,
}

impl Default for X12Converter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> X12Converter<'r> {
    /// Converter without schemas; every transaction passes through flat
    pub fn new() -> Self {
        Self { registry: None }
    }

    /// Converter resolving loop schemas from a shared registry
    pub fn with_registry(registry: &'r SchemaRegistry) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    /// Read one interchange from `input` and emit its event stream.
    ///
    /// The event stream is balanced even on early end of input: any
    /// scopes still open when the stream runs dry are closed before
    /// returning.
    pub fn convert<R: BufRead, S: ScopedSink>(&self, input: R, sink: &mut S) -> Result<()> {
        let mut reader = InterchangeReader::new(input);
        let isa = reader.read_header()?;
        sink.set_delimiters(isa.delimiters());

        let mut state = EnvelopeState::InterchangeOpen;
        let mut open_scopes: usize = 1;
        sink.open_scope(SCOPE_INTERCHANGE)?;
        sink.write_segment(&isa.to_segment()?)?;

        let mut matcher: Option<LoopMatcher<'_>> = None;

        while let Some(segment) = reader.read_segment()? {
            let id = segment.id();
            if !state.allows(id) {
                return Err(Error::UnexpectedSegment {
                    id: id.to_string(),
                    context: state.context(),
                });
            }

            if id.eq_ignore_ascii_case(GROUP_START) {
                sink.open_scope(SCOPE_GROUP)?;
                open_scopes += 1;
                sink.write_segment(&segment)?;
                state = EnvelopeState::GroupOpen;
            } else if id.eq_ignore_ascii_case(GROUP_END) {
                sink.write_segment(&segment)?;
                sink.close_scope()?;
                open_scopes -= 1;
                state = EnvelopeState::InterchangeOpen;
            } else if id.eq_ignore_ascii_case(TRANSACTION_START) {
                sink.open_scope(SCOPE_TRANSACTION)?;
                open_scopes += 1;
                sink.write_segment(&segment)?;
                matcher = self.bind_schema(&segment)?;
                state = EnvelopeState::TransactionOpen;
            } else if id.eq_ignore_ascii_case(TRANSACTION_END) {
                if let Some(mut m) = matcher.take() {
                    m.unwind(sink)?;
                }
                sink.write_segment(&segment)?;
                sink.close_scope()?;
                open_scopes -= 1;
                state = EnvelopeState::GroupOpen;
            } else if id.eq_ignore_ascii_case(INTERCHANGE_END) {
                sink.write_segment(&segment)?;
                sink.close_scope()?;
                // One interchange per call; whatever follows stays in
                // the stream for the caller
                return Ok(());
            } else if id.eq_ignore_ascii_case(INTERCHANGE_ACK) {
                sink.write_segment(&segment)?;
            } else if let Some(m) = matcher.as_mut() {
                m.dispatch(&segment, sink)?;
            } else {
                sink.write_segment(&segment)?;
            }
        }

        // Input ran out before the interchange trailer; balance the
        // event stream regardless
        warn!("input ended before the interchange trailer");
        if let Some(mut m) = matcher.take() {
            m.unwind(sink)?;
        }
        while open_scopes > 0 {
            sink.close_scope()?;
            open_scopes -= 1;
        }
        Ok(())
    }

    /// Resolve and bind the loop schema for a transaction start
    /// segment, from ST01 (transaction type) and ST03 (implementation
    /// convention, when present)
    fn bind_schema(&self, st: &Segment) -> Result<Option<LoopMatcher<'r>>> {
        if !st.has_element(1) {
            return Err(Error::MalformedTransactionStart);
        }
        let ts_id = st.element(1)?;
        let convention = st
            .element(3)
            .ok()
            .filter(|c| !c.is_empty());

        let Some(registry) = self.registry else {
            return Ok(None);
        };
        match registry.resolve(ts_id, convention) {
            Some(ts) => {
                debug!(
                    transaction = ts_id,
                    convention = convention.unwrap_or(""),
                    schema = ts.id(),
                    "bound transaction set schema"
                );
                Ok(Some(LoopMatcher::bind(ts.root())))
            }
            None => {
                debug!(
                    transaction = ts_id,
                    convention = convention.unwrap_or(""),
                    "no schema for transaction; passing segments through"
                );
                Ok(None)
            }
        }
    }
}
