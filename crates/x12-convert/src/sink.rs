//! Scoped structural event sink
//!
//! The converter never serializes anything itself; it emits an
//! open/close/segment event stream to an abstract sink. Every
//! `open_scope` is matched by exactly one later `close_scope` at the
//! same or lesser depth, so a sink can maintain a simple stack.

use serde::Serialize;
use x12_stream::{Delimiters, Segment};

/// Error type a sink may surface from any event callback
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

pub type SinkResult = std::result::Result<(), SinkError>;

/// Receiver of the structural event stream
pub trait ScopedSink {
    /// Called once after the interchange header has been read, before
    /// any other event. Sinks that split sub-elements need the
    /// component separator; others can ignore this.
    fn set_delimiters(&mut self, _delimiters: Delimiters) {}

    /// A loop or envelope scope begins
    fn open_scope(&mut self, name: &str) -> SinkResult;

    /// The innermost open scope ends
    fn close_scope(&mut self) -> SinkResult;

    /// A segment attaches under the innermost open scope
    fn write_segment(&mut self, segment: &Segment) -> SinkResult;
}

/// One recorded structural event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StructureEvent {
    OpenScope { name: String },
    CloseScope,
    Segment { id: String, elements: Vec<String> },
}

/// Sink that records the event stream, used by tests and for debugging
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<StructureEvent>,
    depth: usize,
    max_depth: usize,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[StructureEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<StructureEvent> {
        self.events
    }

    /// Current nesting depth; zero once the stream is balanced
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn open_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, StructureEvent::OpenScope { .. }))
            .count()
    }

    pub fn close_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, StructureEvent::CloseScope))
            .count()
    }
}

impl ScopedSink for EventCollector {
    fn open_scope(&mut self, name: &str) -> SinkResult {
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
        self.events.push(StructureEvent::OpenScope {
            name: name.to_string(),
        });
        Ok(())
    }

    fn close_scope(&mut self) -> SinkResult {
        self.depth = self
            .depth
            .checked_sub(1)
            .ok_or("close_scope without a matching open_scope")?;
        self.events.push(StructureEvent::CloseScope);
        Ok(())
    }

    fn write_segment(&mut self, segment: &Segment) -> SinkResult {
        let elements = (0..segment.element_count())
            .map(|i| segment.element(i).map(str::to_string))
            .collect::<Result<_, _>>()?;
        self.events.push(StructureEvent::Segment {
            id: segment.id().to_string(),
            elements,
        });
        Ok(())
    }
}
