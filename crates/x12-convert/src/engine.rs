//! Loop-match engine
//!
//! X12 loops are not delimited in the wire data; they must be inferred
//! from segment identity alone, online, with no lookahead. The engine
//! keeps a stack of active loop instances and classifies each incoming
//! segment against the top frame by a fixed rule priority:
//!
//! 1. repeater - the segment reopens the top loop as a new occurrence
//! 2. child-starter - the segment descends into a child loop
//! 3. loop-ender - the segment closes the top loop
//! 4. sibling-starter - the segment starts another child of the
//!    parent that still has capacity; close the top frame and
//!    re-evaluate
//! 5. member - the segment attaches to the top loop directly
//! 6. ancestor-match - the nearest ancestor satisfying any of the
//!    above takes the segment; close down to it and re-evaluate
//!
//! Every iteration that does not settle the segment strictly reduces
//! stack depth, so classification always terminates, and open/close
//! events are LIFO-balanced by construction.

use crate::Result;
use crate::sink::ScopedSink;
use tracing::{trace, warn};
use x12_schema::Loop;
use x12_stream::Segment;

/// The hierarchy-link segment id. An HL encodes an explicit
/// parent/child relationship and always denotes a new child; it never
/// repeats its immediate container.
const HIERARCHY_SEGMENT: &str = "HL";

/// One active loop occurrence on the runtime stack
struct Frame<'s> {
    def: &'s Loop,
    count: u32,
    child_counts: Vec<u32>,
    hl_id: Option<String>,
    scoped: bool,
}

impl<'s> Frame<'s> {
    fn new(def: &'s Loop, scoped: bool) -> Self {
        Self {
            def,
            count: 1,
            child_counts: vec![0; def.child_count()],
            hl_id: None,
            scoped,
        }
    }

    /// Rule 1: the segment reopens this frame as a fresh occurrence
    fn can_repeat(&self, id: &str, qualifier: Option<&str>) -> bool {
        !id.eq_ignore_ascii_case(HIERARCHY_SEGMENT)
            && self.def.is_starting_segment(id, qualifier)
            && self.def.repetition().allows_another(self.count)
    }

    /// First declared child slot the segment can open, capacity
    /// included; shared by the child-starter and sibling-starter rules
    fn child_slot(&self, id: &str, qualifier: Option<&str>) -> Option<usize> {
        self.def
            .children()
            .iter()
            .enumerate()
            .find_map(|(slot, child)| {
                (child.is_starting_segment(id, qualifier)
                    && child.repetition().allows_another(self.child_counts[slot]))
                .then_some(slot)
            })
    }

    /// Rule 5: direct data segment that is not this loop's own start
    fn is_member(&self, id: &str, qualifier: Option<&str>) -> bool {
        self.def.has_segment(id) && !self.def.is_starting_segment(id, qualifier)
    }

    /// Rule 6 test, in ender/repeater/child-starter/member priority
    fn matches_as_ancestor(&self, id: &str, qualifier: Option<&str>) -> bool {
        self.def.is_end_segment(id)
            || self.can_repeat(id, qualifier)
            || self.child_slot(id, qualifier).is_some()
            || self.is_member(id, qualifier)
    }
}

fn hierarchical_id(segment: &Segment) -> Option<String> {
    if !segment.is_named(HIERARCHY_SEGMENT) {
        return None;
    }
    segment.qualifier().map(str::to_string)
}

/// Runtime stack of active loop instances for one transaction set
pub struct LoopMatcher<'s> {
    stack: Vec<Frame<'s>>,
}

impl<'s> LoopMatcher<'s> {
    /// Start matching under a transaction-set root. The root frame
    /// emits no scope events of its own; the caller owns the enclosing
    /// transaction scope.
    pub fn bind(root: &'s Loop) -> Self {
        Self {
            stack: vec![Frame::new(root, false)],
        }
    }

    /// Number of active frames, the transaction-set root included
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Hierarchical id captured by the nearest enclosing HL-started
    /// loop occurrence, if any
    pub fn hierarchical_id(&self) -> Option<&str> {
        self.stack
            .iter()
            .rev()
            .find_map(|frame| frame.hl_id.as_deref())
    }

    /// Classify one detail segment and emit its events.
    ///
    /// A segment no rule matches at any depth is dropped with a
    /// warning; nothing is emitted for it.
    pub fn dispatch<S: ScopedSink>(&mut self, segment: &Segment, sink: &mut S) -> Result<()> {
        let id = segment.id();
        let qualifier = segment.qualifier();

        loop {
            let Some(top) = self.stack.len().checked_sub(1) else {
                warn!(segment = id, "segment after the matcher was unwound; dropped");
                return Ok(());
            };

            if self.stack[top].can_repeat(id, qualifier) {
                let frame = &mut self.stack[top];
                if frame.scoped {
                    sink.close_scope()?;
                    sink.open_scope(frame.def.id())?;
                }
                frame.count += 1;
                frame.child_counts.fill(0);
                frame.hl_id = hierarchical_id(segment);
                trace!(loop_id = frame.def.id(), occurrence = frame.count, "loop repeated");
                sink.write_segment(segment)?;
                return Ok(());
            }

            if let Some(slot) = self.stack[top].child_slot(id, qualifier) {
                self.stack[top].child_counts[slot] += 1;
                let def: &'s Loop = self.stack[top].def;
                let child = &def.children()[slot];
                let mut frame = Frame::new(child, true);
                frame.hl_id = hierarchical_id(segment);
                trace!(loop_id = child.id(), "loop opened");
                sink.open_scope(child.id())?;
                sink.write_segment(segment)?;
                self.stack.push(frame);
                return Ok(());
            }

            if self.stack[top].def.is_end_segment(id) {
                // An end segment that is also a declared member
                // attaches before the loop closes
                if self.stack[top].is_member(id, qualifier) {
                    sink.write_segment(segment)?;
                }
                self.pop(sink)?;
                return Ok(());
            }

            if top > 0 && self.stack[top - 1].child_slot(id, qualifier).is_some() {
                self.pop(sink)?;
                continue;
            }

            if self.stack[top].is_member(id, qualifier) {
                sink.write_segment(segment)?;
                return Ok(());
            }

            if let Some(target) =
                (0..top).rev().find(|&i| self.stack[i].matches_as_ancestor(id, qualifier))
            {
                while self.stack.len() > target + 1 {
                    self.pop(sink)?;
                }
                continue;
            }

            warn!(
                segment = id,
                loop_id = self.stack[top].def.id(),
                "segment matched no loop at any depth; dropped"
            );
            return Ok(());
        }
    }

    /// Close every open frame, innermost first
    pub fn unwind<S: ScopedSink>(&mut self, sink: &mut S) -> Result<()> {
        while !self.stack.is_empty() {
            self.pop(sink)?;
        }
        Ok(())
    }

    fn pop<S: ScopedSink>(&mut self, sink: &mut S) -> Result<()> {
        if let Some(frame) = self.stack.pop() {
            if frame.scoped {
                sink.close_scope()?;
            }
            trace!(loop_id = frame.def.id(), "loop closed");
        }
        Ok(())
    }
}
