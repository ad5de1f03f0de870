//! JSON tree sink
//!
//! Builds a nested `serde_json::Value` document from the event stream:
//! scopes become `{"loop": .., "children": [..]}` objects and segments
//! become `{"segment": .., "elements": [..]}` objects. Elements
//! containing the component separator are split into sub-element
//! arrays, except in the ISA header, where that character is field
//! data rather than a delimiter.

use crate::envelope::INTERCHANGE_START;
use crate::sink::{ScopedSink, SinkResult};
use serde_json::{Value, json};
use x12_stream::{Delimiters, Segment};

struct ScopeNode {
    name: String,
    children: Vec<Value>,
}

/// Sink that assembles the event stream into one JSON document
#[derive(Default)]
pub struct JsonTreeSink {
    delimiters: Option<Delimiters>,
    stack: Vec<ScopeNode>,
    roots: Vec<Value>,
}

impl JsonTreeSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn element_value(&self, segment_id: &str, element: &str) -> Value {
        if let Some(delimiters) = self.delimiters {
            let component = delimiters.component as char;
            if !segment_id.eq_ignore_ascii_case(INTERCHANGE_START) && element.contains(component) {
                return Value::Array(
                    element
                        .split(component)
                        .map(|part| Value::String(part.to_string()))
                        .collect(),
                );
            }
        }
        Value::String(element.to_string())
    }

    fn attach(&mut self, value: Value) {
        match self.stack.last_mut() {
            Some(scope) => scope.children.push(value),
            None => self.roots.push(value),
        }
    }

    /// The assembled document. A single top-level scope becomes the
    /// document root; anything else is wrapped in an array.
    pub fn finish(mut self) -> Value {
        // The converter guarantees balance; fold anything left over
        // rather than lose it
        while let Some(scope) = self.stack.pop() {
            let value = json!({"loop": scope.name, "children": scope.children});
            match self.stack.last_mut() {
                Some(parent) => parent.children.push(value),
                None => self.roots.push(value),
            }
        }
        if self.roots.len() == 1 {
            self.roots.remove(0)
        } else {
            Value::Array(self.roots)
        }
    }
}

impl ScopedSink for JsonTreeSink {
    fn set_delimiters(&mut self, delimiters: Delimiters) {
        self.delimiters = Some(delimiters);
    }

    fn open_scope(&mut self, name: &str) -> SinkResult {
        self.stack.push(ScopeNode {
            name: name.to_string(),
            children: Vec::new(),
        });
        Ok(())
    }

    fn close_scope(&mut self) -> SinkResult {
        let scope = self
            .stack
            .pop()
            .ok_or("close_scope without a matching open_scope")?;
        self.attach(json!({"loop": scope.name, "children": scope.children}));
        Ok(())
    }

    fn write_segment(&mut self, segment: &Segment) -> SinkResult {
        let id = segment.id().to_string();
        let elements: Vec<Value> = (1..segment.element_count())
            .map(|i| Ok(self.element_value(&id, segment.element(i)?)))
            .collect::<Result<_, x12_stream::Error>>()?;
        self.attach(json!({"segment": id, "elements": elements}));
        Ok(())
    }
}
