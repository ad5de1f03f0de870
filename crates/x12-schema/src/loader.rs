//! Declarative schema loader
//!
//! Loads transaction-set definitions from JSON or YAML documents into
//! the model types. A repetition of `-1` means unbounded; omitted
//! repetitions default to 1.

use crate::model::{Loop, Repetition, TransactionSet};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::trace;

#[derive(Debug, Deserialize)]
struct SchemaFile {
    #[serde(default)]
    transaction_sets: Vec<TransactionSetFile>,
}

#[derive(Debug, Deserialize)]
struct TransactionSetFile {
    id: String,
    #[serde(default)]
    convention: Option<String>,
    #[serde(default)]
    segments: Vec<SegmentFile>,
    #[serde(default)]
    loops: Vec<LoopFile>,
}

#[derive(Debug, Deserialize)]
struct LoopFile {
    id: String,
    #[serde(default = "default_repetition")]
    repetition: i64,
    start_segment: String,
    #[serde(default)]
    start_qualifier: Option<String>,
    #[serde(default)]
    end_segment: Option<String>,
    #[serde(default)]
    segments: Vec<SegmentFile>,
    #[serde(default)]
    loops: Vec<LoopFile>,
}

#[derive(Debug, Deserialize)]
struct SegmentFile {
    id: String,
    #[serde(default = "default_repetition")]
    repetition: i64,
}

fn default_repetition() -> i64 {
    1
}

fn convert_repetition(value: i64) -> Result<Repetition> {
    match value {
        -1 => Ok(Repetition::Unbounded),
        n if n > 0 => Ok(Repetition::Bounded(n as u32)),
        n => Err(Error::InvalidRepetition(n)),
    }
}

fn convert_loop(file: LoopFile) -> Result<Loop> {
    let mut node = Loop::new(
        file.id,
        convert_repetition(file.repetition)?,
        file.start_segment,
    )?;
    if let Some(qualifier) = file.start_qualifier {
        node = node.with_start_qualifier(qualifier);
    }
    if let Some(end_segment) = file.end_segment {
        node = node.with_end_segment(end_segment);
    }
    for segment in file.segments {
        node.add_segment(segment.id, convert_repetition(segment.repetition)?);
    }
    for child in file.loops {
        node.add_child(convert_loop(child)?);
    }
    Ok(node)
}

fn convert_file(file: SchemaFile) -> Result<Vec<TransactionSet>> {
    let mut sets = Vec::with_capacity(file.transaction_sets.len());
    for ts_file in file.transaction_sets {
        let mut ts = TransactionSet::new(ts_file.id)?;
        if let Some(convention) = ts_file.convention {
            ts = ts.with_convention(convention);
        }
        for segment in ts_file.segments {
            ts.root_mut()
                .add_segment(segment.id, convert_repetition(segment.repetition)?);
        }
        for child in ts_file.loops {
            ts.root_mut().add_child(convert_loop(child)?);
        }
        trace!(id = ts.id(), "loaded transaction set definition");
        sets.push(ts);
    }
    Ok(sets)
}

/// Load transaction sets from a JSON document
pub fn from_json(json: &str) -> Result<Vec<TransactionSet>> {
    let file: SchemaFile = serde_json::from_str(json)
        .map_err(|e| Error::InvalidFormat(format!("JSON parse error: {}", e)))?;
    convert_file(file)
}

/// Load transaction sets from a YAML document
pub fn from_yaml(yaml: &str) -> Result<Vec<TransactionSet>> {
    let file: SchemaFile = serde_yaml::from_str(yaml)
        .map_err(|e| Error::InvalidFormat(format!("YAML parse error: {}", e)))?;
    convert_file(file)
}

/// Load transaction sets from a file, dispatching on its extension
pub fn load_file(path: &Path) -> Result<Vec<TransactionSet>> {
    let content = std::fs::read_to_string(path)?;
    if path
        .extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
    {
        from_yaml(&content)
    } else {
        from_json(&content)
    }
}
