//! Structured decoding for data inputs.

use indexmap::IndexMap;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{json, Value};

use crate::core::errors::{DuckyError, Result};

/// Parse JSON text.
pub fn decode_json(text: &str) -> Result<Value> {
    Ok(serde_json::from_str(text)?)
}

/// Parse YAML text into a JSON value.
pub fn decode_yaml(text: &str) -> Result<Value> {
    Ok(serde_yaml::from_str(text)?)
}

/// Summarize an XML document: root element, element counts and depth.
pub fn decode_xml(text: &str) -> Result<Value> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut root: Option<String> = None;
    let mut elements: IndexMap<String, usize> = IndexMap::new();
    let mut depth = 0usize;
    let mut max_depth = 0usize;
    let mut text_nodes = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(tag)) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                root.get_or_insert_with(|| name.clone());
                *elements.entry(name).or_insert(0) += 1;
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            Ok(Event::Empty(tag)) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                root.get_or_insert_with(|| name.clone());
                *elements.entry(name).or_insert(0) += 1;
                max_depth = max_depth.max(depth + 1);
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Text(_)) | Ok(Event::CData(_)) => text_nodes += 1,
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(DuckyError::Serialization {
                    message: format!(
                        "Failed to parse XML at position {}: {err}",
                        reader.buffer_position()
                    ),
                    data_type: Some("XML".to_string()),
                    source: Some(Box::new(err)),
                });
            }
            _ => {}
        }
        buf.clear();
    }

    let Some(root) = root else {
        return Err(DuckyError::Serialization {
            message: "XML document has no root element".to_string(),
            data_type: Some("XML".to_string()),
            source: None,
        });
    };

    Ok(json!({
        "root": root,
        "element_count": elements.values().sum::<usize>(),
        "elements": elements,
        "max_depth": max_depth,
        "text_nodes": text_nodes,
    }))
}

/// Flatten a Jupyter notebook into the concatenated source of its code cells.
pub fn flatten_notebook(text: &str) -> Result<String> {
    let notebook: Value = serde_json::from_str(text)?;
    let cells = notebook
        .get("cells")
        .and_then(Value::as_array)
        .ok_or_else(|| DuckyError::validation("notebook has no 'cells' array"))?;

    let sources: Vec<String> = cells
        .iter()
        .filter(|cell| cell.get("cell_type").and_then(Value::as_str) == Some("code"))
        .filter_map(|cell| cell.get("source"))
        .map(|source| match source {
            Value::Array(parts) => parts.iter().filter_map(Value::as_str).collect::<String>(),
            Value::String(single) => single.clone(),
            _ => String::new(),
        })
        .map(|source| source.trim_end().to_string())
        .filter(|source| !source.is_empty())
        .collect();

    Ok(sources.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_summary_counts_elements() {
        let summary = decode_xml("<root><item id=\"1\"/><item>x</item><group><item/></group></root>").unwrap();
        assert_eq!(summary["root"], "root");
        assert_eq!(summary["elements"]["item"], 3);
        assert_eq!(summary["element_count"], 5);
        assert_eq!(summary["max_depth"], 3);
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(decode_xml("<a><b></a>").is_err());
        assert!(decode_xml("").is_err());
    }

    #[test]
    fn yaml_becomes_json_value() {
        let value = decode_yaml("name: ducky\nitems:\n  - 1\n  - 2\n").unwrap();
        assert_eq!(value["name"], "ducky");
        assert_eq!(value["items"][1], 2);
    }

    #[test]
    fn notebook_keeps_code_cells() {
        let notebook = r##"{
            "cells": [
                {"cell_type": "markdown", "source": ["# Title"]},
                {"cell_type": "code", "source": ["import os\n", "print(os.name)\n"]},
                {"cell_type": "code", "source": "x = 1"}
            ]
        }"##;
        let flattened = flatten_notebook(notebook).unwrap();
        assert_eq!(flattened, "import os\nprint(os.name)\n\nx = 1");
    }

    #[test]
    fn notebook_without_cells_is_rejected() {
        assert!(flatten_notebook("{}").is_err());
    }
}
