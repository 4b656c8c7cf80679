//! Record layout tree.
//!
//! A [`LayoutNode`] describes one field of a copybook: its normalized and
//! original names, semantic type, byte offset and byte length. Groups carry
//! their subordinate fields; lists (OCCURS) carry one field sequence per
//! occurrence.

mod builder;
mod redefines;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use builder::{LayoutBuilder, LayoutRun};
pub use redefines::resolve_start;

/// Semantic type of a layout node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Structure containing subordinate fields.
    Group,
    /// Repeating structure (OCCURS).
    List,
    /// Zoned decimal digits (DISPLAY numeric).
    Number,
    /// Character data.
    String,
    /// Binary or packed-decimal data (COMP, COMP-3).
    Binary,
}

/// Subordinate data of a group or list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeData {
    /// Fields of a group.
    Fields(Vec<LayoutNode>),
    /// One field sequence per occurrence of a list.
    Occurrences(Vec<Vec<LayoutNode>>),
}

/// One field of a resolved copybook layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutNode {
    /// snake_case form of the COBOL name.
    pub name: String,
    /// Name as written in the copybook.
    pub copybook_name: String,
    /// Semantic type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// snake_case name of the field whose storage this one reuses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redefines: Option<String>,
    /// Occurrence count (lists only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurs: Option<u32>,
    /// Subordinate fields (groups and lists only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<NodeData>,
    /// Byte offset from the start of the record (0-based).
    pub start: u32,
    /// Size in bytes.
    pub length: u32,
}

impl LayoutNode {
    /// Offset of the first byte after this field.
    pub fn end(&self) -> u32 {
        self.start + self.length
    }

    /// Subordinate fields of a group (empty for lists and elementary items).
    pub fn fields(&self) -> &[LayoutNode] {
        match &self.data {
            Some(NodeData::Fields(fields)) => fields,
            _ => &[],
        }
    }

    /// Per-occurrence field sequences of a list (empty otherwise).
    pub fn occurrences(&self) -> &[Vec<LayoutNode>] {
        match &self.data {
            Some(NodeData::Occurrences(occurrences)) => occurrences,
            _ => &[],
        }
    }

    /// Iterate over every subordinate node, across all occurrences.
    pub fn children(&self) -> Box<dyn Iterator<Item = &LayoutNode> + '_> {
        match &self.data {
            Some(NodeData::Fields(fields)) => Box::new(fields.iter()),
            Some(NodeData::Occurrences(occurrences)) => Box::new(occurrences.iter().flatten()),
            None => Box::new(std::iter::empty()),
        }
    }
}

/// Serialize a layout as a JSON array.
///
/// Pretty output is indented by four spaces per level.
pub fn to_json(nodes: &[LayoutNode], pretty: bool) -> Result<String> {
    if !pretty {
        return Ok(serde_json::to_string(nodes)?);
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    nodes.serialize(&mut serializer)?;
    // serde_json only ever writes valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Parse a layout previously written by [`to_json`].
pub fn from_json(json: &str) -> Result<Vec<LayoutNode>> {
    Ok(serde_json::from_str(json)?)
}
