//! Recursive layout of token rows into a [`LayoutNode`] tree.
//!
//! Rows are processed one nesting level at a time. Each call lays out a
//! sequence of sibling rows starting at a byte offset and returns the nodes
//! together with the offset of the first free byte after them; groups and
//! OCCURS tables recurse into their subordinate rows.

use crate::config::{LayoutConfig, UnresolvedRedefines};
use crate::error::{CopybookError, Result};
use crate::naming::snake_case;
use crate::picture::{self, Usage};
use crate::tokenizer::TokenRow;

use super::{resolve_start, FieldType, LayoutNode, NodeData};

/// Most nodes a single OCCURS table may expand into.
const MAX_OCCURS_NODES: u64 = 1_000_000;

/// Nodes laid out for one sequence of sibling rows.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRun {
    /// The nodes, in source order.
    pub data: Vec<LayoutNode>,
    /// Offset the run was laid out from.
    pub start: u32,
    /// Offset of the first byte after the run.
    pub end: u32,
}

impl LayoutRun {
    /// Bytes covered by the run.
    pub fn length(&self) -> u32 {
        self.end - self.start
    }
}

/// Storage of an elementary item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Scalar {
    field_type: FieldType,
    length: u32,
}

/// What a row contributes to the layout.
#[derive(Debug)]
enum RowKind<'r> {
    GroupRedefine { target: &'r str },
    ScalarRedefine { target: &'r str, scalar: Scalar },
    Scalar(Scalar),
    Occurs { times: u32 },
    Group,
    Skip,
}

/// Builds layout trees from token rows.
pub struct LayoutBuilder<'a> {
    config: &'a LayoutConfig,
}

impl<'a> LayoutBuilder<'a> {
    /// Create a builder using the given layout settings.
    pub fn new(config: &'a LayoutConfig) -> Self {
        Self { config }
    }

    /// Lay out a whole copybook from offset 0.
    pub fn build(&self, rows: &[TokenRow]) -> Result<Vec<LayoutNode>> {
        let run = self.layout(rows, 0)?;
        tracing::debug!(nodes = run.data.len(), length = run.length(), "Layout built");
        Ok(run.data)
    }

    /// Lay out a sequence of sibling rows (with their subordinates) from `start`.
    pub fn layout(&self, rows: &[TokenRow], start: u32) -> Result<LayoutRun> {
        self.layout_with_usage(rows, start, Usage::Display)
    }

    fn layout_with_usage(&self, rows: &[TokenRow], start: u32, usage: Usage) -> Result<LayoutRun> {
        let mut data: Vec<LayoutNode> = Vec::new();
        let mut cursor = start;
        let mut index = 0;

        while index < rows.len() {
            let row = &rows[index];
            let run_len = rows[index + 1..]
                .iter()
                .take_while(|next| is_subordinate(row, next))
                .count();
            let run = &rows[index + 1..index + 1 + run_len];

            let kind = self.classify(row, run, usage)?;
            tracing::trace!(line = row.line, level = row.level, name = %row.name, kind = ?kind, "Row classified");

            let node = match kind {
                RowKind::Skip => {
                    index += 1;
                    continue;
                }
                RowKind::Scalar(scalar) => {
                    check_elementary(row, run)?;
                    let node = scalar_node(row, scalar, cursor);
                    cursor = advance(row, cursor, scalar.length)?;
                    node
                }
                RowKind::ScalarRedefine { target, scalar } => {
                    check_elementary(row, run)?;
                    let target_start = self.redefined_start(&data, row, target)?;
                    LayoutNode {
                        redefines: Some(snake_case(target)),
                        ..scalar_node(row, scalar, target_start)
                    }
                }
                RowKind::Occurs { times } => {
                    check_group(row, run)?;
                    let usage = group_usage(row, usage);
                    let first = self.layout_with_usage(run, cursor, usage)?;
                    let span = first.length();
                    let length = span.checked_mul(times).ok_or_else(|| too_large(row))?;
                    let end = advance(row, cursor, length)?;
                    check_expansion(row, times, &first.data)?;

                    let mut occurrences = vec![first.data];
                    for n in 1..times {
                        occurrences.push(self.layout_with_usage(run, cursor + n * span, usage)?.data);
                    }
                    let node = list_node(row, times, occurrences, cursor, length);
                    cursor = end;
                    node
                }
                RowKind::GroupRedefine { target } => {
                    check_group(row, run)?;
                    let target_start = self.redefined_start(&data, row, target)?;
                    let group = self.layout_with_usage(run, target_start, group_usage(row, usage))?;
                    cursor = cursor.max(group.end);
                    LayoutNode {
                        redefines: Some(snake_case(target)),
                        ..group_node(row, group)
                    }
                }
                RowKind::Group => {
                    check_group(row, run)?;
                    let group = self.layout_with_usage(run, cursor, group_usage(row, usage))?;
                    cursor = group.end;
                    group_node(row, group)
                }
            };

            data.push(node);
            index += 1 + run_len;
        }

        Ok(LayoutRun {
            data,
            start,
            end: cursor,
        })
    }

    fn classify<'r>(&self, row: &'r TokenRow, run: &[TokenRow], usage: Usage) -> Result<RowKind<'r>> {
        if !row.is_data_level() && row.level != 77 {
            return Ok(RowKind::Skip);
        }

        let target = if row.has_keyword("REDEFINES") {
            Some(row.operand(&["REDEFINES"]).ok_or_else(|| CopybookError::MalformedClause {
                field: row.name.clone(),
                clause: "REDEFINES".to_string(),
                line: row.line,
                message: "missing the name of the redefined item".to_string(),
            })?)
        } else {
            None
        };
        let scalar = if row.has_picture() {
            Some(elementary_storage(row, usage)?)
        } else {
            None
        };
        let occurs = row.has_keyword("OCCURS");

        // A PICTURE wins over OCCURS: the item is one scalar.
        let kind = match (target, scalar) {
            (Some(target), None) => RowKind::GroupRedefine { target },
            (Some(target), Some(scalar)) => RowKind::ScalarRedefine { target, scalar },
            (None, Some(scalar)) => RowKind::Scalar(scalar),
            (None, None) if occurs => RowKind::Occurs {
                times: occurs_count(row)?,
            },
            (None, None) if row.clauses.is_empty() || run.iter().any(TokenRow::is_data_level) => {
                RowKind::Group
            }
            (None, None) => RowKind::Skip,
        };
        Ok(kind)
    }

    fn redefined_start(&self, siblings: &[LayoutNode], row: &TokenRow, target: &str) -> Result<u32> {
        if let Some(start) = resolve_start(siblings, target) {
            return Ok(start);
        }
        match self.config.unresolved_redefines {
            UnresolvedRedefines::Error => Err(CopybookError::UnresolvedRedefines {
                field: row.name.clone(),
                target: target.to_string(),
                line: row.line,
            }),
            UnresolvedRedefines::RecordStart => {
                tracing::warn!(
                    field = %row.name,
                    target = %target,
                    line = row.line,
                    "REDEFINES target not found, placing field at offset 0"
                );
                Ok(0)
            }
        }
    }
}

/// Check if `next` belongs to the descendant run of `row`.
///
/// Condition names attach to any preceding item; level-77 items and
/// RENAMES entries never have subordinates.
fn is_subordinate(row: &TokenRow, next: &TokenRow) -> bool {
    next.is_condition() || (row.level < 77 && next.is_data_level() && next.level > row.level)
}

fn check_elementary(row: &TokenRow, run: &[TokenRow]) -> Result<()> {
    match run.iter().find(|next| next.is_data_level()) {
        Some(child) => Err(CopybookError::structure(
            child.line,
            format!(
                "{} (level {:02}) is subordinate to elementary item {}, which has a PICTURE",
                child.name, child.level, row.name
            ),
        )),
        None => Ok(()),
    }
}

fn check_group(row: &TokenRow, run: &[TokenRow]) -> Result<()> {
    if run.iter().any(TokenRow::is_data_level) {
        Ok(())
    } else {
        Err(CopybookError::structure(
            row.line,
            format!("group item {} has no subordinate items", row.name),
        ))
    }
}

fn elementary_storage(row: &TokenRow, inherited: Usage) -> Result<Scalar> {
    let clause = row.operand(&["PIC", "PICTURE"]).unwrap_or_default();
    let usage = row_usage(row).unwrap_or(inherited);
    let length = picture::storage_size(clause, usage).map_err(|source| {
        CopybookError::MalformedPicture {
            field: row.name.clone(),
            clause: clause.to_string(),
            line: row.line,
            source,
        }
    })?;
    Ok(Scalar {
        field_type: picture::classify(clause, usage),
        length,
    })
}

/// USAGE written on the row itself, with or without the USAGE keyword.
fn row_usage(row: &TokenRow) -> Option<Usage> {
    row.clauses.iter().find_map(|token| Usage::from_keyword(token))
}

/// Usage inherited by the subordinates of a group.
fn group_usage(row: &TokenRow, inherited: Usage) -> Usage {
    row_usage(row).unwrap_or(inherited)
}

/// Occurrence count of an OCCURS clause; `m TO n` yields `n`.
fn occurs_count(row: &TokenRow) -> Result<u32> {
    let tokens = row.tokens_after("OCCURS");
    let operand = match tokens {
        [_, to, max, ..] if to.eq_ignore_ascii_case("TO") => Some(max),
        [count, ..] => Some(count),
        [] => None,
    };
    let malformed = |message: String| CopybookError::MalformedClause {
        field: row.name.clone(),
        clause: "OCCURS".to_string(),
        line: row.line,
        message,
    };

    let operand = operand.ok_or_else(|| malformed("missing occurrence count".to_string()))?;
    match operand.parse::<u32>() {
        Ok(times) if times > 0 => Ok(times),
        _ => Err(malformed(format!(
            "occurrence count '{}' is not a positive integer",
            operand
        ))),
    }
}

fn advance(row: &TokenRow, cursor: u32, length: u32) -> Result<u32> {
    cursor.checked_add(length).ok_or_else(|| too_large(row))
}

/// Reject a table whose repetitions would hold too many nodes.
fn check_expansion(row: &TokenRow, times: u32, occurrence: &[LayoutNode]) -> Result<()> {
    let nodes = u64::from(times).saturating_mul(node_count(occurrence.iter()));
    if nodes > MAX_OCCURS_NODES {
        return Err(CopybookError::structure(
            row.line,
            format!(
                "OCCURS {} at {} expands to {} fields, more than {}",
                times, row.name, nodes, MAX_OCCURS_NODES
            ),
        ));
    }
    Ok(())
}

fn node_count<'n>(nodes: impl Iterator<Item = &'n LayoutNode>) -> u64 {
    nodes.map(|node| 1 + node_count(node.children())).sum()
}

fn too_large(row: &TokenRow) -> CopybookError {
    CopybookError::structure(
        row.line,
        format!("record size overflows at {}", row.name),
    )
}

fn scalar_node(row: &TokenRow, scalar: Scalar, start: u32) -> LayoutNode {
    LayoutNode {
        name: snake_case(&row.name),
        copybook_name: row.name.clone(),
        field_type: scalar.field_type,
        redefines: None,
        occurs: None,
        data: None,
        start,
        length: scalar.length,
    }
}

fn group_node(row: &TokenRow, group: LayoutRun) -> LayoutNode {
    LayoutNode {
        name: snake_case(&row.name),
        copybook_name: row.name.clone(),
        field_type: FieldType::Group,
        redefines: None,
        occurs: None,
        length: group.length(),
        start: group.start,
        data: Some(NodeData::Fields(group.data)),
    }
}

fn list_node(
    row: &TokenRow,
    times: u32,
    occurrences: Vec<Vec<LayoutNode>>,
    start: u32,
    length: u32,
) -> LayoutNode {
    LayoutNode {
        name: snake_case(&row.name),
        copybook_name: row.name.clone(),
        field_type: FieldType::List,
        redefines: None,
        occurs: Some(times),
        data: Some(NodeData::Occurrences(occurrences)),
        start,
        length,
    }
}
