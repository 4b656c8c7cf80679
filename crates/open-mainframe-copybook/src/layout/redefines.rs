//! REDEFINES target lookup.

use super::LayoutNode;

/// Find the start offset of the field named `target` among `siblings`.
///
/// Searches depth first through already-built fields, including their
/// subordinates, and compares COBOL names case-insensitively. The first
/// match in source order wins.
pub fn resolve_start(siblings: &[LayoutNode], target: &str) -> Option<u32> {
    siblings.iter().find_map(|node| find(node, target))
}

fn find(node: &LayoutNode, target: &str) -> Option<u32> {
    if node.copybook_name.eq_ignore_ascii_case(target) {
        return Some(node.start);
    }
    node.children().find_map(|child| find(child, target))
}
