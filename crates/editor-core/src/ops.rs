use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::document::{
    BlockKind, Document, Node, Path, PathError, clamp_to_char_boundary, insert_node, node_at_path,
    node_mut, node_text_mut, remove_node,
};
use crate::marks::MarkSet;
use crate::selection::Selection;

/// Primitive document edits. Commands compose these into transactions; the
/// engine applies them to a cloned tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    InsertText {
        #[serde(default)]
        path: Path,
        offset: usize,
        text: String,
    },
    RemoveText {
        #[serde(default)]
        path: Path,
        range: Range<usize>,
    },
    InsertNode {
        #[serde(default)]
        path: Path,
        node: Node,
    },
    RemoveNode {
        #[serde(default)]
        path: Path,
    },
    SetNodeKind {
        #[serde(default)]
        path: Path,
        kind: BlockKind,
    },
    SetTextMarks {
        #[serde(default)]
        path: Path,
        marks: MarkSet,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub ops: Vec<Op>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_after: Option<Selection>,
}

impl Transaction {
    pub fn new(ops: Vec<Op>) -> Self {
        Self {
            ops,
            selection_after: None,
        }
    }

    pub fn selection_after(mut self, selection_after: Selection) -> Self {
        self.selection_after = Some(selection_after);
        self
    }
}

pub(crate) fn apply_op_to(
    doc: &mut Document,
    selection: &mut Selection,
    op: Op,
) -> Result<(), PathError> {
    match op {
        Op::InsertText { path, offset, text } => {
            let text_node = node_text_mut(doc, &path)?;
            let offset = clamp_to_char_boundary(&text_node.text, offset);
            text_node.text.insert_str(offset, &text);
            transform_selection_insert_text(selection, &path, offset, text.len());
            Ok(())
        }
        Op::RemoveText { path, range } => {
            let text_node = node_text_mut(doc, &path)?;
            let len = text_node.text.len();
            let start = clamp_to_char_boundary(&text_node.text, range.start.min(len));
            let end = clamp_to_char_boundary(&text_node.text, range.end.min(len));
            if start < end {
                text_node.text.replace_range(start..end, "");
                transform_selection_remove_text(selection, &path, start..end);
            }
            Ok(())
        }
        Op::InsertNode { path, node } => {
            insert_node(doc, &path, node)?;
            transform_selection_insert_node(selection, &path);
            Ok(())
        }
        Op::RemoveNode { path } => {
            let removed = remove_node(doc, &path)?;
            transform_selection_remove_node(selection, &path, &removed, doc);
            Ok(())
        }
        Op::SetNodeKind { path, kind } => match node_mut(doc, &path)? {
            Node::Element(el) => {
                el.kind = kind;
                Ok(())
            }
            Node::Text(_) => Err(PathError("text node has no kind".into())),
        },
        Op::SetTextMarks { path, marks } => {
            let text_node = node_text_mut(doc, &path)?;
            text_node.marks = marks;
            Ok(())
        }
    }
}

fn transform_selection_insert_text(
    selection: &mut Selection,
    path: &[usize],
    offset: usize,
    len: usize,
) {
    // Strictly after the insertion point: a point at the boundary stays put,
    // which keeps selections stable across run merges. Commands that insert
    // at the caret set the caret explicitly.
    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path == path && point.offset > offset {
            point.offset = point.offset.saturating_add(len);
        }
    }
}

fn transform_selection_remove_text(
    selection: &mut Selection,
    path: &[usize],
    range: Range<usize>,
) {
    let removed_len = range.end.saturating_sub(range.start);
    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path != path {
            continue;
        }
        if point.offset <= range.start {
            continue;
        }
        if point.offset >= range.end {
            point.offset = point.offset.saturating_sub(removed_len);
        } else {
            point.offset = range.start;
        }
    }
}

fn transform_selection_insert_node(selection: &mut Selection, path: &[usize]) {
    let Some((index, parent_path)) = path.split_last() else {
        return;
    };

    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path.len() <= parent_path.len() {
            continue;
        }
        if !point.path.starts_with(parent_path) {
            continue;
        }
        let depth = parent_path.len();
        if point.path[depth] >= *index {
            point.path[depth] += 1;
        }
    }
}

/// How a point inside a removed subtree can be re-homed. When the removed
/// content was first copied onto the end of the left sibling (a run merge or
/// a container merge), the point follows it there.
enum MergeRemap {
    TextPrefix { prefix: usize, removed_len: usize },
    ElementPrefix { prefix: usize },
    None,
}

fn transform_selection_remove_node(
    selection: &mut Selection,
    path: &[usize],
    removed: &Node,
    doc_after_remove: &Document,
) {
    let Some((index, parent_path)) = path.split_last() else {
        return;
    };
    let index = *index;

    let remap = match (removed, index.checked_sub(1)) {
        (Node::Text(removed_text), Some(left_index)) => {
            let mut left_path = parent_path.to_vec();
            left_path.push(left_index);
            match node_at_path(doc_after_remove, &left_path) {
                Some(Node::Text(left_text))
                    if left_text.marks == removed_text.marks
                        && left_text.text.ends_with(&removed_text.text) =>
                {
                    MergeRemap::TextPrefix {
                        prefix: left_text.text.len().saturating_sub(removed_text.text.len()),
                        removed_len: removed_text.text.len(),
                    }
                }
                _ => MergeRemap::None,
            }
        }
        (Node::Element(removed_el), Some(left_index)) => {
            let mut left_path = parent_path.to_vec();
            left_path.push(left_index);
            match node_at_path(doc_after_remove, &left_path) {
                Some(Node::Element(left_el))
                    if left_el.kind == removed_el.kind
                        && left_el.children.len() >= removed_el.children.len()
                        && left_el.children[left_el.children.len() - removed_el.children.len()..]
                            == removed_el.children[..] =>
                {
                    MergeRemap::ElementPrefix {
                        prefix: left_el.children.len() - removed_el.children.len(),
                    }
                }
                _ => MergeRemap::None,
            }
        }
        _ => MergeRemap::None,
    };

    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path.len() <= parent_path.len() {
            continue;
        }
        if !point.path.starts_with(parent_path) {
            continue;
        }
        let depth = parent_path.len();
        let ix = point.path[depth];
        if ix > index {
            point.path[depth] = ix - 1;
            continue;
        }
        if ix < index {
            continue;
        }

        // Point was inside the removed subtree.
        match (&remap, index.checked_sub(1)) {
            (
                MergeRemap::TextPrefix {
                    prefix,
                    removed_len,
                },
                Some(left_index),
            ) => {
                point.path.truncate(depth + 1);
                point.path[depth] = left_index;
                point.offset = (prefix + point.offset).min(prefix + removed_len);
            }
            (MergeRemap::ElementPrefix { prefix }, Some(left_index))
                if point.path.len() >= depth + 2 =>
            {
                point.path[depth] = left_index;
                point.path[depth + 1] += prefix;
            }
            _ => {
                point.path.truncate(depth + 1);
                point.path[depth] = index.saturating_sub(1);
                point.offset = 0;
            }
        }
    }
}
