//! Editing commands. Each command is a total function of
//! `(document, selection)` returning a new pair; selections that address no
//! leaf block make the command a no-op returning its input unchanged.

use std::collections::HashSet;

use crate::document::{
    BlockKind, Document, Node, Path, clamp_to_char_boundary, node_at_path,
};
use crate::engine::{ApplyError, apply};
use crate::marks::Mark;
use crate::ops::{Op, Transaction};
use crate::schema::Schema;
use crate::selection::{
    Point, Selection, ordered_points, point_for_global_offset, point_global_offset,
    selected_leaf_range, total_text_len,
};

fn unchanged(doc: &Document, selection: &Selection) -> Result<(Document, Selection), ApplyError> {
    Ok((doc.clone(), selection.clone()))
}

fn replace_children_ops(block_path: &[usize], old_len: usize, new_children: &[Node], ops: &mut Vec<Op>) {
    for child_ix in (0..old_len).rev() {
        let mut path = block_path.to_vec();
        path.push(child_ix);
        ops.push(Op::RemoveNode { path });
    }
    for (child_ix, node) in new_children.iter().enumerate() {
        let mut path = block_path.to_vec();
        path.push(child_ix);
        ops.push(Op::InsertNode {
            path,
            node: node.clone(),
        });
    }
}

/// Splits a run sequence at a global text offset.
fn split_runs(children: &[Node], global: usize) -> (Vec<Node>, Vec<Node>) {
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut cursor = 0usize;

    for node in children {
        match node {
            Node::Text(text) => {
                let len = text.text.len();
                let node_start = cursor;
                let node_end = cursor + len;
                cursor = node_end;

                if node_end <= global {
                    before.push(node.clone());
                } else if node_start >= global {
                    after.push(node.clone());
                } else {
                    let cut = clamp_to_char_boundary(&text.text, global - node_start);
                    if cut > 0 {
                        before.push(Node::text(&text.text[..cut], text.marks.clone()));
                    }
                    if cut < len {
                        after.push(Node::text(&text.text[cut..], text.marks.clone()));
                    }
                }
            }
            Node::Element(_) => {
                if cursor < global {
                    before.push(node.clone());
                } else {
                    after.push(node.clone());
                }
            }
        }
    }

    (before, after)
}

/// Re-marks the runs of one block over `[start, end)`, splitting runs at the
/// boundaries. The merge pass re-joins equal neighbors afterwards.
fn remark_runs(children: &[Node], start: usize, end: usize, mark: &Mark, add: bool) -> Vec<Node> {
    let mut out = Vec::new();
    let mut cursor = 0usize;

    for node in children {
        let Node::Text(text) = node else {
            out.push(node.clone());
            continue;
        };

        let len = text.text.len();
        let node_start = cursor;
        let node_end = cursor + len;
        cursor = node_end;

        let from = start.clamp(node_start, node_end);
        let to = end.clamp(node_start, node_end);
        if from >= to {
            out.push(node.clone());
            continue;
        }

        let a = clamp_to_char_boundary(&text.text, from - node_start);
        let b = clamp_to_char_boundary(&text.text, to - node_start);

        if a > 0 {
            out.push(Node::text(&text.text[..a], text.marks.clone()));
        }
        let mut marks = text.marks.clone();
        if add {
            marks.insert(mark.clone());
        } else {
            marks.remove(mark);
        }
        out.push(Node::text(&text.text[a..b], marks));
        if b < len {
            out.push(Node::text(&text.text[b..], text.marks.clone()));
        }
    }

    out
}

/// Toggles a mark over the selection: removed everywhere when it is active
/// across the whole selection, applied everywhere otherwise. A caret touches
/// no text, so it is left unchanged.
pub fn toggle_mark(
    schema: &Schema,
    doc: &Document,
    selection: &Selection,
    mark: Mark,
) -> Result<(Document, Selection), ApplyError> {
    if selection.is_collapsed() {
        return unchanged(doc, selection);
    }
    let Some((leaves, start_ix, end_ix)) = selected_leaf_range(doc, selection) else {
        return unchanged(doc, selection);
    };
    let (start, end) = ordered_points(selection);
    let start_inline = start.path.last().copied().unwrap_or(0);
    let end_inline = end.path.last().copied().unwrap_or(0);

    let block_range = |block_ix: usize, children: &[Node]| -> (usize, usize) {
        let total = total_text_len(children);
        let from = if block_ix == start_ix {
            point_global_offset(children, start_inline, start.offset)
        } else {
            0
        };
        let to = if block_ix == end_ix {
            point_global_offset(children, end_inline, end.offset)
        } else {
            total
        };
        (from, to)
    };

    let mut touched_any = false;
    let mut active = true;
    for (block_ix, block) in leaves.iter().enumerate().take(end_ix + 1).skip(start_ix) {
        let children = block.el.children.as_slice();
        let (from, to) = block_range(block_ix, children);
        if from >= to {
            continue;
        }
        let mut cursor = 0usize;
        for node in children {
            let Node::Text(text) = node else {
                continue;
            };
            let node_start = cursor;
            let node_end = cursor + text.text.len();
            cursor = node_end;
            if node_end <= from || node_start >= to || text.text.is_empty() {
                continue;
            }
            touched_any = true;
            if !text.marks.contains(&mark) {
                active = false;
            }
        }
    }
    if !touched_any {
        return unchanged(doc, selection);
    }

    let add = !active;
    let mut ops = Vec::new();
    let mut new_anchor = selection.anchor.clone();
    let mut new_focus = selection.focus.clone();

    for (block_ix, block) in leaves.iter().enumerate().take(end_ix + 1).skip(start_ix) {
        let children = block.el.children.as_slice();
        let (from, to) = block_range(block_ix, children);
        if from >= to {
            continue;
        }

        // A fully covered block needs no run splitting: set the marks on
        // each run in place and leave the points in it alone.
        if from == 0 && to == total_text_len(children) {
            for (child_ix, node) in children.iter().enumerate() {
                let Node::Text(text) = node else {
                    continue;
                };
                if text.text.is_empty() {
                    continue;
                }
                let mut marks = text.marks.clone();
                let changed = if add {
                    marks.insert(mark.clone())
                } else {
                    marks.remove(&mark)
                };
                if changed {
                    let mut path = block.path.clone();
                    path.push(child_ix);
                    ops.push(Op::SetTextMarks { path, marks });
                }
            }
            continue;
        }

        let new_children = remark_runs(children, from, to, &mark, add);
        replace_children_ops(&block.path, children.len(), &new_children, &mut ops);

        for point in [&mut new_anchor, &mut new_focus] {
            let Some((inline_ix, block_path)) = point.path.split_last() else {
                continue;
            };
            if block_path != block.path.as_slice() {
                continue;
            }
            let global = point_global_offset(children, *inline_ix, point.offset);
            *point = point_for_global_offset(&block.path, &new_children, global);
        }
    }

    apply(
        schema,
        doc,
        selection,
        Transaction::new(ops).selection_after(Selection {
            anchor: new_anchor,
            focus: new_focus,
        }),
    )
}

enum Rewrite {
    /// Lift every selected block out of its container (if any) and retype it.
    SetKind(BlockKind),
    /// Convert every selected block to a list item and gather them into one
    /// new container at the first block's position.
    Wrap(BlockKind),
}

/// Sets the block type of the selection. List-container targets wrap, unwrap,
/// or switch the containers around the selected blocks; non-list targets
/// retype the blocks, lifting them out of any list first. Setting the type
/// every selected block already has resets to paragraphs.
pub fn set_block(
    schema: &Schema,
    doc: &Document,
    selection: &Selection,
    target: BlockKind,
) -> Result<(Document, Selection), ApplyError> {
    // A bare list item can never be well-formed on its own.
    if target.is_list_item() {
        return unchanged(doc, selection);
    }
    let Some((leaves, start_ix, end_ix)) = selected_leaf_range(doc, selection) else {
        return unchanged(doc, selection);
    };
    let selected: Vec<Path> = leaves[start_ix..=end_ix]
        .iter()
        .map(|leaf| leaf.path.clone())
        .collect();

    let selected_set: HashSet<Path> = selected.iter().cloned().collect();
    let first_top = selected[0][0];
    let last_top = selected[selected.len() - 1][0];

    let mut is_list = false;
    let mut is_same = false;
    for path in &selected {
        if path.len() < 2 {
            continue;
        }
        if let Some(Node::Element(parent)) = node_at_path(doc, &path[..path.len() - 1]) {
            if parent.kind.is_container() {
                is_list = true;
                if parent.kind == target {
                    is_same = true;
                }
            }
        }
    }

    let rewrite = if !target.is_container() {
        let all_active = selected.iter().all(|path| {
            matches!(node_at_path(doc, path), Some(Node::Element(el)) if el.kind == target)
        });
        Rewrite::SetKind(if all_active {
            BlockKind::Paragraph
        } else {
            target
        })
    } else if is_list && is_same {
        Rewrite::SetKind(BlockKind::Paragraph)
    } else {
        Rewrite::Wrap(target)
    };

    // Rebuild the covered span of top-level nodes. Partially selected
    // containers split into an unselected prefix, the rewritten blocks, and
    // an unselected suffix.
    let mut rebuilt: Vec<Node> = Vec::new();
    let mut container_ix: Option<usize> = None;
    let mut path_map: Vec<(Path, Path)> = Vec::new();

    let mut place_block = |children: Vec<Node>,
                           old_path: Path,
                           rebuilt: &mut Vec<Node>,
                           container_ix: &mut Option<usize>| {
        match &rewrite {
            Rewrite::SetKind(kind) => {
                rebuilt.push(Node::block(kind.clone(), children));
                path_map.push((old_path, vec![first_top + rebuilt.len() - 1]));
            }
            Rewrite::Wrap(kind) => {
                let ix = match *container_ix {
                    Some(ix) => ix,
                    None => {
                        rebuilt.push(Node::block(kind.clone(), Vec::new()));
                        let ix = rebuilt.len() - 1;
                        *container_ix = Some(ix);
                        ix
                    }
                };
                if let Node::Element(container) = &mut rebuilt[ix] {
                    container
                        .children
                        .push(Node::block(BlockKind::ListItem, children));
                    path_map.push((old_path, vec![first_top + ix, container.children.len() - 1]));
                }
            }
        }
    };

    for top_ix in first_top..=last_top {
        let Some(node) = doc.children.get(top_ix) else {
            break;
        };
        match node {
            Node::Element(el) if el.kind.is_container() => {
                let mut remnant: Vec<Node> = Vec::new();
                for (item_ix, item) in el.children.iter().enumerate() {
                    let old_path = vec![top_ix, item_ix];
                    if selected_set.contains(&old_path) {
                        if !remnant.is_empty() {
                            rebuilt.push(Node::block(el.kind.clone(), std::mem::take(&mut remnant)));
                        }
                        let children = match item {
                            Node::Element(item_el) => item_el.children.clone(),
                            Node::Text(text) => vec![Node::Text(text.clone())],
                        };
                        place_block(children, old_path, &mut rebuilt, &mut container_ix);
                    } else {
                        remnant.push(item.clone());
                    }
                }
                if !remnant.is_empty() {
                    rebuilt.push(Node::block(el.kind.clone(), remnant));
                }
            }
            Node::Element(el) => {
                let old_path = vec![top_ix];
                if selected_set.contains(&old_path) {
                    place_block(el.children.clone(), old_path, &mut rebuilt, &mut container_ix);
                } else {
                    rebuilt.push(node.clone());
                }
            }
            Node::Text(_) => rebuilt.push(node.clone()),
        }
    }

    let mut ops: Vec<Op> = Vec::new();
    for top_ix in (first_top..=last_top).rev() {
        ops.push(Op::RemoveNode {
            path: vec![top_ix],
        });
    }
    for (offset, node) in rebuilt.into_iter().enumerate() {
        ops.push(Op::InsertNode {
            path: vec![first_top + offset],
            node,
        });
    }

    let remap_point = |point: &Point| -> Point {
        let Some((_, block_path)) = point.path.split_last() else {
            return point.clone();
        };
        for (old, new) in &path_map {
            if old.as_slice() == block_path {
                let mut path = new.clone();
                path.extend_from_slice(&point.path[old.len()..]);
                return Point::new(path, point.offset);
            }
        }
        point.clone()
    };

    let selection_after = Selection {
        anchor: remap_point(&selection.anchor),
        focus: remap_point(&selection.focus),
    };

    apply(
        schema,
        doc,
        selection,
        Transaction::new(ops).selection_after(selection_after),
    )
}

/// Inserts text at the caret with the caret run's marks; a non-collapsed
/// selection is deleted first.
pub fn insert_text(
    schema: &Schema,
    doc: &Document,
    selection: &Selection,
    text: &str,
) -> Result<(Document, Selection), ApplyError> {
    if text.is_empty() {
        return unchanged(doc, selection);
    }
    if !selection.is_collapsed() {
        let (doc, selection) = delete_selection(schema, doc, selection)?;
        return insert_text(schema, &doc, &selection, text);
    }
    let insert_at = match node_at_path(doc, &selection.focus.path) {
        Some(Node::Text(run)) => clamp_to_char_boundary(&run.text, selection.focus.offset),
        _ => return unchanged(doc, selection),
    };

    let caret = Point::new(selection.focus.path.clone(), insert_at + text.len());
    let op = Op::InsertText {
        path: selection.focus.path.clone(),
        offset: insert_at,
        text: text.to_string(),
    };
    apply(
        schema,
        doc,
        selection,
        Transaction::new(vec![op]).selection_after(Selection::collapsed(caret)),
    )
}

/// Removes the selected range. When the endpoints share a parent the boundary
/// blocks join into one; across a container boundary each side keeps its
/// remainder.
pub fn delete_selection(
    schema: &Schema,
    doc: &Document,
    selection: &Selection,
) -> Result<(Document, Selection), ApplyError> {
    if selection.is_collapsed() {
        return unchanged(doc, selection);
    }
    let Some((leaves, start_ix, end_ix)) = selected_leaf_range(doc, selection) else {
        return unchanged(doc, selection);
    };
    let (start, end) = ordered_points(selection);
    let start_inline = start.path.last().copied().unwrap_or(0);
    let end_inline = end.path.last().copied().unwrap_or(0);

    let start_block = &leaves[start_ix];
    let end_block = &leaves[end_ix];
    let start_children = start_block.el.children.as_slice();
    let end_children = end_block.el.children.as_slice();
    let start_global = point_global_offset(start_children, start_inline, start.offset);
    let end_global = point_global_offset(end_children, end_inline, end.offset);

    let mut ops: Vec<Op> = Vec::new();

    if start_ix == end_ix {
        if start_global >= end_global {
            return unchanged(doc, selection);
        }

        // A range inside one run is a plain text removal.
        let mut cursor = 0usize;
        for (child_ix, node) in start_children.iter().enumerate() {
            let Node::Text(text) = node else {
                continue;
            };
            let node_start = cursor;
            let node_end = cursor + text.text.len();
            cursor = node_end;
            if node_start > start_global {
                break;
            }
            if start_global >= node_start && end_global <= node_end {
                let mut path = start_block.path.clone();
                path.push(child_ix);
                let caret = Point::new(path.clone(), start_global - node_start);
                let op = Op::RemoveText {
                    path,
                    range: start_global - node_start..end_global - node_start,
                };
                return apply(
                    schema,
                    doc,
                    selection,
                    Transaction::new(vec![op]).selection_after(Selection::collapsed(caret)),
                );
            }
        }

        let (before, _) = split_runs(start_children, start_global);
        let (_, after) = split_runs(start_children, end_global);
        let mut new_children = before;
        new_children.extend(after);
        replace_children_ops(&start_block.path, start_children.len(), &new_children, &mut ops);

        let caret = point_for_global_offset(&start_block.path, &new_children, start_global);
        return apply(
            schema,
            doc,
            selection,
            Transaction::new(ops).selection_after(Selection::collapsed(caret)),
        );
    }

    let start_parent = &start_block.path[..start_block.path.len() - 1];
    let end_parent = &end_block.path[..end_block.path.len() - 1];
    let (before, _) = split_runs(start_children, start_global);
    let (_, after) = split_runs(end_children, end_global);

    if start_parent == end_parent {
        // Join the boundary blocks into one, dropping everything between.
        let mut joined_children = before;
        joined_children.extend(after);
        let joined = Node::block(start_block.el.kind.clone(), joined_children.clone());

        let first_sib = *start_block.path.last().unwrap_or(&0);
        let last_sib = *end_block.path.last().unwrap_or(&0);
        for sib in (first_sib..=last_sib).rev() {
            let mut path = start_parent.to_vec();
            path.push(sib);
            ops.push(Op::RemoveNode { path });
        }
        let mut insert_path = start_parent.to_vec();
        insert_path.push(first_sib);
        ops.push(Op::InsertNode {
            path: insert_path,
            node: joined,
        });

        let caret = point_for_global_offset(&start_block.path, &joined_children, start_global);
        return apply(
            schema,
            doc,
            selection,
            Transaction::new(ops).selection_after(Selection::collapsed(caret)),
        );
    }

    // Endpoints sit under different parents (a container boundary): trim both
    // blocks and drop the whole leaf blocks between them, working backwards
    // through the document so earlier paths stay valid.
    replace_children_ops(&end_block.path, end_children.len(), &after, &mut ops);
    for leaf in leaves[start_ix + 1..end_ix].iter().rev() {
        ops.push(Op::RemoveNode {
            path: leaf.path.clone(),
        });
    }
    replace_children_ops(&start_block.path, start_children.len(), &before, &mut ops);

    let caret = point_for_global_offset(&start_block.path, &before, start_global);
    apply(
        schema,
        doc,
        selection,
        Transaction::new(ops).selection_after(Selection::collapsed(caret)),
    )
}

fn split_successor(kind: &BlockKind) -> BlockKind {
    match kind {
        BlockKind::HeadingOne | BlockKind::HeadingTwo | BlockKind::HeadingThree => {
            BlockKind::Paragraph
        }
        other => other.clone(),
    }
}

/// Splits the focus block at the caret. Headings continue as paragraphs;
/// list items continue as sibling list items inside their container.
pub fn split_block(
    schema: &Schema,
    doc: &Document,
    selection: &Selection,
) -> Result<(Document, Selection), ApplyError> {
    if !selection.is_collapsed() {
        let (doc, selection) = delete_selection(schema, doc, selection)?;
        return split_block(schema, &doc, &selection);
    }

    let focus = &selection.focus;
    let Some((inline_ix, block_path)) = focus.path.split_last() else {
        return unchanged(doc, selection);
    };
    let Some(Node::Element(el)) = node_at_path(doc, block_path) else {
        return unchanged(doc, selection);
    };
    if el.kind.is_container() {
        return unchanged(doc, selection);
    }

    let children = el.children.as_slice();
    let global = point_global_offset(children, *inline_ix, focus.offset);
    let (left, right) = split_runs(children, global);

    let mut ops = Vec::new();
    replace_children_ops(block_path, children.len(), &left, &mut ops);

    let Some((block_ix, parent_path)) = block_path.split_last() else {
        return unchanged(doc, selection);
    };
    let mut sibling_path = parent_path.to_vec();
    sibling_path.push(block_ix + 1);
    ops.push(Op::InsertNode {
        path: sibling_path.clone(),
        node: Node::block(split_successor(&el.kind), right),
    });

    let mut caret_path = sibling_path;
    caret_path.push(0);
    apply(
        schema,
        doc,
        selection,
        Transaction::new(ops).selection_after(Selection::collapsed(Point::new(caret_path, 0))),
    )
}
