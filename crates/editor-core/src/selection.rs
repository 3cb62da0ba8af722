use serde::{Deserialize, Serialize};

use crate::document::{
    Document, ElementNode, LeafBlock, Node, Path, leaf_blocks_in_order, node_at_path,
};
use crate::marks::MarkSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }
}

/// The active editing range: an anchor and a focus position, each addressing
/// a text run by path plus a byte offset into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// The selection's endpoints in document order.
pub fn ordered_points(selection: &Selection) -> (Point, Point) {
    let anchor = &selection.anchor;
    let focus = &selection.focus;
    if (anchor.path.as_slice(), anchor.offset) <= (focus.path.as_slice(), focus.offset) {
        (anchor.clone(), focus.clone())
    } else {
        (focus.clone(), anchor.clone())
    }
}

pub(crate) fn total_text_len(children: &[Node]) -> usize {
    children
        .iter()
        .map(|node| match node {
            Node::Text(text) => text.text.len(),
            Node::Element(_) => 0,
        })
        .sum()
}

/// Offset of an inline point from the start of its block's text.
pub(crate) fn point_global_offset(children: &[Node], inline_ix: usize, offset: usize) -> usize {
    let mut global = 0usize;
    for (ix, node) in children.iter().enumerate() {
        if ix == inline_ix {
            if let Node::Text(text) = node {
                global += offset.min(text.text.len());
            }
            break;
        }
        if let Node::Text(text) = node {
            global += text.text.len();
        }
    }
    global
}

/// The point inside `children` sitting `global` bytes into the block's text.
pub(crate) fn point_for_global_offset(
    block_path: &[usize],
    children: &[Node],
    global: usize,
) -> Point {
    let mut cursor = 0usize;
    let mut last_text: Option<(usize, usize)> = None;

    for (ix, node) in children.iter().enumerate() {
        let Node::Text(text) = node else {
            continue;
        };
        let len = text.text.len();
        if global <= cursor + len {
            let mut path = block_path.to_vec();
            path.push(ix);
            return Point::new(path, global - cursor);
        }
        cursor += len;
        last_text = Some((ix, len));
    }

    let mut path = block_path.to_vec();
    match last_text {
        Some((ix, len)) => {
            path.push(ix);
            Point::new(path, len)
        }
        None => {
            path.push(0);
            Point::new(path, 0)
        }
    }
}

/// Leaf blocks in document order plus the index range the selection covers.
/// `None` when either endpoint does not address a leaf block.
pub(crate) fn selected_leaf_range<'a>(
    doc: &'a Document,
    selection: &Selection,
) -> Option<(Vec<LeafBlock<'a>>, usize, usize)> {
    let (start, end) = ordered_points(selection);
    let (_, start_block) = start.path.split_last()?;
    let (_, end_block) = end.path.split_last()?;

    let leaves = leaf_blocks_in_order(doc);
    let start_ix = leaves.iter().position(|leaf| leaf.path == start_block)?;
    let end_ix = leaves.iter().position(|leaf| leaf.path == end_block)?;

    let (start_ix, end_ix) = if start_ix <= end_ix {
        (start_ix, end_ix)
    } else {
        (end_ix, start_ix)
    };
    Some((leaves, start_ix, end_ix))
}

/// Paths of all leaf blocks the selection overlaps, in document order.
pub fn blocks_in_selection(doc: &Document, selection: &Selection) -> Vec<Path> {
    match selected_leaf_range(doc, selection) {
        Some((leaves, start_ix, end_ix)) => leaves[start_ix..=end_ix]
            .iter()
            .map(|leaf| leaf.path.clone())
            .collect(),
        None => Vec::new(),
    }
}

/// Intersection of the mark sets of every run the selection touches. A mark
/// is active only if it is applied across the entire selection; a caret
/// reports the marks of its focus run.
pub fn active_marks(doc: &Document, selection: &Selection) -> MarkSet {
    let focus_marks = || match node_at_path(doc, &selection.focus.path) {
        Some(Node::Text(text)) => text.marks.clone(),
        _ => MarkSet::new(),
    };

    if selection.is_collapsed() {
        return focus_marks();
    }

    let Some((leaves, start_ix, end_ix)) = selected_leaf_range(doc, selection) else {
        return MarkSet::new();
    };
    let (start, end) = ordered_points(selection);
    let start_inline = start.path.last().copied().unwrap_or(0);
    let end_inline = end.path.last().copied().unwrap_or(0);

    let mut common: Option<MarkSet> = None;
    for (block_ix, block) in leaves.iter().enumerate().take(end_ix + 1).skip(start_ix) {
        let children = block.el.children.as_slice();
        let total = total_text_len(children);
        if total == 0 {
            continue;
        }

        let start_global = if block_ix == start_ix {
            point_global_offset(children, start_inline, start.offset)
        } else {
            0
        };
        let end_global = if block_ix == end_ix {
            point_global_offset(children, end_inline, end.offset)
        } else {
            total
        };
        if start_global >= end_global {
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
            if node_end <= start_global || node_start >= end_global || text.text.is_empty() {
                continue;
            }
            common = Some(match common.take() {
                None => text.marks.clone(),
                Some(current) => current.intersection(&text.marks),
            });
            if common.as_ref().is_some_and(|set| set.is_empty()) {
                return MarkSet::new();
            }
        }
    }

    common.unwrap_or_else(focus_marks)
}

/// Nearest ancestor element (including the node at `point_path` itself)
/// matching the predicate.
pub fn nearest_ancestor(
    doc: &Document,
    point_path: &[usize],
    pred: impl Fn(&ElementNode) -> bool,
) -> Option<Path> {
    let mut path: Path = point_path.to_vec();
    while !path.is_empty() {
        if let Some(Node::Element(el)) = node_at_path(doc, &path) {
            if pred(el) {
                return Some(path);
            }
        }
        path.pop();
    }
    None
}

pub fn nearest_list_ancestor(doc: &Document, point_path: &[usize]) -> Option<Path> {
    nearest_ancestor(doc, point_path, |el| el.kind.is_container())
}

/// Whether any selected leaf block has the given kind; list-container kinds
/// match through the nearest container ancestor. Drives toolbar toggle state.
pub fn has_block(doc: &Document, selection: &Selection, kind: &crate::document::BlockKind) -> bool {
    blocks_in_selection(doc, selection).iter().any(|path| {
        if let Some(Node::Element(el)) = node_at_path(doc, path) {
            if el.kind == *kind {
                return true;
            }
        }
        if kind.is_container() {
            if let Some(container) = nearest_list_ancestor(doc, path) {
                if let Some(Node::Element(el)) = node_at_path(doc, &container) {
                    return el.kind == *kind;
                }
            }
        }
        false
    })
}

/// Clamps a selection to text leaves that exist in the document.
pub fn normalize_selection(doc: &Document, selection: &Selection) -> Selection {
    let fallback = first_text_point(doc).unwrap_or(Point {
        path: vec![0],
        offset: 0,
    });

    let anchor = normalize_point(doc, &selection.anchor).unwrap_or_else(|| {
        normalize_point(doc, &selection.focus).unwrap_or_else(|| fallback.clone())
    });
    let focus = normalize_point(doc, &selection.focus).unwrap_or_else(|| anchor.clone());

    Selection { anchor, focus }
}

fn first_text_point(doc: &Document) -> Option<Point> {
    first_text_descendant(&doc.children, &mut Path::new())
}

fn first_text_descendant(children: &[Node], path: &mut Path) -> Option<Point> {
    for (ix, node) in children.iter().enumerate() {
        path.push(ix);
        match node {
            Node::Text(_) => {
                let point = Point {
                    path: path.clone(),
                    offset: 0,
                };
                path.pop();
                return Some(point);
            }
            Node::Element(el) => {
                if let Some(point) = first_text_descendant(&el.children, path) {
                    path.pop();
                    return Some(point);
                }
            }
        }
        path.pop();
    }
    None
}

fn normalize_point(doc: &Document, point: &Point) -> Option<Point> {
    if point.path.is_empty() || doc.children.is_empty() {
        return None;
    }

    let mut resolved_path: Path = Path::new();
    let mut children: &[Node] = &doc.children;

    for &wanted in &point.path {
        if children.is_empty() {
            break;
        }
        let ix = wanted.min(children.len() - 1);
        resolved_path.push(ix);
        match &children[ix] {
            Node::Text(text) => {
                return Some(Point {
                    path: resolved_path,
                    offset: point.offset.min(text.text.len()),
                });
            }
            Node::Element(el) => {
                children = &el.children;
            }
        }
    }

    match node_at_path(doc, &resolved_path)? {
        Node::Text(text) => Some(Point {
            path: resolved_path,
            offset: point.offset.min(text.text.len()),
        }),
        Node::Element(el) => first_text_descendant(&el.children, &mut resolved_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BlockKind;
    use crate::marks::Mark;

    fn marked(text: &str, marks: &[Mark]) -> Node {
        Node::text(text, marks.iter().cloned().collect())
    }

    #[test]
    fn ordered_points_swap_backwards_selection() {
        let selection = Selection {
            anchor: Point::new(vec![1, 0], 2),
            focus: Point::new(vec![0, 0], 1),
        };
        let (start, end) = ordered_points(&selection);
        assert_eq!(start.path, vec![0, 0]);
        assert_eq!(end.path, vec![1, 0]);
    }

    #[test]
    fn active_marks_requires_full_coverage() {
        let doc = Document {
            children: vec![Node::block(
                BlockKind::Paragraph,
                vec![
                    marked("Hello", &[Mark::Bold]),
                    marked(" world", &[]),
                ],
            )],
        };

        let bold_only = Selection {
            anchor: Point::new(vec![0, 0], 0),
            focus: Point::new(vec![0, 0], 5),
        };
        assert!(active_marks(&doc, &bold_only).contains(&Mark::Bold));

        let mixed = Selection {
            anchor: Point::new(vec![0, 0], 0),
            focus: Point::new(vec![0, 1], 3),
        };
        assert!(!active_marks(&doc, &mixed).contains(&Mark::Bold));
    }

    #[test]
    fn nearest_list_ancestor_finds_container() {
        let doc = Document {
            children: vec![Node::block(
                BlockKind::BulletedList,
                vec![Node::list_item("a")],
            )],
        };
        assert_eq!(nearest_list_ancestor(&doc, &[0, 0, 0]), Some(vec![0]));
        assert_eq!(nearest_list_ancestor(&doc, &[0, 0]), Some(vec![0]));
    }

    #[test]
    fn normalize_selection_clamps_to_existing_text() {
        let doc = Document {
            children: vec![Node::paragraph("ab")],
        };
        let wild = Selection::collapsed(Point::new(vec![5, 9], 40));
        let fixed = normalize_selection(&doc, &wild);
        assert_eq!(fixed.focus.path, vec![0, 0]);
        assert_eq!(fixed.focus.offset, 2);
    }
}
