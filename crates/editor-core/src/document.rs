use std::fmt;

use serde::{Deserialize, Serialize};

use crate::marks::MarkSet;

pub type Path = Vec<usize>;

/// Block node kinds. The closed set of known kinds plus a catch-all that
/// carries an unrecognized type string verbatim, so foreign documents survive
/// a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockKind {
    Paragraph,
    HeadingOne,
    HeadingTwo,
    HeadingThree,
    BlockQuote,
    Code,
    ListItem,
    BulletedList,
    NumberedList,
    Other(String),
}

impl BlockKind {
    pub fn as_str(&self) -> &str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::HeadingOne => "heading-one",
            BlockKind::HeadingTwo => "heading-two",
            BlockKind::HeadingThree => "heading-three",
            BlockKind::BlockQuote => "block-quote",
            BlockKind::Code => "code",
            BlockKind::ListItem => "list-item",
            BlockKind::BulletedList => "bulleted-list",
            BlockKind::NumberedList => "numbered-list",
            BlockKind::Other(kind) => kind,
        }
    }

    /// Container blocks hold list items only; every other kind holds text runs.
    pub fn is_container(&self) -> bool {
        matches!(self, BlockKind::BulletedList | BlockKind::NumberedList)
    }

    pub fn is_list_item(&self) -> bool {
        matches!(self, BlockKind::ListItem)
    }
}

impl Default for BlockKind {
    fn default() -> Self {
        BlockKind::Paragraph
    }
}

impl From<&str> for BlockKind {
    fn from(kind: &str) -> Self {
        match kind {
            "paragraph" => BlockKind::Paragraph,
            "heading-one" => BlockKind::HeadingOne,
            "heading-two" => BlockKind::HeadingTwo,
            "heading-three" => BlockKind::HeadingThree,
            "block-quote" => BlockKind::BlockQuote,
            "code" => BlockKind::Code,
            "list-item" => BlockKind::ListItem,
            "bulleted-list" => BlockKind::BulletedList,
            "numbered-list" => BlockKind::NumberedList,
            other => BlockKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for BlockKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BlockKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let kind = String::deserialize(deserializer)?;
        Ok(BlockKind::from(kind.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Document {
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
}

impl Node {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::Element(ElementNode {
            kind: BlockKind::Paragraph,
            children: vec![Node::Text(TextNode {
                text: text.into(),
                marks: MarkSet::default(),
            })],
        })
    }

    pub fn list_item(text: impl Into<String>) -> Self {
        Node::Element(ElementNode {
            kind: BlockKind::ListItem,
            children: vec![Node::Text(TextNode {
                text: text.into(),
                marks: MarkSet::default(),
            })],
        })
    }

    pub fn block(kind: BlockKind, children: Vec<Node>) -> Self {
        Node::Element(ElementNode { kind, children })
    }

    pub fn text(text: impl Into<String>, marks: MarkSet) -> Self {
        Node::Text(TextNode {
            text: text.into(),
            marks,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub kind: BlockKind,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl ElementNode {
    /// Concatenation of the direct text runs of this element.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let Node::Text(text) = node {
                out.push_str(&text.text);
            }
        }
        out
    }
}

/// A run: a contiguous span of characters sharing one mark set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(default)]
    pub marks: MarkSet,
}

impl Document {
    /// One paragraph per line; the legacy article API stores bodies this way.
    pub fn from_plain_text(text: &str) -> Self {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let children: Vec<Node> = text.split('\n').map(Node::paragraph).collect();
        Self { children }
    }

    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        for (ix, block) in leaf_blocks_in_order(self).iter().enumerate() {
            if ix > 0 {
                out.push('\n');
            }
            out.push_str(&block.el.to_plain_text());
        }
        out
    }
}

/// A leaf block (a block whose children are text runs), paired with its path.
pub struct LeafBlock<'a> {
    pub path: Path,
    pub el: &'a ElementNode,
}

/// All leaf blocks in document order, descending through container blocks.
pub fn leaf_blocks_in_order(doc: &Document) -> Vec<LeafBlock<'_>> {
    fn walk<'a>(children: &'a [Node], path: &mut Path, out: &mut Vec<LeafBlock<'a>>) {
        for (ix, node) in children.iter().enumerate() {
            let Node::Element(el) = node else {
                continue;
            };
            path.push(ix);
            let has_element_child = el
                .children
                .iter()
                .any(|child| matches!(child, Node::Element(_)));
            if has_element_child {
                walk(&el.children, path, out);
            } else {
                out.push(LeafBlock {
                    path: path.clone(),
                    el,
                });
            }
            path.pop();
        }
    }

    let mut out = Vec::new();
    walk(&doc.children, &mut Path::new(), &mut out);
    out
}

pub fn node_at_path<'a>(doc: &'a Document, path: &[usize]) -> Option<&'a Node> {
    if path.is_empty() {
        return None;
    }

    let mut node = doc.children.get(path[0])?;
    for &ix in path.iter().skip(1) {
        node = match node {
            Node::Element(el) => el.children.get(ix)?,
            Node::Text(_) => return None,
        };
    }
    Some(node)
}

pub fn children_at_path<'a>(doc: &'a Document, parent_path: &[usize]) -> Option<&'a [Node]> {
    if parent_path.is_empty() {
        return Some(&doc.children);
    }
    match node_at_path(doc, parent_path)? {
        Node::Element(el) => Some(&el.children),
        Node::Text(_) => None,
    }
}

#[derive(Debug)]
pub struct PathError(pub String);

pub(crate) fn node_mut<'a>(doc: &'a mut Document, path: &[usize]) -> Result<&'a mut Node, PathError> {
    let (last, parents) = path
        .split_last()
        .ok_or_else(|| PathError("empty path".into()))?;

    let mut children: &mut Vec<Node> = &mut doc.children;
    for (depth, &ix) in parents.iter().enumerate() {
        let len = children.len();
        let node = children.get_mut(ix).ok_or_else(|| {
            PathError(format!("path out of bounds at depth {depth}: {ix} >= {len}"))
        })?;
        children = match node {
            Node::Element(el) => &mut el.children,
            Node::Text(_) => {
                return Err(PathError(format!("non-container node at depth {depth}")));
            }
        };
    }

    let len = children.len();
    children
        .get_mut(*last)
        .ok_or_else(|| PathError(format!("path out of bounds: {last} >= {len}")))
}

pub(crate) fn node_text_mut<'a>(
    doc: &'a mut Document,
    path: &[usize],
) -> Result<&'a mut TextNode, PathError> {
    match node_mut(doc, path)? {
        Node::Text(text) => Ok(text),
        Node::Element(_) => Err(PathError("expected text node".into())),
    }
}

pub(crate) fn children_mut<'a>(
    doc: &'a mut Document,
    parent_path: &[usize],
) -> Result<&'a mut Vec<Node>, PathError> {
    if parent_path.is_empty() {
        return Ok(&mut doc.children);
    }
    match node_mut(doc, parent_path)? {
        Node::Element(el) => Ok(&mut el.children),
        Node::Text(_) => Err(PathError("parent is not a container".into())),
    }
}

pub(crate) fn insert_node(doc: &mut Document, path: &[usize], node: Node) -> Result<(), PathError> {
    let (index, parent_path) = path
        .split_last()
        .ok_or_else(|| PathError("empty insert path".into()))?;

    let children = children_mut(doc, parent_path)?;
    if *index > children.len() {
        return Err(PathError(format!(
            "insert index out of bounds: {index} > {}",
            children.len()
        )));
    }
    children.insert(*index, node);
    Ok(())
}

pub(crate) fn remove_node(doc: &mut Document, path: &[usize]) -> Result<Node, PathError> {
    let (index, parent_path) = path
        .split_last()
        .ok_or_else(|| PathError("empty remove path".into()))?;

    let children = children_mut(doc, parent_path)?;
    if *index >= children.len() {
        return Err(PathError(format!(
            "remove index out of bounds: {index} >= {}",
            children.len()
        )));
    }
    Ok(children.remove(*index))
}

pub(crate) fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}
