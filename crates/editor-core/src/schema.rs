use std::collections::HashMap;
use std::fmt;

use crate::document::{BlockKind, Document, ElementNode, Node, Path};
use crate::ops::Op;

/// What an element kind may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildConstraint {
    /// Text runs only (leaf blocks).
    InlineOnly,
    /// List-item blocks only (container blocks).
    ListItemOnly,
    /// No constraint; used for unrecognized kinds.
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    pub kind: BlockKind,
    pub children: ChildConstraint,
}

/// A structural repair step. Passes run to a fixed point after every
/// transaction so the invariants of the document model always hold.
pub trait NormalizePass {
    fn id(&self) -> &'static str;
    fn run(&self, doc: &Document, schema: &Schema) -> Vec<Op>;
}

/// An invariant violation. Produced only by a defective command; never
/// observable from correct engine logic.
#[derive(Debug, Clone)]
pub struct StructuralFault {
    message: String,
}

impl StructuralFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StructuralFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

pub struct Schema {
    specs: HashMap<BlockKind, NodeSpec>,
    passes: Vec<Box<dyn NormalizePass>>,
}

impl Schema {
    /// The wiki document schema: paragraphs, three heading levels, quotes,
    /// code, and the two list containers.
    pub fn wiki() -> Self {
        let leaf_kinds = [
            BlockKind::Paragraph,
            BlockKind::HeadingOne,
            BlockKind::HeadingTwo,
            BlockKind::HeadingThree,
            BlockKind::BlockQuote,
            BlockKind::Code,
            BlockKind::ListItem,
        ];
        let container_kinds = [BlockKind::BulletedList, BlockKind::NumberedList];

        let mut specs = HashMap::new();
        for kind in leaf_kinds {
            specs.insert(
                kind.clone(),
                NodeSpec {
                    kind,
                    children: ChildConstraint::InlineOnly,
                },
            );
        }
        for kind in container_kinds {
            specs.insert(
                kind.clone(),
                NodeSpec {
                    kind,
                    children: ChildConstraint::ListItemOnly,
                },
            );
        }

        let passes: Vec<Box<dyn NormalizePass>> = vec![
            Box::new(EnsureNonEmptyDocument),
            Box::new(OrphanListItems),
            Box::new(ContainerChildren),
            Box::new(DropEmptyContainers),
            Box::new(MergeAdjacentContainers),
            Box::new(EnsureTextLeaf),
            Box::new(DropEmptyTextLeaves),
            Box::new(MergeAdjacentTextLeaves),
        ];

        Self { specs, passes }
    }

    pub fn spec(&self, kind: &BlockKind) -> Option<&NodeSpec> {
        self.specs.get(kind)
    }

    pub fn is_known_kind(&self, kind: &BlockKind) -> bool {
        self.specs.contains_key(kind)
    }

    /// Constraint for an element; unrecognized kinds are inferred from their
    /// current children so foreign nodes stay untouched.
    pub fn child_constraint(&self, el: &ElementNode) -> ChildConstraint {
        match self.specs.get(&el.kind) {
            Some(spec) => spec.children,
            None => {
                if el
                    .children
                    .iter()
                    .any(|child| matches!(child, Node::Text(_)))
                {
                    ChildConstraint::InlineOnly
                } else {
                    ChildConstraint::Any
                }
            }
        }
    }

    /// Ops of the first pass that has repairs to make. The engine applies
    /// them and asks again until no pass fires.
    pub fn normalize(&self, doc: &Document) -> Vec<Op> {
        for pass in &self.passes {
            let ops = pass.run(doc, self);
            if !ops.is_empty() {
                return ops;
            }
        }
        Vec::new()
    }

    /// Structural well-formedness. Run after normalization; a failure here is
    /// a defect in the command that produced the tree.
    pub fn validate(&self, doc: &Document) -> Result<(), StructuralFault> {
        if doc.children.is_empty() {
            return Err(StructuralFault::new("document has no blocks"));
        }

        for (ix, node) in doc.children.iter().enumerate() {
            match node {
                Node::Text(_) => {
                    return Err(StructuralFault::new(format!(
                        "bare text run at document root (index {ix})"
                    )));
                }
                Node::Element(el) => {
                    if el.kind.is_list_item() {
                        return Err(StructuralFault::new(format!(
                            "list item outside a container (index {ix})"
                        )));
                    }
                    self.validate_element(el, &mut vec![ix])?;
                }
            }
        }

        self.validate_no_adjacent_containers(&doc.children, &[])?;
        Ok(())
    }

    fn validate_element(&self, el: &ElementNode, path: &mut Path) -> Result<(), StructuralFault> {
        // Unrecognized kinds are only checked for orphan list items; their
        // shape is whatever the transport delivered.
        let constraint = match self.specs.get(&el.kind) {
            Some(spec) => spec.children,
            None => ChildConstraint::Any,
        };
        match constraint {
            ChildConstraint::ListItemOnly => {
                if el.children.is_empty() {
                    return Err(StructuralFault::new(format!(
                        "empty {} container at {path:?}",
                        el.kind
                    )));
                }
                for (ix, child) in el.children.iter().enumerate() {
                    match child {
                        Node::Element(item) if item.kind.is_list_item() => {
                            path.push(ix);
                            self.validate_element(item, path)?;
                            path.pop();
                        }
                        _ => {
                            return Err(StructuralFault::new(format!(
                                "{} container holds a non-list-item child at {path:?}[{ix}]",
                                el.kind
                            )));
                        }
                    }
                }
            }
            ChildConstraint::InlineOnly => {
                self.validate_runs(el, path)?;
            }
            ChildConstraint::Any => {
                for (ix, child) in el.children.iter().enumerate() {
                    if let Node::Element(child_el) = child {
                        if child_el.kind.is_list_item() {
                            return Err(StructuralFault::new(format!(
                                "list item outside a container at {path:?}[{ix}]"
                            )));
                        }
                        path.push(ix);
                        self.validate_element(child_el, path)?;
                        path.pop();
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_runs(&self, el: &ElementNode, path: &mut Path) -> Result<(), StructuralFault> {
        let mut prev: Option<&crate::document::TextNode> = None;
        let run_count = el.children.len();
        for (ix, child) in el.children.iter().enumerate() {
            let Node::Text(text) = child else {
                return Err(StructuralFault::new(format!(
                    "{} block holds a non-text child at {path:?}[{ix}]",
                    el.kind
                )));
            };
            if text.text.is_empty() && run_count > 1 {
                return Err(StructuralFault::new(format!(
                    "empty run beside other runs at {path:?}[{ix}]"
                )));
            }
            if let Some(prev) = prev {
                if prev.marks == text.marks {
                    return Err(StructuralFault::new(format!(
                        "adjacent runs with identical marks at {path:?}[{ix}]"
                    )));
                }
            }
            prev = Some(text);
        }
        Ok(())
    }

    fn validate_no_adjacent_containers(
        &self,
        children: &[Node],
        path: &[usize],
    ) -> Result<(), StructuralFault> {
        for window in children.windows(2) {
            if let (Node::Element(a), Node::Element(b)) = (&window[0], &window[1]) {
                if a.kind.is_container() && a.kind == b.kind {
                    return Err(StructuralFault::new(format!(
                        "adjacent {} containers at {path:?}",
                        a.kind
                    )));
                }
            }
        }
        Ok(())
    }
}

struct EnsureNonEmptyDocument;

impl NormalizePass for EnsureNonEmptyDocument {
    fn id(&self) -> &'static str {
        "ensure_non_empty_document"
    }

    fn run(&self, doc: &Document, _schema: &Schema) -> Vec<Op> {
        if doc.children.is_empty() {
            return vec![Op::InsertNode {
                path: vec![0],
                node: Node::paragraph(""),
            }];
        }
        Vec::new()
    }
}

/// List items that lost their container become paragraphs.
struct OrphanListItems;

impl NormalizePass for OrphanListItems {
    fn id(&self) -> &'static str {
        "orphan_list_items"
    }

    fn run(&self, doc: &Document, _schema: &Schema) -> Vec<Op> {
        let mut ops = Vec::new();

        fn walk(children: &[Node], in_container: bool, path: &mut Path, ops: &mut Vec<Op>) {
            for (ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };
                path.push(ix);
                if el.kind.is_list_item() && !in_container {
                    ops.push(Op::SetNodeKind {
                        path: path.clone(),
                        kind: BlockKind::Paragraph,
                    });
                }
                walk(&el.children, el.kind.is_container(), path, ops);
                path.pop();
            }
        }

        walk(&doc.children, false, &mut Path::new(), &mut ops);
        ops
    }
}

/// Containers may hold list items only; stray children are converted.
struct ContainerChildren;

impl NormalizePass for ContainerChildren {
    fn id(&self) -> &'static str {
        "container_children"
    }

    fn run(&self, doc: &Document, _schema: &Schema) -> Vec<Op> {
        let mut ops = Vec::new();

        fn walk(children: &[Node], path: &mut Path, ops: &mut Vec<Op>) {
            for (ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };
                path.push(ix);
                if el.kind.is_container() {
                    for (child_ix, child) in el.children.iter().enumerate() {
                        let mut child_path = path.clone();
                        child_path.push(child_ix);
                        match child {
                            Node::Element(item) if item.kind.is_list_item() => {}
                            Node::Element(_) => {
                                ops.push(Op::SetNodeKind {
                                    path: child_path,
                                    kind: BlockKind::ListItem,
                                });
                            }
                            Node::Text(text) => {
                                ops.push(Op::RemoveNode {
                                    path: child_path.clone(),
                                });
                                ops.push(Op::InsertNode {
                                    path: child_path,
                                    node: Node::block(
                                        BlockKind::ListItem,
                                        vec![Node::Text(text.clone())],
                                    ),
                                });
                            }
                        }
                    }
                } else {
                    walk(&el.children, path, ops);
                }
                path.pop();
            }
        }

        walk(&doc.children, &mut Path::new(), &mut ops);
        ops
    }
}

struct DropEmptyContainers;

impl NormalizePass for DropEmptyContainers {
    fn id(&self) -> &'static str {
        "drop_empty_containers"
    }

    fn run(&self, doc: &Document, _schema: &Schema) -> Vec<Op> {
        let mut ops = Vec::new();

        fn walk(children: &[Node], path: &mut Path, ops: &mut Vec<Op>) {
            for (ix, node) in children.iter().enumerate().rev() {
                let Node::Element(el) = node else {
                    continue;
                };
                if el.kind.is_container() && el.children.is_empty() {
                    let mut remove_path = path.clone();
                    remove_path.push(ix);
                    ops.push(Op::RemoveNode { path: remove_path });
                } else {
                    path.push(ix);
                    walk(&el.children, path, ops);
                    path.pop();
                }
            }
        }

        walk(&doc.children, &mut Path::new(), &mut ops);
        ops
    }
}

/// Adjacent containers of the same kind merge into one. Repairs one pair per
/// run; the engine iterates to a fixed point.
struct MergeAdjacentContainers;

impl NormalizePass for MergeAdjacentContainers {
    fn id(&self) -> &'static str {
        "merge_adjacent_containers"
    }

    fn run(&self, doc: &Document, _schema: &Schema) -> Vec<Op> {
        fn walk(children: &[Node], path: &mut Path) -> Vec<Op> {
            for ix in 0..children.len().saturating_sub(1) {
                let (Node::Element(first), Node::Element(second)) =
                    (&children[ix], &children[ix + 1])
                else {
                    continue;
                };
                if !first.kind.is_container() || first.kind != second.kind {
                    continue;
                }

                let mut ops = Vec::new();
                for (child_ix, child) in second.children.iter().enumerate() {
                    let mut insert_path = path.clone();
                    insert_path.push(ix);
                    insert_path.push(first.children.len() + child_ix);
                    ops.push(Op::InsertNode {
                        path: insert_path,
                        node: child.clone(),
                    });
                }
                let mut remove_path = path.clone();
                remove_path.push(ix + 1);
                ops.push(Op::RemoveNode { path: remove_path });
                return ops;
            }

            for (ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };
                path.push(ix);
                let ops = walk(&el.children, path);
                path.pop();
                if !ops.is_empty() {
                    return ops;
                }
            }
            Vec::new()
        }

        walk(&doc.children, &mut Path::new())
    }
}

/// Every leaf block keeps at least one run, even when empty.
struct EnsureTextLeaf;

impl NormalizePass for EnsureTextLeaf {
    fn id(&self) -> &'static str {
        "ensure_text_leaf"
    }

    fn run(&self, doc: &Document, schema: &Schema) -> Vec<Op> {
        let mut ops = Vec::new();

        fn walk(children: &[Node], path: &mut Path, schema: &Schema, ops: &mut Vec<Op>) {
            for (ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };
                path.push(ix);
                if schema.child_constraint(el) == ChildConstraint::InlineOnly {
                    let has_text = el
                        .children
                        .iter()
                        .any(|child| matches!(child, Node::Text(_)));
                    if !has_text {
                        let mut insert_path = path.clone();
                        insert_path.push(0);
                        ops.push(Op::InsertNode {
                            path: insert_path,
                            node: Node::text("", crate::marks::MarkSet::new()),
                        });
                    }
                } else {
                    walk(&el.children, path, schema, ops);
                }
                path.pop();
            }
        }

        walk(&doc.children, &mut Path::new(), schema, &mut ops);
        ops
    }
}

/// A run is never empty unless it is the sole run of its block.
struct DropEmptyTextLeaves;

impl NormalizePass for DropEmptyTextLeaves {
    fn id(&self) -> &'static str {
        "drop_empty_text_leaves"
    }

    fn run(&self, doc: &Document, schema: &Schema) -> Vec<Op> {
        let mut ops = Vec::new();

        fn walk(children: &[Node], path: &mut Path, schema: &Schema, ops: &mut Vec<Op>) {
            for (ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };
                path.push(ix);
                if schema.child_constraint(el) == ChildConstraint::InlineOnly {
                    let has_any_text = el.children.iter().any(|child| match child {
                        Node::Text(text) => !text.text.is_empty(),
                        Node::Element(_) => false,
                    });
                    if el.children.len() >= 2 {
                        for (child_ix, child) in el.children.iter().enumerate().rev() {
                            if let Node::Text(text) = child {
                                // With no text anywhere, the first empty run
                                // stays as the block's sole run.
                                if text.text.is_empty() && (has_any_text || child_ix > 0) {
                                    let mut remove_path = path.clone();
                                    remove_path.push(child_ix);
                                    ops.push(Op::RemoveNode { path: remove_path });
                                }
                            }
                        }
                    }
                } else {
                    walk(&el.children, path, schema, ops);
                }
                path.pop();
            }
        }

        walk(&doc.children, &mut Path::new(), schema, &mut ops);
        ops
    }
}

/// Adjacent runs with identical mark sets merge into the leftmost one. One
/// pair merges per run so selections re-home precisely; the engine iterates
/// to a fixed point.
struct MergeAdjacentTextLeaves;

impl NormalizePass for MergeAdjacentTextLeaves {
    fn id(&self) -> &'static str {
        "merge_adjacent_text_leaves"
    }

    fn run(&self, doc: &Document, schema: &Schema) -> Vec<Op> {
        fn walk(children: &[Node], path: &mut Path, schema: &Schema) -> Vec<Op> {
            for (ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };
                path.push(ix);

                if schema.child_constraint(el) == ChildConstraint::InlineOnly {
                    for pair_ix in 0..el.children.len().saturating_sub(1) {
                        let (Node::Text(left), Node::Text(right)) =
                            (&el.children[pair_ix], &el.children[pair_ix + 1])
                        else {
                            continue;
                        };
                        if left.marks != right.marks {
                            continue;
                        }

                        let mut ops = Vec::new();
                        if !right.text.is_empty() {
                            let mut insert_text_path = path.clone();
                            insert_text_path.push(pair_ix);
                            ops.push(Op::InsertText {
                                path: insert_text_path,
                                offset: left.text.len(),
                                text: right.text.clone(),
                            });
                        }
                        let mut remove_path = path.clone();
                        remove_path.push(pair_ix + 1);
                        ops.push(Op::RemoveNode { path: remove_path });
                        path.pop();
                        return ops;
                    }
                } else {
                    let ops = walk(&el.children, path, schema);
                    if !ops.is_empty() {
                        path.pop();
                        return ops;
                    }
                }

                path.pop();
            }
            Vec::new()
        }

        walk(&doc.children, &mut Path::new(), schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::MarkSet;

    #[test]
    fn wiki_schema_knows_the_document_kinds() {
        let schema = Schema::wiki();
        assert!(schema.is_known_kind(&BlockKind::Paragraph));
        assert!(!schema.is_known_kind(&BlockKind::Other("custom-widget".into())));
        assert_eq!(
            schema.spec(&BlockKind::BulletedList).map(|s| s.children),
            Some(ChildConstraint::ListItemOnly)
        );
    }

    #[test]
    fn unknown_kinds_infer_their_constraint_from_children() {
        let schema = Schema::wiki();
        let with_text = ElementNode {
            kind: BlockKind::Other("custom-widget".into()),
            children: vec![Node::text("x", MarkSet::new())],
        };
        assert_eq!(schema.child_constraint(&with_text), ChildConstraint::InlineOnly);

        let opaque = ElementNode {
            kind: BlockKind::Other("custom-widget".into()),
            children: vec![Node::paragraph("inner")],
        };
        assert_eq!(schema.child_constraint(&opaque), ChildConstraint::Any);
    }

    #[test]
    fn validate_rejects_orphan_list_items() {
        let schema = Schema::wiki();
        let doc = Document {
            children: vec![Node::list_item("stray")],
        };
        let fault = schema.validate(&doc).unwrap_err();
        assert!(fault.message().contains("list item"));
    }

    #[test]
    fn validate_rejects_adjacent_containers_of_one_kind() {
        let schema = Schema::wiki();
        let doc = Document {
            children: vec![
                Node::block(BlockKind::BulletedList, vec![Node::list_item("a")]),
                Node::block(BlockKind::BulletedList, vec![Node::list_item("b")]),
            ],
        };
        assert!(schema.validate(&doc).is_err());
    }

    #[test]
    fn validate_rejects_unmerged_runs() {
        let schema = Schema::wiki();
        let doc = Document {
            children: vec![Node::block(
                BlockKind::Paragraph,
                vec![
                    Node::text("a", MarkSet::new()),
                    Node::text("b", MarkSet::new()),
                ],
            )],
        };
        assert!(schema.validate(&doc).is_err());
    }
}
