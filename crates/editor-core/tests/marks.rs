use scribe_editor_core::{
    BlockKind, Document, Mark, MarkSet, Node, Point, Schema, Selection, active_marks,
    leaf_blocks_in_order, toggle_mark,
};

fn runs(doc: &Document, block: usize) -> Vec<(String, Vec<String>)> {
    let Node::Element(el) = &doc.children[block] else {
        panic!("expected element block");
    };
    el.children
        .iter()
        .map(|node| match node {
            Node::Text(text) => (
                text.text.clone(),
                text.marks.iter().map(|m| m.as_str().to_string()).collect(),
            ),
            Node::Element(_) => panic!("expected text run"),
        })
        .collect()
}

fn char_marks(doc: &Document) -> Vec<(char, Vec<String>)> {
    let mut out = Vec::new();
    for leaf in leaf_blocks_in_order(doc) {
        for node in &leaf.el.children {
            if let Node::Text(text) = node {
                for ch in text.text.chars() {
                    out.push((
                        ch,
                        text.marks.iter().map(|m| m.as_str().to_string()).collect(),
                    ));
                }
            }
        }
    }
    out
}

#[test]
fn toggle_bold_only_affects_selection_range() {
    let schema = Schema::wiki();
    let doc = Document {
        children: vec![Node::paragraph("abcde")],
    };
    let selection = Selection {
        anchor: Point::new(vec![0, 0], 1),
        focus: Point::new(vec![0, 0], 3),
    };

    let (doc, selection) = toggle_mark(&schema, &doc, &selection, Mark::Bold).unwrap();
    assert_eq!(
        runs(&doc, 0),
        vec![
            ("a".to_string(), vec![]),
            ("bc".to_string(), vec!["bold".to_string()]),
            ("de".to_string(), vec![]),
        ]
    );
    assert_eq!(selection.anchor, Point::new(vec![0, 0], 1));
    assert_eq!(selection.focus, Point::new(vec![0, 1], 2));

    let (doc, selection) = toggle_mark(&schema, &doc, &selection, Mark::Bold).unwrap();
    assert_eq!(runs(&doc, 0), vec![("abcde".to_string(), vec![])]);
    assert_eq!(selection.anchor, Point::new(vec![0, 0], 1));
    assert_eq!(selection.focus, Point::new(vec![0, 0], 3));
}

#[test]
fn toggling_twice_restores_text_and_marks() {
    let schema = Schema::wiki();
    let bold: MarkSet = [Mark::Bold].into_iter().collect();
    let doc = Document {
        children: vec![Node::block(
            BlockKind::Paragraph,
            vec![Node::text("He", bold), Node::text("llo", MarkSet::new())],
        )],
    };
    let selection = Selection {
        anchor: Point::new(vec![0, 0], 1),
        focus: Point::new(vec![0, 1], 2),
    };
    let original = char_marks(&doc);

    let (doc, selection) = toggle_mark(&schema, &doc, &selection, Mark::Italic).unwrap();
    assert_ne!(char_marks(&doc), original);

    let (doc, _) = toggle_mark(&schema, &doc, &selection, Mark::Italic).unwrap();
    assert_eq!(char_marks(&doc), original);
}

#[test]
fn mark_is_active_only_when_applied_everywhere() {
    let schema = Schema::wiki();
    let bold: MarkSet = [Mark::Bold].into_iter().collect();
    let doc = Document {
        children: vec![
            Node::block(BlockKind::Paragraph, vec![Node::text("ab", bold.clone())]),
            Node::block(BlockKind::Paragraph, vec![Node::text("cd", bold.clone())]),
        ],
    };
    let all = Selection {
        anchor: Point::new(vec![0, 0], 0),
        focus: Point::new(vec![1, 0], 2),
    };
    assert!(active_marks(&doc, &all).contains(&Mark::Bold));

    let doc = Document {
        children: vec![
            Node::block(BlockKind::Paragraph, vec![Node::text("ab", bold)]),
            Node::block(BlockKind::Paragraph, vec![Node::text("cd", MarkSet::new())]),
        ],
    };
    assert!(!active_marks(&doc, &all).contains(&Mark::Bold));

    // Toggling on a mixed selection applies everywhere, so a second query
    // reports it active.
    let (doc, selection) = toggle_mark(&schema, &doc, &all, Mark::Bold).unwrap();
    assert!(active_marks(&doc, &selection).contains(&Mark::Bold));
}

#[test]
fn caret_toggle_leaves_document_unchanged() {
    let schema = Schema::wiki();
    let doc = Document {
        children: vec![Node::paragraph("hello")],
    };
    let caret = Selection::collapsed(Point::new(vec![0, 0], 2));

    let (after, selection) = toggle_mark(&schema, &doc, &caret, Mark::Bold).unwrap();
    assert_eq!(after, doc);
    assert_eq!(selection, caret);
}
