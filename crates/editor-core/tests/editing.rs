use scribe_editor_core::{
    BlockKind, Document, Mark, MarkSet, Node, Point, Schema, Selection, delete_selection,
    insert_text, split_block,
};

#[test]
fn insert_at_caret_extends_the_surrounding_run() {
    let schema = Schema::wiki();
    let bold: MarkSet = [Mark::Bold].into_iter().collect();
    let doc = Document {
        children: vec![Node::block(BlockKind::Paragraph, vec![Node::text("ab", bold)])],
    };
    let caret = Selection::collapsed(Point::new(vec![0, 0], 1));

    let (doc, selection) = insert_text(&schema, &doc, &caret, "X").unwrap();
    let Node::Element(el) = &doc.children[0] else {
        panic!("expected element");
    };
    assert_eq!(el.children.len(), 1);
    let Node::Text(run) = &el.children[0] else {
        panic!("expected run");
    };
    assert_eq!(run.text, "aXb");
    assert!(run.marks.contains(&Mark::Bold));
    assert_eq!(selection.focus, Point::new(vec![0, 0], 2));
}

#[test]
fn insert_replaces_a_non_collapsed_selection() {
    let schema = Schema::wiki();
    let doc = Document {
        children: vec![Node::paragraph("hello")],
    };
    let selection = Selection {
        anchor: Point::new(vec![0, 0], 1),
        focus: Point::new(vec![0, 0], 4),
    };

    let (doc, selection) = insert_text(&schema, &doc, &selection, "i").unwrap();
    assert_eq!(doc.to_plain_text(), "hio");
    assert_eq!(selection.focus, Point::new(vec![0, 0], 2));
}

#[test]
fn delete_across_blocks_joins_the_boundaries() {
    let schema = Schema::wiki();
    let doc = Document {
        children: vec![Node::paragraph("abc"), Node::paragraph("def")],
    };
    let selection = Selection {
        anchor: Point::new(vec![0, 0], 2),
        focus: Point::new(vec![1, 0], 1),
    };

    let (doc, selection) = delete_selection(&schema, &doc, &selection).unwrap();
    assert_eq!(doc.children.len(), 1);
    assert_eq!(doc.to_plain_text(), "abef");
    assert_eq!(selection.focus, Point::new(vec![0, 0], 2));
    assert!(selection.is_collapsed());
}

#[test]
fn delete_across_a_container_boundary_trims_both_sides() {
    let schema = Schema::wiki();
    let doc = Document {
        children: vec![
            Node::paragraph("abc"),
            Node::block(BlockKind::BulletedList, vec![Node::list_item("xyz")]),
        ],
    };
    let selection = Selection {
        anchor: Point::new(vec![0, 0], 1),
        focus: Point::new(vec![1, 0, 0], 2),
    };

    let (doc, selection) = delete_selection(&schema, &doc, &selection).unwrap();
    assert_eq!(doc.children.len(), 2);
    assert_eq!(doc.to_plain_text(), "a\nz");
    assert_eq!(selection.focus, Point::new(vec![0, 0], 1));
    schema.validate(&doc).unwrap();
}

#[test]
fn split_heading_continues_as_a_paragraph() {
    let schema = Schema::wiki();
    let doc = Document {
        children: vec![Node::block(
            BlockKind::HeadingOne,
            vec![Node::text("Title", MarkSet::new())],
        )],
    };
    let caret = Selection::collapsed(Point::new(vec![0, 0], 5));

    let (doc, selection) = split_block(&schema, &doc, &caret).unwrap();
    assert_eq!(doc.children.len(), 2);
    let Node::Element(first) = &doc.children[0] else {
        panic!("expected element");
    };
    assert_eq!(first.kind, BlockKind::HeadingOne);
    assert_eq!(first.to_plain_text(), "Title");
    let Node::Element(second) = &doc.children[1] else {
        panic!("expected element");
    };
    assert_eq!(second.kind, BlockKind::Paragraph);
    assert_eq!(second.to_plain_text(), "");
    assert_eq!(selection.focus, Point::new(vec![1, 0], 0));
}

#[test]
fn split_list_item_stays_inside_the_container() {
    let schema = Schema::wiki();
    let doc = Document {
        children: vec![Node::block(
            BlockKind::BulletedList,
            vec![Node::list_item("ab")],
        )],
    };
    let caret = Selection::collapsed(Point::new(vec![0, 0, 0], 1));

    let (doc, selection) = split_block(&schema, &doc, &caret).unwrap();
    assert_eq!(doc.children.len(), 1);
    let Node::Element(container) = &doc.children[0] else {
        panic!("expected container");
    };
    assert_eq!(container.children.len(), 2);
    for (item, expected) in container.children.iter().zip(["a", "b"]) {
        let Node::Element(item) = item else {
            panic!("expected list item");
        };
        assert_eq!(item.kind, BlockKind::ListItem);
        assert_eq!(item.to_plain_text(), expected);
    }
    assert_eq!(selection.focus, Point::new(vec![0, 1, 0], 0));
    schema.validate(&doc).unwrap();
}
