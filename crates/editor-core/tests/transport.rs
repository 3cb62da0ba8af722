use scribe_editor_core::{
    ArticleValue, BlockKind, Document, Mark, Node, Point, Schema, Selection, Transaction, apply,
};

#[test]
fn document_round_trips_through_the_transport_value() {
    let doc = Document {
        children: vec![
            Node::block(
                BlockKind::HeadingOne,
                vec![Node::text("Title", [Mark::Bold].into_iter().collect())],
            ),
            Node::block(
                BlockKind::BulletedList,
                vec![Node::list_item("a"), Node::list_item("b")],
            ),
        ],
    };

    let json = ArticleValue::from_document(&doc).to_json_string().unwrap();
    let parsed = ArticleValue::from_json_str(&json).unwrap();
    assert_eq!(parsed.into_document(), doc);
}

#[test]
fn unknown_node_type_deserializes_and_reserializes_verbatim() {
    let json = r#"{"document":{"object":"document","nodes":[
        {"object":"block","type":"custom-widget","nodes":[
            {"object":"text","leaves":[
                {"object":"leaf","text":"payload",
                 "marks":[{"object":"mark","type":"sparkle"}]}]}]},
        {"object":"block","type":"paragraph","nodes":[
            {"object":"text","leaves":[{"object":"leaf","text":"plain"}]}]}]}}"#;

    let value = ArticleValue::from_json_str(json).expect("unknown types must not fail");
    let doc = value.into_document();

    let Node::Element(widget) = &doc.children[0] else {
        panic!("expected element");
    };
    assert_eq!(widget.kind, BlockKind::Other("custom-widget".to_string()));
    let Node::Text(run) = &widget.children[0] else {
        panic!("expected run");
    };
    assert!(run.marks.contains(&Mark::Other("sparkle".to_string())));

    let out = ArticleValue::from_document(&doc).to_json_string().unwrap();
    assert!(out.contains("\"custom-widget\""));
    assert!(out.contains("\"sparkle\""));
}

#[test]
fn empty_transport_value_normalizes_to_one_paragraph() {
    let schema = Schema::wiki();
    let value = ArticleValue::from_json_str(r#"{"document":{"nodes":[]}}"#).unwrap();
    let doc = value.into_document();
    assert!(doc.children.is_empty());

    let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
    let (doc, selection) = apply(&schema, &doc, &selection, Transaction::default()).unwrap();
    assert_eq!(doc.children.len(), 1);
    let Node::Element(el) = &doc.children[0] else {
        panic!("expected paragraph");
    };
    assert_eq!(el.kind, BlockKind::Paragraph);
    assert_eq!(selection.focus, Point::new(vec![0, 0], 0));
}

#[test]
fn loaded_list_items_keep_their_containers() {
    let json = r#"{"document":{"object":"document","nodes":[
        {"object":"block","type":"numbered-list","nodes":[
            {"object":"block","type":"list-item","nodes":[
                {"object":"text","leaves":[{"object":"leaf","text":"one"}]}]},
            {"object":"block","type":"list-item","nodes":[
                {"object":"text","leaves":[{"object":"leaf","text":"two"}]}]}]}]}}"#;

    let schema = Schema::wiki();
    let doc = ArticleValue::from_json_str(json).unwrap().into_document();
    let selection = Selection::collapsed(Point::new(vec![0, 0, 0], 0));
    let (doc, _) = apply(&schema, &doc, &selection, Transaction::default()).unwrap();

    schema.validate(&doc).unwrap();
    assert_eq!(doc.to_plain_text(), "one\ntwo");
}
