use scribe_editor::{EditorSession, SessionCommand, default_toolbar, to_html};
use scribe_editor_core::{ArticleValue, BlockKind, Mark, Point, Selection};

#[test]
fn new_session_starts_with_one_empty_paragraph() {
    let session = EditorSession::new();
    assert_eq!(session.document().children.len(), 1);
    assert_eq!(session.plain_text(), "");
    assert_eq!(session.selection().focus, Point::new(vec![0, 0], 0));
}

#[test]
fn commands_replace_state_and_undo_restores_it() {
    let mut session = EditorSession::new();
    session.command(SessionCommand::InsertText("Hello world".to_string()));
    assert_eq!(session.plain_text(), "Hello world");

    session.set_selection(Selection {
        anchor: Point::new(vec![0, 0], 0),
        focus: Point::new(vec![0, 0], 5),
    });
    session.command(SessionCommand::ToggleMark(Mark::Bold));
    assert!(session.active_marks().contains(&Mark::Bold));

    assert!(session.can_undo());
    session.command(SessionCommand::Undo);
    assert!(!session.active_marks().contains(&Mark::Bold));
    assert_eq!(session.plain_text(), "Hello world");

    assert!(session.can_redo());
    session.command(SessionCommand::Redo);
    assert!(session.active_marks().contains(&Mark::Bold));
}

#[test]
fn toolbar_buttons_reflect_and_change_block_state() {
    let mut session = EditorSession::new();
    session.command(SessionCommand::InsertText("item".to_string()));

    let toolbar = default_toolbar();
    let bulleted = toolbar
        .iter()
        .find(|item| item.id == "bulleted-list")
        .expect("bulleted-list control");

    assert!(!bulleted.is_active(&session));
    session.command(bulleted.command());
    assert!(bulleted.is_active(&session));
    assert!(session.has_block(&BlockKind::BulletedList));

    // Pressing the same control again un-lists the block.
    session.command(bulleted.command());
    assert!(!bulleted.is_active(&session));
    assert!(session.has_block(&BlockKind::Paragraph));
}

#[test]
fn session_round_trips_through_the_transport_value() {
    let json = r#"{"document":{"object":"document","nodes":[
        {"object":"block","type":"heading-one","nodes":[
            {"object":"text","leaves":[{"object":"leaf","text":"Seed"}]}]}]}}"#;
    let value = ArticleValue::from_json_str(json).unwrap();

    let session = EditorSession::from_value(value);
    assert_eq!(session.plain_text(), "Seed");
    assert!(to_html(session.document()).starts_with("<h1>"));

    let out = session.to_value().to_json_string().unwrap();
    assert!(out.contains("heading-one"));
    assert!(out.contains("Seed"));
}

#[test]
fn split_block_command_breaks_the_line() {
    let mut session = EditorSession::new();
    session.command(SessionCommand::InsertText("ab".to_string()));
    session.set_selection(Selection::collapsed(Point::new(vec![0, 0], 1)));
    session.command(SessionCommand::SplitBlock);

    assert_eq!(session.plain_text(), "a\nb");
    assert_eq!(session.selection().focus, Point::new(vec![1, 0], 0));
}
