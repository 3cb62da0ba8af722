use scribe_editor_core::{
    ArticleValue, BlockKind, Document, Mark, MarkSet, Node, Point, Schema, Selection, Transaction,
    active_marks, apply, delete_selection, has_block, insert_text, normalize_selection, set_block,
    split_block, toggle_mark,
};
use tracing::{error, warn};

#[derive(Debug, Default)]
pub struct SessionConfig {
    pub max_undo: usize,
}

impl SessionConfig {
    fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = 200;
        }
        self
    }
}

#[derive(Clone)]
struct Snapshot {
    document: Document,
    selection: Selection,
}

/// A discrete edit requested by the toolbar or a keystroke.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    ToggleMark(Mark),
    SetBlock(BlockKind),
    InsertText(String),
    DeleteSelection,
    SplitBlock,
    Undo,
    Redo,
}

/// The single owner of the current `(document, selection)` pair. Every
/// command replaces both wholesale with the engine's result, so a render
/// never observes a half-updated tree.
pub struct EditorSession {
    schema: Schema,
    document: Document,
    selection: Selection,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    config: SessionConfig,
}

impl EditorSession {
    /// An empty session: one empty paragraph with the caret at its start.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            schema: Schema::wiki(),
            document: Document {
                children: vec![Node::paragraph("")],
            },
            selection: Selection::collapsed(Point::new(vec![0, 0], 0)),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            config: config.with_defaults(),
        }
    }

    /// Opens a persisted transport value for editing.
    pub fn from_value(value: ArticleValue) -> Self {
        let mut session = Self::new();
        let document = value.into_document();
        let selection = Selection::collapsed(Point::new(vec![0, 0], 0));

        match apply(&session.schema, &document, &selection, Transaction::default()) {
            Ok((document, selection)) => {
                session.document = document;
                session.selection = selection;
            }
            Err(err) => {
                warn!(error = ?err, "loaded document failed normalization, keeping raw tree");
                session.selection = normalize_selection(&document, &selection);
                session.document = document;
            }
        }
        session
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = normalize_selection(&self.document, &selection);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Marks active across the whole selection, computed on demand.
    pub fn active_marks(&self) -> MarkSet {
        active_marks(&self.document, &self.selection)
    }

    /// Whether the selection sits in a block (or list container) of `kind`.
    pub fn has_block(&self, kind: &BlockKind) -> bool {
        has_block(&self.document, &self.selection, kind)
    }

    pub fn to_value(&self) -> ArticleValue {
        ArticleValue::from_document(&self.document)
    }

    pub fn plain_text(&self) -> String {
        self.document.to_plain_text()
    }

    pub fn command(&mut self, command: SessionCommand) {
        let result = match &command {
            SessionCommand::Undo => {
                self.undo();
                return;
            }
            SessionCommand::Redo => {
                self.redo();
                return;
            }
            SessionCommand::ToggleMark(mark) => {
                toggle_mark(&self.schema, &self.document, &self.selection, mark.clone())
            }
            SessionCommand::SetBlock(kind) => {
                set_block(&self.schema, &self.document, &self.selection, kind.clone())
            }
            SessionCommand::InsertText(text) => {
                insert_text(&self.schema, &self.document, &self.selection, text)
            }
            SessionCommand::DeleteSelection => {
                delete_selection(&self.schema, &self.document, &self.selection)
            }
            SessionCommand::SplitBlock => {
                split_block(&self.schema, &self.document, &self.selection)
            }
        };

        match result {
            Ok((document, selection)) => {
                if document == self.document {
                    self.selection = selection;
                    return;
                }
                self.undo_stack.push(Snapshot {
                    document: std::mem::replace(&mut self.document, document),
                    selection: std::mem::replace(&mut self.selection, selection),
                });
                if self.undo_stack.len() > self.config.max_undo {
                    self.undo_stack.remove(0);
                }
                self.redo_stack.clear();
            }
            Err(err) => {
                // An invariant violation means the command itself is
                // defective; the prior valid document stays in place.
                debug_assert!(false, "command {command:?} failed: {err:?}");
                error!(error = ?err, command = ?command, "command failed, document unchanged");
            }
        }
    }

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(Snapshot {
            document: std::mem::replace(&mut self.document, snapshot.document),
            selection: std::mem::replace(&mut self.selection, snapshot.selection),
        });
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(Snapshot {
            document: std::mem::replace(&mut self.document, snapshot.document),
            selection: std::mem::replace(&mut self.selection, snapshot.selection),
        });
        true
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}
