//! Maps toolbar controls and keyboard shortcuts to editing commands. Each
//! control triggers exactly one command with a fixed target; active state is
//! recomputed from the document on every render and never cached.

use scribe_editor_core::{BlockKind, Mark};

use crate::session::{EditorSession, SessionCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconName {
    Bold,
    Italic,
    Underline,
    CodeXml,
    Heading1,
    Heading2,
    Heading3,
    SquareCode,
    TextQuote,
    ListOrdered,
    List,
}

impl IconName {
    pub fn path(self) -> &'static str {
        match self {
            Self::Bold => "icons/bold.svg",
            Self::Italic => "icons/italic.svg",
            Self::Underline => "icons/underline.svg",
            Self::CodeXml => "icons/code-xml.svg",
            Self::Heading1 => "icons/heading-1.svg",
            Self::Heading2 => "icons/heading-2.svg",
            Self::Heading3 => "icons/heading-3.svg",
            Self::SquareCode => "icons/square-code.svg",
            Self::TextQuote => "icons/text-quote.svg",
            Self::ListOrdered => "icons/list-ordered.svg",
            Self::List => "icons/list.svg",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarAction {
    ToggleMark(Mark),
    SetBlock(BlockKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolbarItem {
    pub id: &'static str,
    pub icon: IconName,
    pub action: ToolbarAction,
}

impl ToolbarItem {
    pub fn command(&self) -> SessionCommand {
        match &self.action {
            ToolbarAction::ToggleMark(mark) => SessionCommand::ToggleMark(mark.clone()),
            ToolbarAction::SetBlock(kind) => SessionCommand::SetBlock(kind.clone()),
        }
    }

    /// Toggle state for the button, computed from the live document.
    pub fn is_active(&self, session: &EditorSession) -> bool {
        match &self.action {
            ToolbarAction::ToggleMark(mark) => session.active_marks().contains(mark),
            ToolbarAction::SetBlock(kind) => session.has_block(kind),
        }
    }
}

/// The editor's toolbar: the mark row followed by the block row.
pub fn default_toolbar() -> Vec<ToolbarItem> {
    vec![
        ToolbarItem {
            id: "bold",
            icon: IconName::Bold,
            action: ToolbarAction::ToggleMark(Mark::Bold),
        },
        ToolbarItem {
            id: "italic",
            icon: IconName::Italic,
            action: ToolbarAction::ToggleMark(Mark::Italic),
        },
        ToolbarItem {
            id: "underlined",
            icon: IconName::Underline,
            action: ToolbarAction::ToggleMark(Mark::Underlined),
        },
        ToolbarItem {
            id: "code",
            icon: IconName::CodeXml,
            action: ToolbarAction::ToggleMark(Mark::Code),
        },
        ToolbarItem {
            id: "heading-one",
            icon: IconName::Heading1,
            action: ToolbarAction::SetBlock(BlockKind::HeadingOne),
        },
        ToolbarItem {
            id: "heading-two",
            icon: IconName::Heading2,
            action: ToolbarAction::SetBlock(BlockKind::HeadingTwo),
        },
        ToolbarItem {
            id: "heading-three",
            icon: IconName::Heading3,
            action: ToolbarAction::SetBlock(BlockKind::HeadingThree),
        },
        ToolbarItem {
            id: "code-block",
            icon: IconName::SquareCode,
            action: ToolbarAction::SetBlock(BlockKind::Code),
        },
        ToolbarItem {
            id: "block-quote",
            icon: IconName::TextQuote,
            action: ToolbarAction::SetBlock(BlockKind::BlockQuote),
        },
        ToolbarItem {
            id: "numbered-list",
            icon: IconName::ListOrdered,
            action: ToolbarAction::SetBlock(BlockKind::NumberedList),
        },
        ToolbarItem {
            id: "bulleted-list",
            icon: IconName::List,
            action: ToolbarAction::SetBlock(BlockKind::BulletedList),
        },
    ]
}

/// A pressed key plus modifier state. `command` is the platform command key
/// on macOS and control elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keystroke {
    pub key: char,
    pub command: bool,
    pub shift: bool,
}

impl Keystroke {
    pub fn mod_key(key: char) -> Self {
        Self {
            key,
            command: true,
            shift: false,
        }
    }

    pub fn plain(key: char) -> Self {
        Self {
            key,
            command: false,
            shift: false,
        }
    }
}

struct Hotkey {
    key: char,
    command: bool,
}

impl Hotkey {
    fn parse(spec: &str) -> Option<Self> {
        let mut command = false;
        let mut key = None;
        for part in spec.split('+') {
            match part {
                "mod" => command = true,
                other => key = other.chars().next(),
            }
        }
        Some(Self { key: key?, command })
    }

    fn matches(&self, keystroke: &Keystroke) -> bool {
        self.key == keystroke.key && self.command == keystroke.command && !keystroke.shift
    }
}

pub const HOTKEY_BINDINGS: &[(&str, ToolbarAction)] = &[
    ("mod+b", ToolbarAction::ToggleMark(Mark::Bold)),
    ("mod+i", ToolbarAction::ToggleMark(Mark::Italic)),
    ("mod+u", ToolbarAction::ToggleMark(Mark::Underlined)),
    ("mod+`", ToolbarAction::ToggleMark(Mark::Code)),
];

/// The action bound to a keystroke, if any. A match means the caller must
/// suppress the default text insertion for that key combination.
pub fn action_for_keystroke(keystroke: &Keystroke) -> Option<ToolbarAction> {
    for (spec, action) in HOTKEY_BINDINGS {
        if Hotkey::parse(spec).is_some_and(|hotkey| hotkey.matches(keystroke)) {
            return Some(action.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mod_hotkeys_map_to_mark_commands() {
        assert_eq!(
            action_for_keystroke(&Keystroke::mod_key('b')),
            Some(ToolbarAction::ToggleMark(Mark::Bold))
        );
        assert_eq!(
            action_for_keystroke(&Keystroke::mod_key('`')),
            Some(ToolbarAction::ToggleMark(Mark::Code))
        );
    }

    #[test]
    fn plain_keys_fall_through_to_text_insertion() {
        assert_eq!(action_for_keystroke(&Keystroke::plain('b')), None);
        let shifted = Keystroke {
            key: 'b',
            command: true,
            shift: true,
        };
        assert_eq!(action_for_keystroke(&shifted), None);
    }

    #[test]
    fn every_control_has_an_icon_asset() {
        for item in default_toolbar() {
            assert!(item.icon.path().ends_with(".svg"), "{}", item.id);
        }
    }

    #[test]
    fn toolbar_covers_every_required_control() {
        let ids: Vec<_> = default_toolbar().iter().map(|item| item.id).collect();
        for id in [
            "bold",
            "italic",
            "underlined",
            "code",
            "heading-one",
            "heading-two",
            "heading-three",
            "block-quote",
            "numbered-list",
            "bulleted-list",
        ] {
            assert!(ids.contains(&id), "missing toolbar control: {id}");
        }
    }
}
