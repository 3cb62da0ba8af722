//! Pure projection from document nodes to visual elements. Total over every
//! kind: unrecognized block kinds render as a generic container and
//! unrecognized marks as a plain span, so new node types never touch the
//! command engine.

use scribe_editor_core::{BlockKind, Document, Mark, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementTag {
    Blockquote,
    Ul,
    Ol,
    Li,
    H1,
    H2,
    H3,
    Code,
    P,
    Div,
}

impl ElementTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blockquote => "blockquote",
            Self::Ul => "ul",
            Self::Ol => "ol",
            Self::Li => "li",
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::Code => "code",
            Self::P => "p",
            Self::Div => "div",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineTag {
    Strong,
    Em,
    U,
    Code,
    Span,
}

impl InlineTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Em => "em",
            Self::U => "u",
            Self::Code => "code",
            Self::Span => "span",
        }
    }
}

pub fn block_tag(kind: &BlockKind) -> ElementTag {
    match kind {
        BlockKind::Paragraph => ElementTag::P,
        BlockKind::HeadingOne => ElementTag::H1,
        BlockKind::HeadingTwo => ElementTag::H2,
        BlockKind::HeadingThree => ElementTag::H3,
        BlockKind::BlockQuote => ElementTag::Blockquote,
        BlockKind::Code => ElementTag::Code,
        BlockKind::ListItem => ElementTag::Li,
        BlockKind::BulletedList => ElementTag::Ul,
        BlockKind::NumberedList => ElementTag::Ol,
        BlockKind::Other(_) => ElementTag::Div,
    }
}

pub fn mark_tag(mark: &Mark) -> InlineTag {
    match mark {
        Mark::Bold => InlineTag::Strong,
        Mark::Italic => InlineTag::Em,
        Mark::Underlined => InlineTag::U,
        Mark::Code => InlineTag::Code,
        Mark::Other(_) => InlineTag::Span,
    }
}

/// A framework-free element tree, ready for any concrete renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum VisualNode {
    Element {
        tag: ElementTag,
        children: Vec<VisualNode>,
    },
    Leaf {
        text: String,
        wrappers: Vec<InlineTag>,
    },
}

pub fn project(doc: &Document) -> Vec<VisualNode> {
    doc.children.iter().map(project_node).collect()
}

fn project_node(node: &Node) -> VisualNode {
    match node {
        Node::Element(el) => VisualNode::Element {
            tag: block_tag(&el.kind),
            children: el.children.iter().map(project_node).collect(),
        },
        Node::Text(text) => VisualNode::Leaf {
            text: text.text.clone(),
            wrappers: text.marks.iter().map(mark_tag).collect(),
        },
    }
}

pub fn to_html(doc: &Document) -> String {
    let mut out = String::new();
    for node in project(doc) {
        render_visual(&node, &mut out);
    }
    out
}

fn render_visual(node: &VisualNode, out: &mut String) {
    match node {
        VisualNode::Element { tag, children } => {
            out.push('<');
            out.push_str(tag.as_str());
            out.push('>');
            for child in children {
                render_visual(child, out);
            }
            out.push_str("</");
            out.push_str(tag.as_str());
            out.push('>');
        }
        VisualNode::Leaf { text, wrappers } => {
            for tag in wrappers {
                out.push('<');
                out.push_str(tag.as_str());
                out.push('>');
            }
            out.push_str(&escape_html(text));
            for tag in wrappers.iter().rev() {
                out.push_str("</");
                out.push_str(tag.as_str());
                out.push('>');
            }
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_editor_core::MarkSet;

    #[test]
    fn lists_project_to_nested_markup() {
        let doc = Document {
            children: vec![Node::block(
                BlockKind::BulletedList,
                vec![Node::list_item("first"), Node::list_item("second")],
            )],
        };
        assert_eq!(
            to_html(&doc),
            "<ul><li>first</li><li>second</li></ul>"
        );
    }

    #[test]
    fn marks_nest_inside_their_block() {
        let marks: MarkSet = [Mark::Bold, Mark::Italic].into_iter().collect();
        let doc = Document {
            children: vec![Node::block(
                BlockKind::Paragraph,
                vec![Node::text("hi", marks)],
            )],
        };
        assert_eq!(to_html(&doc), "<p><strong><em>hi</em></strong></p>");
    }

    #[test]
    fn unknown_kinds_render_through_the_default_cases() {
        let unknown_mark: MarkSet = [Mark::Other("highlight".into())].into_iter().collect();
        let doc = Document {
            children: vec![Node::block(
                BlockKind::Other("custom-widget".into()),
                vec![Node::text("x", unknown_mark)],
            )],
        };
        assert_eq!(to_html(&doc), "<div><span>x</span></div>");
    }

    #[test]
    fn text_is_escaped() {
        let doc = Document {
            children: vec![Node::paragraph("a < b & c")],
        };
        assert_eq!(to_html(&doc), "<p>a &lt; b &amp; c</p>");
    }
}
