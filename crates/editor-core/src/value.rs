//! The persisted tree representation of a document:
//! `{"document":{"nodes":[{"object":"block","type":...,"nodes":[...]},
//! {"object":"text","leaves":[{"text":...,"marks":[...]}]}]}}`.
//! Unrecognized node and mark types deserialize without error and
//! re-serialize verbatim.

use serde::{Deserialize, Serialize};

use crate::document::{BlockKind, Document, ElementNode, Node, TextNode};
use crate::marks::Mark;

fn object_document() -> String {
    "document".to_string()
}

fn object_leaf() -> String {
    "leaf".to_string()
}

fn object_mark() -> String {
    "mark".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleValue {
    pub document: TransportDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportDocument {
    #[serde(default = "object_document")]
    pub object: String,
    #[serde(default)]
    pub nodes: Vec<TransportNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "object", rename_all = "lowercase")]
pub enum TransportNode {
    Block {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        nodes: Vec<TransportNode>,
    },
    Inline {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        nodes: Vec<TransportNode>,
    },
    Text {
        #[serde(default)]
        leaves: Vec<TransportLeaf>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportLeaf {
    #[serde(default = "object_leaf")]
    pub object: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<TransportMark>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportMark {
    #[serde(default = "object_mark")]
    pub object: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ArticleValue {
    pub fn from_document(document: &Document) -> Self {
        Self {
            document: TransportDocument {
                object: object_document(),
                nodes: nodes_to_transport(&document.children),
            },
        }
    }

    pub fn into_document(self) -> Document {
        Document {
            children: transport_to_nodes(&self.document.nodes),
        }
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

fn nodes_to_transport(children: &[Node]) -> Vec<TransportNode> {
    let mut out = Vec::new();
    let mut leaves: Vec<TransportLeaf> = Vec::new();

    for node in children {
        match node {
            Node::Text(run) => leaves.push(leaf_from_run(run)),
            Node::Element(el) => {
                flush_leaves(&mut out, &mut leaves);
                out.push(TransportNode::Block {
                    kind: el.kind.as_str().to_string(),
                    nodes: nodes_to_transport(&el.children),
                });
            }
        }
    }

    flush_leaves(&mut out, &mut leaves);
    out
}

fn flush_leaves(out: &mut Vec<TransportNode>, leaves: &mut Vec<TransportLeaf>) {
    if !leaves.is_empty() {
        out.push(TransportNode::Text {
            leaves: std::mem::take(leaves),
        });
    }
}

fn leaf_from_run(run: &TextNode) -> TransportLeaf {
    TransportLeaf {
        object: object_leaf(),
        text: run.text.clone(),
        marks: run
            .marks
            .iter()
            .map(|mark| TransportMark {
                object: object_mark(),
                kind: mark.as_str().to_string(),
            })
            .collect(),
    }
}

fn transport_to_nodes(nodes: &[TransportNode]) -> Vec<Node> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            TransportNode::Block { kind, nodes } | TransportNode::Inline { kind, nodes } => {
                out.push(Node::Element(ElementNode {
                    kind: BlockKind::from(kind.as_str()),
                    children: transport_to_nodes(nodes),
                }));
            }
            TransportNode::Text { leaves } => {
                for leaf in leaves {
                    out.push(Node::Text(TextNode {
                        text: leaf.text.clone(),
                        marks: leaf
                            .marks
                            .iter()
                            .map(|mark| Mark::from(mark.kind.as_str()))
                            .collect(),
                    }));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::MarkSet;

    #[test]
    fn round_trip_preserves_text_and_marks() {
        let marks: MarkSet = [Mark::Bold].into_iter().collect();
        let doc = Document {
            children: vec![Node::block(
                BlockKind::Paragraph,
                vec![Node::text("Hello", marks), Node::text(" world", MarkSet::new())],
            )],
        };

        let value = ArticleValue::from_document(&doc);
        let json = value.to_json_string().expect("serialize");
        let parsed = ArticleValue::from_json_str(&json).expect("deserialize");
        assert_eq!(parsed.into_document(), doc);
    }

    #[test]
    fn unknown_node_type_survives_round_trip() {
        let json = r#"{"document":{"object":"document","nodes":[
            {"object":"block","type":"custom-widget","nodes":[
                {"object":"text","leaves":[{"object":"leaf","text":"x"}]}]}]}}"#;

        let value = ArticleValue::from_json_str(json).expect("deserialize");
        let doc = value.into_document();
        let Node::Element(el) = &doc.children[0] else {
            panic!("expected element");
        };
        assert_eq!(el.kind, BlockKind::Other("custom-widget".to_string()));

        let out = ArticleValue::from_document(&doc)
            .to_json_string()
            .expect("serialize");
        assert!(out.contains("custom-widget"));
    }

    #[test]
    fn plain_body_converts_through_document() {
        let doc = Document::from_plain_text("line one\nline two");
        let value = ArticleValue::from_document(&doc);
        assert_eq!(value.into_document().to_plain_text(), "line one\nline two");
    }
}
