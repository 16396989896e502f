//! Intermediate representation produced by the markup parser.

use crate::markup::spans::ProtectedSpans;
use crate::markup::tokens;

/// Reference to a Slack user or channel awaiting resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub id: String,
    /// Found inside a code span: rendered as a bare name, never as a link.
    pub in_code: bool,
}

/// One piece of parsed markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Markdown text, with Slack delimiters already translated.
    Text(String),
    /// Code span content including its backticks. Opaque to later passes.
    Code(String),
    /// Pre-built Markdown (links). Opaque to later passes.
    Literal(String),
    /// Emphasis marker emitted by a delimiter pass (`**`, `_`, `~~`).
    Delimiter(&'static str),
    Mention(EntityRef),
    Channel(EntityRef),
    ColorStart(String),
    ColorEnd,
}

impl Node {
    /// A text-bearing node with nothing in it.
    pub(crate) fn is_empty(&self) -> bool {
        match self {
            Node::Text(s) | Node::Code(s) | Node::Literal(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// Parse result: the node sequence plus the code spans protected on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup {
    nodes: Vec<Node>,
    protected: ProtectedSpans,
}

impl Markup {
    pub(crate) fn new(nodes: Vec<Node>, protected: ProtectedSpans) -> Self {
        Self {
            nodes: merge_adjacent(nodes),
            protected,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Code spans in the working text after the code passes.
    pub fn protected(&self) -> &ProtectedSpans {
        &self.protected
    }

    /// Every user and channel reference, in order of appearance.
    pub fn entities(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Mention(_) | Node::Channel(_)))
    }

    /// Markdown view with entities still unresolved.
    ///
    /// Mentions and channels are written back as Slack tags and colors as
    /// their markers, so parsing the result again yields the same markup.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Text(s) | Node::Code(s) | Node::Literal(s) => out.push_str(s),
                Node::Delimiter(marker) => out.push_str(marker),
                Node::Mention(r) => {
                    out.push_str("<@");
                    out.push_str(&r.id);
                    out.push('>');
                }
                Node::Channel(r) => {
                    out.push_str("<#");
                    out.push_str(&r.id);
                    out.push('>');
                }
                Node::ColorStart(color) => {
                    out.push_str(tokens::COLOR_OPEN);
                    out.push_str(color);
                    out.push(';');
                }
                Node::ColorEnd => out.push_str(tokens::COLOR_CLOSE),
            }
        }
        out
    }
}

/// Join neighbouring text (or code) nodes and drop empty ones.
fn merge_adjacent(nodes: Vec<Node>) -> Vec<Node> {
    let mut merged: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes.into_iter().filter(|n| !n.is_empty()) {
        match (merged.last_mut(), &node) {
            (Some(Node::Text(prev)), Node::Text(next))
            | (Some(Node::Code(prev)), Node::Code(next)) => {
                prev.push_str(next);
                continue;
            }
            _ => {}
        }
        merged.push(node);
    }
    merged
}
