//! Slack markup to Markdown.
//!
//! Passes run in a fixed order: block code, inline code, tags, then bold,
//! italic and strikethrough. Code spans are rewritten by index and recorded
//! as protected spans; everything after works on nodes, so a later pass never
//! re-reads what an earlier one produced.

use fancy_regex::Regex;
use tracing::debug;

use crate::markup::ast::{EntityRef, Markup, Node};
use crate::markup::escape::{decode_entities, escape_link_label};
use crate::markup::spans::{ProtectedSpans, Splice};
use crate::markup::tag::{link_text_in_code, url_shape_pattern, TagRef};
use crate::markup::tokens;

/// A guarded emphasis style: the Slack delimiter and its Markdown marker.
#[derive(Debug, Clone, Copy)]
struct Emphasis {
    delimiter: char,
    marker: &'static str,
}

const EMPHASIS_PASSES: [Emphasis; 3] = [
    Emphasis {
        delimiter: '*',
        marker: "**",
    },
    Emphasis {
        delimiter: '_',
        marker: "_",
    },
    Emphasis {
        delimiter: '~',
        marker: "~~",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeKind {
    Block,
    Inline,
}

/// Converts Slack message markup into [`Markup`].
#[derive(Debug, Clone)]
pub struct MarkupParser {
    block_code: Regex,
    inline_code: Regex,
    /// Color markers and angle-bracket tags, tokenized together.
    tag: Regex,
    url_shape: Regex,
}

impl Default for MarkupParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupParser {
    pub fn new() -> Self {
        Self {
            block_code: Regex::new(r"```([^`]+)```").unwrap(),
            inline_code: Regex::new(r"`([^`]+)`").unwrap(),
            tag: Regex::new(r";BEGIN_FONT_COLOR_HACK_([^;]*);|;END_FONT_COLOR_HACK;|<([^>]+)>")
                .unwrap(),
            url_shape: url_shape_pattern(),
        }
    }

    /// Parse one message. Never fails: anything unrecognised stays literal.
    pub fn parse(&self, text: &str) -> Markup {
        let text = tokens::scrub_mention_tokens(text);

        let (text, spans) = self.protect_code(&text, ProtectedSpans::new(), CodeKind::Block);
        let (text, spans) = self.protect_code(&text, spans, CodeKind::Inline);

        let mut nodes = self.tokenize(&text, &spans);
        for emphasis in &EMPHASIS_PASSES {
            nodes = apply_emphasis(nodes, emphasis);
        }

        debug!(protected = spans.len(), nodes = nodes.len(), "Parsed markup");
        Markup::new(nodes, spans)
    }

    /// Rewrite every code match outside existing protected spans.
    fn protect_code(
        &self,
        text: &str,
        spans: ProtectedSpans,
        kind: CodeKind,
    ) -> (String, ProtectedSpans) {
        let pattern = match kind {
            CodeKind::Block => &self.block_code,
            CodeKind::Inline => &self.inline_code,
        };

        let mut splices = Vec::new();
        for segment in spans.segments(text.len()) {
            if segment.protected {
                continue;
            }
            let base = segment.range.start;
            for caps in pattern.captures_iter(&text[segment.range]).flatten() {
                let (whole, payload) = match (caps.get(0), caps.get(1)) {
                    (Some(whole), Some(payload)) => (whole, payload),
                    _ => continue,
                };
                let payload = tokens::scrub_mention_tokens(&decode_entities(payload.as_str()));
                let replacement = match kind {
                    CodeKind::Block => format!("```\n{}\n```", payload.trim()),
                    CodeKind::Inline => format!("`{}`", payload),
                };
                splices.push(Splice {
                    range: base + whole.start()..base + whole.end(),
                    replacement,
                });
            }
        }

        if splices.is_empty() {
            return (text.to_string(), spans);
        }
        debug!(kind = ?kind, count = splices.len(), "Protected code spans");
        spans.splice(text, splices)
    }

    /// Split the working text into nodes, resolving tags and color markers.
    fn tokenize(&self, text: &str, spans: &ProtectedSpans) -> Vec<Node> {
        let mut nodes = Vec::new();

        for segment in spans.segments(text.len()) {
            let slice = &text[segment.range];
            let in_code = segment.protected;
            let mut last = 0;

            for caps in self.tag.captures_iter(slice).flatten() {
                let whole = match caps.get(0) {
                    Some(whole) => whole,
                    None => continue,
                };
                nodes.push(run(&slice[last..whole.start()], in_code));

                if let Some(content) = caps.get(2) {
                    nodes.push(self.tag_node(content.as_str(), whole.as_str(), in_code));
                } else if in_code {
                    // A marker swallowed by a code span is dropped
                } else if let Some(color) = caps.get(1) {
                    nodes.push(Node::ColorStart(color.as_str().to_string()));
                } else {
                    nodes.push(Node::ColorEnd);
                }
                last = whole.end();
            }
            nodes.push(run(&slice[last..], in_code));
        }

        nodes
    }

    fn tag_node(&self, content: &str, raw: &str, in_code: bool) -> Node {
        let tag = match TagRef::parse(content) {
            Some(tag) => tag,
            None => return run(raw, in_code),
        };

        match tag {
            TagRef::Broadcast(broadcast) => {
                debug!(broadcast = ?broadcast, "Broadcast tag");
                run(broadcast.display(), in_code)
            }
            TagRef::User { id, .. } => Node::Mention(EntityRef {
                id: id.to_string(),
                in_code,
            }),
            TagRef::Channel { id, .. } => Node::Channel(EntityRef {
                id: id.to_string(),
                in_code,
            }),
            TagRef::Link { url, label } if in_code => {
                run(link_text_in_code(url, label, &self.url_shape).unwrap_or(raw), true)
            }
            TagRef::Link { url, label } => {
                let label = label.filter(|l| !l.trim().is_empty()).unwrap_or(url);
                Node::Literal(markdown_link(url, label))
            }
        }
    }
}

fn is_emphasis_delimiter(c: char) -> bool {
    EMPHASIS_PASSES.iter().any(|e| e.delimiter == c)
}

fn run(text: &str, in_code: bool) -> Node {
    if in_code {
        Node::Code(text.to_string())
    } else {
        Node::Text(text.to_string())
    }
}

fn markdown_link(url: &str, label: &str) -> String {
    if url.contains(|c: char| c.is_whitespace() || c == '(' || c == ')') {
        format!("[{}](<{}>)", escape_link_label(label), url)
    } else {
        format!("[{}]({})", escape_link_label(label), url)
    }
}

/// Unit seen by an emphasis pass: a character of text, or an opaque node.
#[derive(Debug)]
enum Atom {
    Char(char),
    Opaque(Node),
}

impl Atom {
    fn is(&self, delimiter: char) -> bool {
        matches!(self, Atom::Char(c) if *c == delimiter)
    }

    /// Whether a neighbour lets `delimiter` open or close emphasis.
    ///
    /// Whitespace and absent neighbours do, and so do the markers of other
    /// styles, so `*_x_*` nests. Code, links and entities never do.
    fn is_boundary(atom: Option<&Atom>, delimiter: char) -> bool {
        match atom {
            None => true,
            Some(Atom::Char(c)) => c.is_whitespace() || (*c != delimiter && is_emphasis_delimiter(*c)),
            Some(Atom::Opaque(Node::Delimiter(_))) => true,
            Some(Atom::Opaque(_)) => false,
        }
    }
}

/// Accumulates atoms back into nodes.
#[derive(Default)]
struct NodeBuilder {
    nodes: Vec<Node>,
    text: String,
}

impl NodeBuilder {
    fn push_atom(&mut self, atom: &Atom) {
        match atom {
            Atom::Char(c) => self.text.push(*c),
            Atom::Opaque(node) => self.push_node(node.clone()),
        }
    }

    fn push_node(&mut self, node: Node) {
        if !self.text.is_empty() {
            self.nodes.push(Node::Text(std::mem::take(&mut self.text)));
        }
        self.nodes.push(node);
    }

    fn finish(mut self) -> Vec<Node> {
        if !self.text.is_empty() {
            self.nodes.push(Node::Text(self.text));
        }
        self.nodes
    }
}

/// One delimiter pass with the whitespace guard.
///
/// A match is a delimiter, at least one atom, and the next delimiter. It is
/// only turned into emphasis when both outside neighbours are boundaries;
/// otherwise the matched atoms are kept as they were and scanning
/// resumes after the closing delimiter.
fn apply_emphasis(nodes: Vec<Node>, emphasis: &Emphasis) -> Vec<Node> {
    let atoms: Vec<Atom> = nodes
        .into_iter()
        .flat_map(|node| match node {
            Node::Text(s) => s.chars().map(Atom::Char).collect::<Vec<_>>(),
            other => vec![Atom::Opaque(other)],
        })
        .collect();

    let mut out = NodeBuilder::default();
    let mut i = 0;

    while i < atoms.len() {
        if !atoms[i].is(emphasis.delimiter) {
            out.push_atom(&atoms[i]);
            i += 1;
            continue;
        }

        let close = (i + 1..atoms.len()).find(|&j| atoms[j].is(emphasis.delimiter));
        match close {
            Some(j) if j > i + 1 => {
                let guarded =
                    Atom::is_boundary(i.checked_sub(1).map(|k| &atoms[k]), emphasis.delimiter)
                        && Atom::is_boundary(atoms.get(j + 1), emphasis.delimiter);
                if guarded {
                    out.push_node(Node::Delimiter(emphasis.marker));
                    atoms[i + 1..j].iter().for_each(|a| out.push_atom(a));
                    out.push_node(Node::Delimiter(emphasis.marker));
                } else {
                    atoms[i..=j].iter().for_each(|a| out.push_atom(a));
                }
                i = j + 1;
            }
            _ => {
                out.push_atom(&atoms[i]);
                i += 1;
            }
        }
    }

    out.finish()
}
