//! Matrix HTML back to Slack markup.
//!
//! Only the subset Matrix clients send for ordinary messages is translated.
//! Anything else is dropped down to its text.

use fancy_regex::Regex;
use tracing::debug;

use crate::markup::escape::{decode_entities, escape_slack};
use crate::platform::identity::{IdentityMap, MatrixLink};

/// An element still waiting for its closing tag.
#[derive(Debug, Default)]
struct Frame {
    tag: String,
    href: Option<String>,
    content: String,
}

impl Frame {
    fn open(tag: &str, href: Option<String>) -> Self {
        Self {
            tag: tag.to_string(),
            href,
            content: String::new(),
        }
    }

    fn at_line_start(&self) -> bool {
        self.content.is_empty() || self.content.ends_with('\n')
    }

    fn push_block(&mut self, rendered: &str) {
        if !self.at_line_start() {
            self.content.push('\n');
        }
        self.content.push_str(rendered);
    }
}

/// Converts formatted Matrix bodies into Slack message text.
#[derive(Debug, Clone)]
pub struct ReverseTranslator {
    identity: IdentityMap,
    tag: Regex,
    href: Regex,
    blank_lines: Regex,
}

impl ReverseTranslator {
    pub fn new(identity: IdentityMap) -> Self {
        Self {
            identity,
            tag: Regex::new(r"(?s)<!--.*?-->|<(/?)([a-zA-Z][a-zA-Z0-9-]*)([^>]*)>").unwrap(),
            href: Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).unwrap(),
            blank_lines: Regex::new(r"\n{3,}").unwrap(),
        }
    }

    pub fn translate(&self, html: &str) -> String {
        let mut stack = vec![Frame::default()];
        let mut last = 0;

        for caps in self.tag.captures_iter(html).flatten() {
            let whole = match caps.get(0) {
                Some(whole) => whole,
                None => continue,
            };
            push_text(&mut stack, &html[last..whole.start()]);
            last = whole.end();

            // Comments have no name group
            let name = match caps.get(2) {
                Some(name) => name.as_str().to_lowercase(),
                None => continue,
            };
            let closing = caps.get(1).map_or(false, |m| !m.as_str().is_empty());
            let attrs = caps.get(3).map_or("", |m| m.as_str());

            if closing {
                self.close(&mut stack, &name);
            } else if name == "br" {
                top(&mut stack).content.push('\n');
            } else if !is_void(&name) && !attrs.trim_end().ends_with('/') {
                stack.push(Frame::open(&name, self.href_of(attrs)));
            }
        }
        push_text(&mut stack, &html[last..]);

        // Unclosed elements end with the input
        while stack.len() > 1 {
            self.pop(&mut stack);
        }
        let content = stack.pop().map(|root| root.content).unwrap_or_default();

        let text = self.blank_lines.replace_all(&content, "\n\n").to_string();
        let text = text.trim_start_matches('\n').trim_end().to_string();
        debug!(html = html.len(), text = text.len(), "Translated outbound HTML");
        text
    }

    fn href_of(&self, attrs: &str) -> Option<String> {
        let caps = self.href.captures(attrs).ok().flatten()?;
        let value = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
        Some(decode_entities(value.as_str()))
    }

    fn close(&self, stack: &mut Vec<Frame>, name: &str) {
        let Some(pos) = stack.iter().rposition(|frame| frame.tag == name) else {
            return;
        };
        if pos == 0 {
            return;
        }
        while stack.len() > pos {
            self.pop(stack);
        }
    }

    /// Close the innermost element and hand its rendering to the parent.
    fn pop(&self, stack: &mut Vec<Frame>) {
        let Some(frame) = stack.pop() else {
            return;
        };
        let in_pre = stack.iter().any(|f| f.tag == "pre");
        let parent = top(stack);
        let inner = frame.content.trim();

        match frame.tag.as_str() {
            "strong" | "b" => push_inline(parent, inner, "*"),
            "em" | "i" => push_inline(parent, inner, "_"),
            "del" | "s" | "strike" => push_inline(parent, inner, "~"),
            "code" if in_pre => parent.content.push_str(&frame.content),
            "code" => push_inline(parent, &frame.content, "`"),
            "a" => {
                let link = self.link(frame.href.as_deref(), inner);
                parent.content.push_str(&link);
            }
            "pre" => parent.push_block(&format!("```{}```\n", frame.content.trim_matches('\n'))),
            "p" | "div" if !inner.is_empty() => parent.push_block(&format!("{}\n\n", inner)),
            "li" => parent.push_block(&format!("• {}\n", inner)),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" if !inner.is_empty() => {
                parent.push_block(&format!("*{}*\n", inner))
            }
            "blockquote" if !inner.is_empty() => {
                let quoted: Vec<String> = inner.lines().map(|line| format!("> {}", line)).collect();
                parent.push_block(&format!("{}\n", quoted.join("\n")));
            }
            "ul" | "ol" => parent.push_block(&frame.content),
            "mx-reply" => {}
            "p" | "div" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote" => {}
            _ => parent.content.push_str(&frame.content),
        }
    }

    fn link(&self, href: Option<&str>, text: &str) -> String {
        let Some(href) = href.map(str::trim).filter(|h| !h.is_empty()) else {
            return text.to_string();
        };

        match self.identity.resolve_link(href) {
            Some(MatrixLink::User(id)) => format!("<@{}>", id),
            Some(MatrixLink::Channel(id)) => format!("<#{}>", id),
            Some(MatrixLink::Puppet) => text.to_string(),
            None => {
                let target = escape_slack(href);
                if text.is_empty() || text == target {
                    format!("<{}>", target)
                } else {
                    format!("<{}|{}>", target, text)
                }
            }
        }
    }
}

fn top(stack: &mut [Frame]) -> &mut Frame {
    let last = stack.len() - 1;
    &mut stack[last]
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "br" | "hr" | "img" | "input" | "meta" | "link" | "wbr")
}

/// Append source text to the innermost element.
///
/// Outside `pre`, a newline is layout only: it becomes a space, or nothing
/// at the start of a line.
fn push_text(stack: &mut [Frame], raw: &str) {
    if raw.is_empty() {
        return;
    }
    let in_pre = stack.iter().any(|f| f.tag == "pre");
    let frame = top(stack);
    let text = escape_slack(&decode_entities(raw));

    if in_pre {
        frame.content.push_str(&text);
        return;
    }

    let text = text.replace('\n', " ");
    let text = if frame.at_line_start() {
        text.trim_start()
    } else {
        &text
    };
    frame.content.push_str(text);
}

fn push_inline(parent: &mut Frame, inner: &str, marker: &str) {
    if inner.trim().is_empty() {
        parent.content.push_str(inner);
    } else {
        parent.content.push_str(marker);
        parent.content.push_str(inner);
        parent.content.push_str(marker);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate(html: &str) -> String {
        ReverseTranslator::new(IdentityMap::new(
            "acme",
            "example.org",
            "@alice:example.org",
            "alice",
        ))
        .translate(html)
    }

    #[test]
    fn test_emphasis() {
        assert_eq!(
            translate("<strong>bold</strong> and <em>it</em> and <del>gone</del>"),
            "*bold* and _it_ and ~gone~"
        );
        assert_eq!(translate("<b> x </b><i></i>"), "*x*");
    }

    #[test]
    fn test_paragraphs_and_breaks() {
        assert_eq!(translate("<p>one</p>\n<p>two</p>"), "one\n\ntwo");
        assert_eq!(translate("a<br />b<br/>\nc"), "a\nb\nc");
        assert_eq!(translate("line\ncontinued"), "line continued");
    }

    #[test]
    fn test_links() {
        assert_eq!(
            translate(r#"<a href="https://example.org">site</a>"#),
            "<https://example.org|site>"
        );
        assert_eq!(
            translate(r#"<a href="https://example.org">https://example.org</a>"#),
            "<https://example.org>"
        );
        assert_eq!(
            translate(r#"<a href="https://x.org/?a=1&amp;b=2">q</a>"#),
            "<https://x.org/?a=1&amp;b=2|q>"
        );
        assert_eq!(translate("<a>bare</a>"), "bare");
    }

    #[test]
    fn test_matrix_links() {
        assert_eq!(
            translate(r#"hi <a href="https://matrix.to/#/@slack_acme_u1:example.org">bob</a>"#),
            "hi <@U1>"
        );
        assert_eq!(
            translate(r#"<a href='https://matrix.to/#/#slack_acme_c1:example.org'>#general</a>"#),
            "<#C1>"
        );
        assert_eq!(
            translate(r#"<a href="https://matrix.to/#/@alice:example.org">alice</a>: hi"#),
            "alice: hi"
        );
        assert_eq!(
            translate(r#"<a href="https://matrix.to/#/@carol:other.org">carol</a>"#),
            "<https://matrix.to/#/@carol:other.org|carol>"
        );
    }

    #[test]
    fn test_code() {
        assert_eq!(translate("<code>a &lt; b</code>"), "`a &lt; b`");
        assert_eq!(
            translate("<pre><code class=\"language-rust\">fn main() {\n    x();\n}\n</code></pre>"),
            "```fn main() {\n    x();\n}```"
        );
        assert_eq!(translate("<pre><code>*x*</code></pre>after"), "```*x*```\nafter");
    }

    #[test]
    fn test_lists_and_headings() {
        assert_eq!(
            translate("<h2>Title</h2>\n<ul>\n<li>one</li>\n<li>two</li>\n</ul>"),
            "*Title*\n• one\n• two"
        );
        assert_eq!(translate("<blockquote>\n<p>quoted</p>\n</blockquote>"), "> quoted");
    }

    #[test]
    fn test_reply_fallback_dropped() {
        let html = "<mx-reply><blockquote><a href=\"https://matrix.to/#/!room\">In reply to</a> \
                    earlier</blockquote></mx-reply>my answer";
        assert_eq!(translate(html), "my answer");
    }

    #[test]
    fn test_unknown_tags_keep_text() {
        assert_eq!(translate("<span data-mx-color=\"#f00\">red</span> <font>x</font>"), "red x");
        assert_eq!(translate("<!-- note -->plain &amp; simple"), "plain &amp; simple");
        assert_eq!(translate("a < b"), "a &lt; b");
    }

    #[test]
    fn test_unclosed_and_stray_tags() {
        assert_eq!(translate("<strong>open"), "*open*");
        assert_eq!(translate("stray</em> text"), "stray text");
    }
}
