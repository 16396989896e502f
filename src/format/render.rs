//! Rendering of resolved markup into the plain and HTML bodies.

use pulldown_cmark::{html, Event, Options, Parser};
use tracing::debug;

use crate::common::messages::Snippet;
use crate::common::types::FileRef;
use crate::format::resolver::{ResolvedEntities, ResolvedEntity};
use crate::markup::escape::{decode_entities, escape_html, escape_inline_delimiters};
use crate::markup::tokens::scrub_mention_tokens;
use crate::markup::{EntityRef, Markup, Node};

/// The three views of one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedBodies {
    /// Markdown-flavoured text with names in place of ids and no colors.
    pub plain_text: String,
    /// Markdown view with entity links and code spans as written.
    pub markdown: String,
    pub html: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Body {
    Plain,
    Markdown,
    /// Markdown handed to the HTML renderer. Code arrives as finished HTML.
    HtmlSource,
}

#[derive(Debug, Clone, Default)]
pub struct RichTextRenderer;

impl RichTextRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, markup: &Markup, entities: &ResolvedEntities) -> RenderedBodies {
        let plain_text = scrub_mention_tokens(&write_body(markup, entities, Body::Plain));
        let markdown = scrub_mention_tokens(&write_body(markup, entities, Body::Markdown));
        let source = write_body(markup, entities, Body::HtmlSource);
        let html = scrub_mention_tokens(&render_html(&source));

        debug!(plain = plain_text.len(), html = html.len(), "Rendered message");
        RenderedBodies {
            plain_text,
            markdown,
            html,
        }
    }

    /// Inline preview for snippet and post files.
    ///
    /// The HTML is built directly; the preview never passes through the
    /// Markdown parser.
    pub fn render_snippet(&self, file: &FileRef) -> Option<Snippet> {
        if !file.has_preview() {
            return None;
        }
        let preview = file.preview.as_deref()?.trim_end();
        let language: String = file
            .filetype
            .as_deref()
            .unwrap_or_default()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
            .collect();

        let fence = fence_for(preview);
        let mut body = format!("{}{}\n{}\n{}", fence, language, preview, fence);
        let class = if language.is_empty() {
            String::new()
        } else {
            format!(" class=\"language-{}\"", language)
        };
        let mut html = format!("<pre><code{}>{}\n</code></pre>", class, escape_html(preview));

        if file.lines_more > 0 {
            body.push_str("\n*truncated*");
            html.push_str("\n<p><em>truncated</em></p>");
        }
        Some(Snippet { body, html })
    }
}

/// A backtick fence longer than any backtick run in `text`.
fn fence_for(text: &str) -> String {
    let longest = text.split(|c| c != '`').map(str::len).max().unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

fn write_body(markup: &Markup, entities: &ResolvedEntities, body: Body) -> String {
    let mut out = String::new();
    // Pieces of the code span being collected for the HTML source
    let mut code: Option<String> = None;

    for node in markup.nodes() {
        if body == Body::HtmlSource {
            if let Some(piece) = code_piece(node, entities) {
                code.get_or_insert_with(String::new).push_str(&piece);
                continue;
            }
            if let Some(span) = code.take() {
                push_code_html(&mut out, &span);
            }
        }

        match (node, body) {
            (Node::Text(s), Body::Plain) | (Node::Literal(s), Body::Plain) => {
                out.push_str(&decode_entities(s))
            }
            (Node::Text(s), _) => out.push_str(&escape_inline_delimiters(s)),
            (Node::Code(s), _) | (Node::Literal(s), _) => out.push_str(s),
            (Node::Delimiter(marker), _) => out.push_str(marker),
            (Node::Mention(entity), _) => {
                out.push_str(&entity_text(entity, entities.user(&entity.id), body))
            }
            (Node::Channel(entity), _) => {
                out.push_str(&entity_text(entity, entities.channel(&entity.id), body))
            }
            (Node::ColorStart(_), Body::Plain) | (Node::ColorEnd, Body::Plain) => {}
            (Node::ColorStart(color), _) => {
                out.push_str(&format!("<font color=\"{}\">", escape_html(color)))
            }
            (Node::ColorEnd, _) => out.push_str("</font>"),
        }
    }
    if let Some(span) = code.take() {
        push_code_html(&mut out, &span);
    }

    out
}

/// Entities in code, and every entity in the plain body, are bare names.
fn entity_text(entity: &EntityRef, resolved: Option<&ResolvedEntity>, body: Body) -> String {
    match resolved {
        None => entity.id.clone(),
        Some(r) if entity.in_code || body == Body::Plain => r.plain.clone(),
        Some(r) => r.rich.clone(),
    }
}

/// Text a node contributes to a code span, or `None` outside code.
fn code_piece(node: &Node, entities: &ResolvedEntities) -> Option<String> {
    match node {
        Node::Code(s) => Some(s.clone()),
        Node::Mention(entity) if entity.in_code => {
            Some(entity_text(entity, entities.user(&entity.id), Body::Plain))
        }
        Node::Channel(entity) if entity.in_code => {
            Some(entity_text(entity, entities.channel(&entity.id), Body::Plain))
        }
        _ => None,
    }
}

/// Write a run of code spans, backticks included, as HTML the Markdown
/// parser keeps.
///
/// Code text is decoded, so it must never reach the parser as source: a
/// blank line or a block marker inside it would end the span and expose the
/// rest as markup.
fn push_code_html(out: &mut String, run: &str) {
    let mut rest = run;
    while !rest.is_empty() {
        if let Some(block) = rest.strip_prefix("```\n") {
            let (content, after) = match block.find("```") {
                Some(end) => (&block[..end], &block[end + 3..]),
                None => (block, ""),
            };
            let content = content.strip_suffix('\n').unwrap_or(content);
            // A `<pre>` HTML block must start a line and runs up to `</pre>`
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("<pre><code>");
            out.push_str(&escape_html(content));
            out.push_str("\n</code></pre>\n");
            rest = after;
            continue;
        }

        let inner = rest.strip_prefix('`').unwrap_or(rest);
        let (content, after) = match inner.find('`') {
            Some(end) => (&inner[..end], &inner[end + 1..]),
            None => (inner, ""),
        };
        out.push_str("<code>");
        out.push_str(&inline_code_html(content));
        out.push_str("</code>");
        rest = after;
    }
}

/// Inline code content that comes out of Markdown parsing unchanged.
///
/// ASCII punctuation is written as character references, which never act as
/// syntax, and line breaks become `<br />` so the span stays on one line.
fn inline_code_html(content: &str) -> String {
    let mut out = String::with_capacity(content.len() * 2);
    for ch in content.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\n' => out.push_str("<br />"),
            '\r' => {}
            c if c.is_ascii_punctuation() => out.push_str(&format!("&#{};", u32::from(c))),
            c => out.push(c),
        }
    }
    out
}

/// Markdown to HTML, with every line break kept.
pub fn render_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::resolver::EntityResolver;
    use crate::markup::tokens::color_marker;
    use crate::markup::MarkupParser;
    use crate::platform::{IdentityMap, StaticDirectory};

    fn render(input: &str) -> RenderedBodies {
        let markup = MarkupParser::new().parse(input);
        let directory = StaticDirectory::new("U0SELF")
            .with_user("U1", "bob_smith", None)
            .with_channel("C1", "general");
        let resolver = EntityResolver::new(IdentityMap::new(
            "acme",
            "example.org",
            "@alice:example.org",
            "alice",
        ));
        let entities = tokio_test::block_on(resolver.resolve(&markup, &directory)).unwrap();
        RichTextRenderer::new().render(&markup, &entities)
    }

    #[test]
    fn test_inline_code_scenario() {
        let bodies = render("`code`");
        assert_eq!(bodies.plain_text, "`code`");
        assert_eq!(bodies.markdown, "`code`");
        assert_eq!(bodies.html, "<p><code>code</code></p>");

        let bodies = render("`*x*`");
        assert_eq!(bodies.html, "<p><code>*x*</code></p>");
    }

    #[test]
    fn test_emphasis_html() {
        let bodies = render("*bold* _it_ ~gone~");
        assert_eq!(bodies.plain_text, "**bold** _it_ ~~gone~~");
        assert_eq!(
            bodies.html,
            "<p><strong>bold</strong> <em>it</em> <del>gone</del></p>"
        );
    }

    #[test]
    fn test_literal_delimiters_stay_literal() {
        let bodies = render("foo*bar*baz snake_case_name");
        assert_eq!(bodies.plain_text, "foo*bar*baz snake_case_name");
        assert_eq!(bodies.html, "<p>foo*bar*baz snake_case_name</p>");
    }

    #[test]
    fn test_mentions_split_between_bodies() {
        let bodies = render("hi <@U1> see <#C1>");
        assert_eq!(bodies.plain_text, "hi bob_smith see #general");
        assert_eq!(
            bodies.html,
            "<p>hi <a href=\"https://matrix.to/#/@slack_acme_u1:example.org\">bob_smith</a> \
             see <a href=\"https://matrix.to/#/#slack_acme_c1:example.org\">#general</a></p>"
        );
    }

    #[test]
    fn test_mention_in_code_is_bare_name() {
        let bodies = render("`<@U1>`");
        assert_eq!(bodies.plain_text, "`bob_smith`");
        assert_eq!(bodies.html, "<p><code>bob_smith</code></p>");
    }

    #[test]
    fn test_unknown_mention_keeps_id() {
        let bodies = render("<@U404>");
        assert_eq!(bodies.plain_text, "U404");
        assert_eq!(bodies.html, "<p>U404</p>");
    }

    #[test]
    fn test_color_marker_symmetry() {
        let input = format!("{} build passed", color_marker("#2eb886", "●"));
        let bodies = render(&input);
        assert_eq!(bodies.plain_text, "● build passed");
        assert!(bodies.html.contains("<font color=\"#2eb886\">●</font>"));
        assert_eq!(bodies.html.matches("<font").count(), bodies.html.matches("</font>").count());
        assert!(!bodies.plain_text.contains("FONT_COLOR_HACK"));
        assert!(!bodies.plain_text.contains("<font"));
    }

    #[test]
    fn test_line_breaks_kept() {
        let bodies = render("one\ntwo");
        assert_eq!(bodies.html, "<p>one<br />\ntwo</p>");
    }

    #[test]
    fn test_plain_text_decodes_entities() {
        let bodies = render("a &lt;b&gt; &amp; c");
        assert_eq!(bodies.plain_text, "a <b> & c");
        assert_eq!(bodies.html, "<p>a &lt;b&gt; &amp; c</p>");
    }

    #[test]
    fn test_links() {
        let bodies = render("<https://example.org|site>");
        assert_eq!(bodies.plain_text, "[site](https://example.org)");
        assert_eq!(bodies.html, "<p><a href=\"https://example.org\">site</a></p>");
    }

    #[test]
    fn test_render_snippet() {
        let renderer = RichTextRenderer::new();
        let file = FileRef {
            name: "main.rs".into(),
            mode: Some("snippet".into()),
            filetype: Some("rust".into()),
            preview: Some("fn main() {}\n".into()),
            lines_more: 3,
            ..Default::default()
        };
        let snippet = renderer.render_snippet(&file).unwrap();
        assert_eq!(snippet.body, "```rust\nfn main() {}\n```\n*truncated*");
        assert!(snippet.html.starts_with("<pre><code class=\"language-rust\">"));
        assert!(snippet.html.ends_with("<p><em>truncated</em></p>"));

        let hosted = FileRef {
            mode: Some("hosted".into()),
            ..file
        };
        assert!(renderer.render_snippet(&hosted).is_none());
    }

    #[test]
    fn test_code_spans_cannot_carry_markup() {
        let bodies = render("`x\n\n&lt;img src=x onerror=alert(1)&gt;`");
        assert_eq!(
            bodies.html,
            "<p><code>x<br /><br />&lt;img src=x onerror=alert(1)&gt;</code></p>"
        );

        let bodies = render("```&lt;script&gt;alert(1)&lt;/script&gt;\n\n&lt;img src=x&gt;```");
        assert_eq!(
            bodies.html,
            "<pre><code>&lt;script&gt;alert(1)&lt;/script&gt;\n\n&lt;img src=x&gt;\n</code></pre>"
        );

        for input in [
            "`x\n\n&lt;img src=x onerror=alert(1)&gt;`",
            "`a\n&lt;script&gt;alert(1)&lt;/script&gt;`",
            "`x\n# &lt;img src=x&gt;`",
            "`x\n- &lt;img src=x&gt;`",
            "`x\n&lt;div&gt;\n\n&lt;img src=x&gt;`",
            "before ```&lt;script&gt;x&lt;/script&gt;``` after",
        ] {
            let bodies = render(input);
            assert!(!bodies.html.contains("<img"), "{}", bodies.html);
            assert!(!bodies.html.contains("<script"), "{}", bodies.html);
            assert!(!bodies.html.contains("<div"), "{}", bodies.html);
        }
    }

    #[test]
    fn test_adjacent_code_spans_stay_apart() {
        assert_eq!(render("`a``b`").html, "<p><code>a</code><code>b</code></p>");
        assert_eq!(
            render("```x``````y```").html,
            "<pre><code>x\n</code></pre>\n<pre><code>y\n</code></pre>"
        );
        assert_eq!(
            render("`<@U1>``c`").html,
            "<p><code>bob_smith</code><code>c</code></p>"
        );
    }

    #[test]
    fn test_code_block_between_text() {
        let bodies = render("before ```x``` after");
        assert_eq!(bodies.plain_text, "before ```\nx\n``` after");
        assert!(bodies.html.contains("<pre><code>x\n</code></pre>"));
        assert!(bodies.html.ends_with("<p>after</p>"));
    }

    #[test]
    fn test_nested_emphasis_html() {
        assert_eq!(render("*_x_*").html, "<p><strong><em>x</em></strong></p>");
        assert_eq!(render("~*x*~").html, "<p><del><strong>x</strong></del></p>");
    }

    #[test]
    fn test_snippet_preview_cannot_close_fence() {
        let file = FileRef {
            name: "notes.md".into(),
            mode: Some("snippet".into()),
            filetype: Some("markdown\"><img".into()),
            preview: Some("```\n<img src=x>\n".into()),
            ..Default::default()
        };
        let snippet = RichTextRenderer::new().render_snippet(&file).unwrap();
        assert_eq!(snippet.body, "````markdownimg\n```\n<img src=x>\n````");
        assert_eq!(
            snippet.html,
            "<pre><code class=\"language-markdownimg\">```\n&lt;img src=x&gt;\n</code></pre>"
        );
        assert!(!snippet.html.contains("<img"));
    }
}
