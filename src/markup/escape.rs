//! HTML entity decoding and the escaping rules of both platforms.

const NAMED_ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
];

/// Longest entity body we bother looking at (`#x10FFFF`).
const MAX_ENTITY_LEN: usize = 10;

/// Decode HTML entities in a single pass, so `&amp;lt;` becomes `&lt;`.
///
/// Unknown or malformed entities are kept as written.
pub fn decode_entities(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];

        let decoded = after
            .char_indices()
            .take(MAX_ENTITY_LEN + 1)
            .find(|&(_, c)| c == ';')
            .and_then(|(semi, _)| decode_entity(&after[..semi]).map(|ch| (ch, semi)));

        match decoded {
            Some((ch, semi)) => {
                result.push(ch);
                rest = &after[semi + 1..];
            }
            None => {
                result.push('&');
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}

fn decode_entity(body: &str) -> Option<char> {
    if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).filter(|c| *c != '\0');
    }
    NAMED_ENTITIES
        .iter()
        .find(|(name, _)| *name == body)
        .map(|(_, ch)| *ch)
}

/// Escape text for a Slack message body.
pub fn escape_slack(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape text for HTML element content or a quoted attribute value.
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            c => result.push(c),
        }
    }
    result
}

/// Backslash-escape everything Markdown or inline HTML could act on.
pub fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        if matches!(
            ch,
            '\\' | '`' | '*' | '_' | '~' | '[' | ']' | '(' | ')' | '<' | '>' | '&' | '#' | '!' | '|'
        ) {
            result.push('\\');
        }
        result.push(ch);
    }
    result
}

/// Escape the emphasis and code characters a Markdown renderer would act on.
///
/// Used for text the parser left literal, so a failed delimiter match stays
/// literal after rendering too.
pub fn escape_inline_delimiters(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '`' | '*' | '_' | '~') {
            result.push('\\');
        }
        result.push(ch);
    }
    result
}

/// Escape only what would end a Markdown link label early.
pub fn escape_link_label(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '[' | ']') {
            result.push('\\');
        }
        result.push(ch);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_named() {
        assert_eq!(decode_entities("a &lt;b&gt; &amp; c"), "a <b> & c");
        assert_eq!(decode_entities("&quot;x&quot;"), "\"x\"");
    }

    #[test]
    fn test_decode_single_pass() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_decode_numeric() {
        assert_eq!(decode_entities("&#65;&#x42;"), "AB");
        assert_eq!(decode_entities("&#0;"), "&#0;");
    }

    #[test]
    fn test_decode_keeps_unknown() {
        assert_eq!(decode_entities("fish & chips"), "fish & chips");
        assert_eq!(decode_entities("&bogus; &"), "&bogus; &");
        assert_eq!(decode_entities("&verylongentityname;"), "&verylongentityname;");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">&amp;</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;amp;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_slack() {
        assert_eq!(escape_slack("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("*bob_*"), "\\*bob\\_\\*");
        assert_eq!(escape_markdown("<x>"), "\\<x\\>");
        assert_eq!(escape_markdown("plain name"), "plain name");
    }

    #[test]
    fn test_escape_inline_delimiters() {
        assert_eq!(escape_inline_delimiters("a*b* c_d"), "a\\*b\\* c\\_d");
        assert_eq!(escape_inline_delimiters("[link](x)"), "[link](x)");
    }

    #[test]
    fn test_escape_link_label() {
        assert_eq!(escape_link_label("[a] *b*"), "\\[a\\] *b*");
    }
}
