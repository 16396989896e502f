//! Internal sentinel text used between pipeline stages.
//!
//! Mentions are carried as AST nodes, so the mention sentinel never appears
//! in working text. Its fragments are still scrubbed from anything untrusted
//! so no output body can ever contain one. Color markers are produced by the
//! attachment flattener and consumed by the parser.

/// Opening half of a deferred mention token.
pub const MENTION_OPEN: &str = "ENTITY_MENTION_HACK";
/// Closing half of a deferred mention token. Contains `MENTION_OPEN`.
pub const MENTION_CLOSE: &str = "END_ENTITY_MENTION_HACK";

/// Color marker prefix; the color and a `;` follow.
pub const COLOR_OPEN: &str = ";BEGIN_FONT_COLOR_HACK_";
pub const COLOR_CLOSE: &str = ";END_FONT_COLOR_HACK;";

/// Shared core of both color markers, used to scrub user text.
const COLOR_FRAGMENT: &str = "FONT_COLOR_HACK";

/// Wrap `text` in a color marker pair.
pub fn color_marker(color: &str, text: &str) -> String {
    format!("{}{};{}{}", COLOR_OPEN, color, text, COLOR_CLOSE)
}

/// Remove every mention-token fragment from `text`.
///
/// Removal can splice a new fragment together from the surrounding text,
/// so this repeats until none is left.
pub fn scrub_mention_tokens(text: &str) -> String {
    let mut text = text.to_string();
    while text.contains(MENTION_OPEN) {
        text = text.replace(MENTION_CLOSE, "").replace(MENTION_OPEN, "");
    }
    text
}

/// Remove anything that could be read as a color marker from user text.
pub fn scrub_color_fragments(text: &str) -> String {
    let mut text = text.to_string();
    while text.contains(COLOR_FRAGMENT) {
        text = text.replace(COLOR_FRAGMENT, "");
    }
    text
}

/// Drop complete color markers, keeping the text they wrap.
pub fn strip_color_markers(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    loop {
        let open = rest.find(COLOR_OPEN);
        let close = rest.find(COLOR_CLOSE);
        match (open, close) {
            (Some(o), c) if c.map_or(true, |c| o < c) => {
                result.push_str(&rest[..o]);
                let after = &rest[o + COLOR_OPEN.len()..];
                match after.find(';') {
                    Some(end) => rest = &after[end + 1..],
                    None => {
                        // Unterminated marker, keep it verbatim
                        result.push_str(&rest[o..]);
                        return result;
                    }
                }
            }
            (_, Some(c)) => {
                result.push_str(&rest[..c]);
                rest = &rest[c + COLOR_CLOSE.len()..];
            }
            _ => {
                result.push_str(rest);
                return result;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrub_mention_tokens() {
        let input = "hi ENTITY_MENTION_HACKU1END_ENTITY_MENTION_HACK there";
        assert_eq!(scrub_mention_tokens(input), "hi U1 there");
    }

    #[test]
    fn test_scrub_mention_tokens_nested() {
        let input = "ENTITY_MENENTITY_MENTION_HACKTION_HACKx";
        let output = scrub_mention_tokens(input);
        assert!(!output.contains(MENTION_OPEN));
        assert_eq!(output, "x");
    }

    #[test]
    fn test_scrub_color_fragments() {
        let input = ";BEGIN_FONT_COLOR_HACK_red;x;END_FONT_COLOR_HACK;";
        let output = scrub_color_fragments(input);
        assert!(!output.contains(COLOR_FRAGMENT));
        assert_eq!(strip_color_markers(&output), output);
    }

    #[test]
    fn test_strip_color_markers() {
        let input = format!("{} one\n{} two", color_marker("#ff0000", "●"), "●");
        assert_eq!(strip_color_markers(&input), "● one\n● two");
    }

    #[test]
    fn test_strip_unterminated_marker() {
        let input = "a ;BEGIN_FONT_COLOR_HACK_red";
        assert_eq!(strip_color_markers(input), input);
    }
}
