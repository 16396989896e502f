//! Emoji shortcodes and broadcast aliases.

use fancy_regex::Regex;

use crate::common::NotifyMode;
use crate::markup::tag::ROOM_NOTIFY;

/// Slack emoji names rewritten to the names the emoji table knows.
/// Skin tones have no shortcode of their own and map straight to the modifier.
const REMAPS: &[(&str, &str)] = &[
    (":+1:", ":thumbsup:"),
    (":-1:", ":thumbsdown:"),
    (":facepunch:", ":punch:"),
    (":hankey:", ":poop:"),
    (":skin-tone-2:", "\u{1F3FB}"),
    (":skin-tone-3:", "\u{1F3FC}"),
    (":skin-tone-4:", "\u{1F3FD}"),
    (":skin-tone-5:", "\u{1F3FE}"),
    (":skin-tone-6:", "\u{1F3FF}"),
];

/// Emoji and alias substitutions applied around the markup parser.
#[derive(Debug, Clone)]
pub struct Normalizer {
    room_notify: Regex,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            room_notify: Regex::new(&format!(r"(?<![\w@]){}(?!\w)", ROOM_NOTIFY)).unwrap(),
        }
    }

    /// Inbound: remap table first, then `:shortcode:` expansion.
    ///
    /// Broadcast tags are left alone here; the parser turns them into
    /// `@room` once tags are tokenized.
    pub fn normalize(&self, text: &str) -> String {
        let remapped = REMAPS
            .iter()
            .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to));
        expand_shortcodes(&remapped)
    }

    /// Outbound: turn `@room` back into the Slack broadcast for `mode`.
    pub fn alias_outbound(&self, text: &str, mode: NotifyMode) -> String {
        self.room_notify
            .replace_all(text, mode.slack_token())
            .to_string()
    }
}

fn is_shortcode_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '+')
}

/// Replace known `:shortcode:` sequences with their emoji.
///
/// An unknown code is kept as written and its closing colon may open the
/// next code, so `:nope:smile:` still finds the smile.
fn expand_shortcodes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find(':') {
        result.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let len = after
            .find(|c: char| !is_shortcode_char(c))
            .unwrap_or(after.len());
        let code = &after[..len];

        if !code.is_empty() && after[len..].starts_with(':') {
            if let Some(emoji) = emojis::get_by_shortcode(&code.to_lowercase()) {
                result.push_str(emoji.as_str());
                rest = &after[len + 1..];
                continue;
            }
        }

        result.push(':');
        result.push_str(code);
        rest = &after[len..];
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_known_shortcodes() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.normalize("hi :smile:"), "hi 😄");
        assert_eq!(normalizer.normalize(":SMILE:"), "😄");
    }

    #[test]
    fn test_remap_table() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.normalize(":+1: :+1:"), "👍 👍");
        assert_eq!(normalizer.normalize(":-1:"), "👎");
        assert_eq!(normalizer.normalize(":facepunch:"), "👊");
        assert_eq!(normalizer.normalize(":hankey:"), "💩");
    }

    #[test]
    fn test_skin_tones() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.normalize(":wave::skin-tone-3:"), "👋\u{1F3FC}");
    }

    #[test]
    fn test_unknown_shortcodes_kept() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.normalize(":not_an_emoji:"), ":not_an_emoji:");
        assert_eq!(normalizer.normalize(":nope:smile:"), ":nope😄");
        assert_eq!(normalizer.normalize("10:30 and ::"), "10:30 and ::");
        assert_eq!(normalizer.normalize("trailing:"), "trailing:");
    }

    #[test]
    fn test_colons_in_urls_survive() {
        let normalizer = Normalizer::new();
        let text = "<https://example.org:8080/a|site>";
        assert_eq!(normalizer.normalize(text), text);
    }

    #[test]
    fn test_alias_outbound() {
        let normalizer = Normalizer::new();
        assert_eq!(
            normalizer.alias_outbound("@room look", NotifyMode::Channel),
            "<!channel> look"
        );
        assert_eq!(
            normalizer.alias_outbound("hey @room!", NotifyMode::OnlyActive),
            "hey <!here>!"
        );
        assert_eq!(
            normalizer.alias_outbound("@roomy bob@room", NotifyMode::Channel),
            "@roomy bob@room"
        );
    }
}
