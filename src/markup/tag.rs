//! Grammar of Slack's angle-bracket tags: `<!here>`, `<#C1|general>`,
//! `<@U1>`, `<https://example.org|a link>`.

use fancy_regex::Regex;

/// Scope of a room-wide notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyScope {
    /// `<!channel>` and `<!everyone>`.
    Room,
    /// `<!here>`: only members currently active.
    ActiveMembers,
}

/// What a `!` tag asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Broadcast<'a> {
    Notify(NotifyScope),
    /// Anything else (`<!subteam^S1|@team>`, `<!date^...|fallback>`) is passed
    /// through as text.
    Action {
        payload: &'a str,
        label: Option<&'a str>,
    },
}

/// Matrix spelling of any room-wide notification.
pub const ROOM_NOTIFY: &str = "@room";

impl<'a> Broadcast<'a> {
    /// Text that stands in for the broadcast in both bodies.
    pub fn display(&self) -> &'a str {
        match self {
            Broadcast::Notify(_) => ROOM_NOTIFY,
            Broadcast::Action { payload, label } => label.unwrap_or(*payload),
        }
    }
}

/// Parsed content of one `<...>` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagRef<'a> {
    Broadcast(Broadcast<'a>),
    Channel { id: &'a str, label: Option<&'a str> },
    User { id: &'a str, label: Option<&'a str> },
    Link { url: &'a str, label: Option<&'a str> },
}

impl<'a> TagRef<'a> {
    /// Parse the text between `<` and `>`.
    ///
    /// Returns `None` when there is nothing to refer to (`<@>`, `<|x>`), in
    /// which case the tag stays literal text.
    pub fn parse(content: &'a str) -> Option<Self> {
        let (primary, label) = match content.split_once('|') {
            Some((primary, label)) => (primary, Some(label)),
            None => (content, None),
        };

        let mut chars = primary.chars();
        let tag = match chars.next()? {
            '!' => {
                let payload = chars.as_str();
                if payload.is_empty() {
                    return None;
                }
                let broadcast = match payload.to_lowercase().as_str() {
                    "here" => Broadcast::Notify(NotifyScope::ActiveMembers),
                    "channel" | "everyone" => Broadcast::Notify(NotifyScope::Room),
                    _ => Broadcast::Action { payload, label },
                };
                TagRef::Broadcast(broadcast)
            }
            '#' => TagRef::Channel {
                id: non_empty(chars.as_str())?,
                label,
            },
            '@' => TagRef::User {
                id: non_empty(chars.as_str())?,
                label,
            },
            _ => TagRef::Link {
                url: non_empty(primary)?,
                label,
            },
        };
        Some(tag)
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Matches text shaped like an absolute URI (`scheme:rest`).
pub fn url_shape_pattern() -> Regex {
    Regex::new(r"(?i)^[a-z0-9+.\-]+:[a-z0-9\-._~!$&'()*+,;=:@/?#%\[\]]*$").unwrap()
}

/// Plain-text rendering of a link found inside a code span.
///
/// If the label equals the URL, or the URL is the label with `http://` in
/// front, the label wins. Otherwise a URL-shaped target is shown bare. Any
/// other tag is left as written.
pub fn link_text_in_code<'a>(url: &'a str, label: Option<&'a str>, url_shape: &Regex) -> Option<&'a str> {
    if let Some(label) = label {
        if url == label || url.strip_prefix("http://") == Some(label) {
            return Some(label);
        }
    }
    if url_shape.is_match(url).unwrap_or(false) {
        return Some(url);
    }
    None
}
