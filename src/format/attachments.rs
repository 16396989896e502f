//! Flattening of Slack attachments into message markup.
//!
//! The output is Slack markup, not rendered text: it is appended to the
//! message body and parsed with it.

use tracing::debug;

use crate::common::Attachment;
use crate::markup::tokens::{color_marker, scrub_color_fragments};

/// Glyph that starts every attachment entry.
pub const BULLET: &str = "●";

/// Slack's named attachment colors.
const NAMED_COLORS: &[(&str, &str)] = &[
    ("good", "#2eb886"),
    ("warning", "#daa038"),
    ("danger", "#a30200"),
];

/// Turns attachments into lines of markup.
#[derive(Debug, Clone, Default)]
pub struct AttachmentFlattener;

impl AttachmentFlattener {
    pub fn new() -> Self {
        Self
    }

    /// Lines for every attachment, in order.
    ///
    /// Each attachment yields its pretext (if any) and then one bullet entry
    /// holding the remaining items, one per line. Missing or blank fields
    /// produce nothing.
    pub fn flatten(&self, attachments: &[Attachment]) -> Vec<String> {
        let mut lines = Vec::new();

        for attachment in attachments {
            if let Some(pretext) = clean(&attachment.pretext) {
                lines.push(pretext);
            }

            let items = entry_items(attachment);
            if items.is_empty() {
                continue;
            }

            let bullet = match attachment.color.as_deref() {
                Some(raw) => match normalize_color(raw) {
                    Some(color) => color_marker(&color, BULLET),
                    None => {
                        debug!(color = %raw, "Ignoring unusable attachment color");
                        BULLET.to_string()
                    }
                },
                None => BULLET.to_string(),
            };
            // One bullet per attachment; its items follow on their own lines
            lines.push(format!("{} {}", bullet, items.join("\n")));
        }

        debug!(attachments = attachments.len(), lines = lines.len(), "Flattened attachments");
        lines
    }

    /// Message text followed by its flattened attachments.
    pub fn compose(&self, text: &str, attachments: &[Attachment]) -> String {
        std::iter::once(scrub_color_fragments(text))
            .chain(self.flatten(attachments))
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn entry_items(attachment: &Attachment) -> Vec<String> {
    let mut items = Vec::new();

    if let Some(name) = clean(&attachment.author_name) {
        items.push(match safe_link(&attachment.author_link) {
            Some(link) => format!("<{}|{}>", link, name),
            None => name,
        });
    }

    if let Some(title) = clean(&attachment.title) {
        items.push(match safe_link(&attachment.title_link) {
            Some(link) => format!("*<{}|{}>*", link, title),
            None => format!("*{}*", title),
        });
    }

    if let Some(text) = clean(&attachment.text) {
        items.push(text);
    }

    for field in &attachment.fields {
        if let Some(title) = clean(&field.title) {
            items.push(format!("*{}*", title));
        }
        if let Some(value) = clean(&field.value) {
            items.push(value);
        }
    }

    let actions: Vec<String> = attachment
        .actions
        .iter()
        .filter_map(|action| clean(&action.text))
        .map(|text| format!("[{}]", text))
        .collect();
    if !actions.is_empty() {
        items.push(format!("Actions (Unsupported): {}", actions.join(" ")));
    }

    if let Some(footer) = clean(&attachment.footer) {
        items.push(format!("_{}_", footer));
    }

    items
}

/// Trimmed, marker-free field text, or `None` when nothing is left.
fn clean(field: &Option<String>) -> Option<String> {
    let text = scrub_color_fragments(field.as_deref()?);
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// A link target that can sit inside a Slack `<...|...>` tag.
fn safe_link(link: &Option<String>) -> Option<&str> {
    let link = link.as_deref()?.trim();
    let unsafe_char = |c: char| c.is_whitespace() || matches!(c, '<' | '>' | '|');
    if link.is_empty() || link.contains(unsafe_char) {
        None
    } else {
        Some(link)
    }
}

/// Normalize an attachment color to `#rgb` / `#rrggbb`.
///
/// Accepts Slack's named colors, hex with or without `#`, and plain
/// alphabetic color names such as `red`. Anything else is rejected and the
/// bullet stays uncolored.
pub fn normalize_color(color: &str) -> Option<String> {
    let color = color.trim();
    let lower = color.to_lowercase();

    if let Some((_, hex)) = NAMED_COLORS.iter().find(|(name, _)| *name == lower) {
        return Some(hex.to_string());
    }

    let is_hex = |s: &str| s.chars().all(|c| c.is_ascii_hexdigit());
    let prefixed = lower
        .strip_prefix('#')
        .map_or(false, |hex| (hex.len() == 3 || hex.len() == 6) && is_hex(hex));
    if prefixed {
        Some(lower)
    } else if lower.len() == 6 && is_hex(&lower) {
        Some(format!("#{}", lower))
    } else if (3..=20).contains(&lower.len()) && lower.chars().all(|c| c.is_ascii_lowercase()) {
        Some(lower)
    } else {
        None
    }
}
