//! Bridge orchestrator that ties the normalization stages together.
//!
//! Inbound Slack events become Matrix deliveries, outbound Matrix bodies
//! become Slack text. The bridge holds no per-message state, so one instance
//! serves any number of concurrent requests.

use tracing::{debug, error, info, warn};

use crate::common::error::NormalizeResult;
use crate::common::messages::{
    BridgeRequest, BridgeResponse, Delivery, FileDelivery, IgnoreReason, NormalizedMessage,
    SlackEvent,
};
use crate::common::types::{Message, NotifyMode};
use crate::config::types::Config;
use crate::format::{
    AttachmentFlattener, EntityResolver, Normalizer, RenderedBodies, ReverseTranslator,
    RichTextRenderer,
};
use crate::markup::escape::escape_slack;
use crate::markup::tokens::{scrub_mention_tokens, strip_color_markers};
use crate::markup::MarkupParser;
use crate::platform::{IdentityMap, PlatformLookup};

use super::echo::{EchoTagger, EchoVerdict};

/// Slack reports deletions without an author; they are attributed to Slackbot.
const DELETION_AUTHOR: &str = "USLACKBOT";

/// Shown when the author of a message cannot be looked up.
const UNKNOWN_SENDER: &str = "unknown";

/// Author of an inbound event as the Matrix side sees it.
#[derive(Debug, Clone, Default)]
struct Sender {
    /// `None` for the puppeted account.
    id: Option<String>,
    name: String,
    avatar_url: Option<String>,
}

/// The message normalization pipeline.
pub struct Bridge {
    normalizer: Normalizer,
    flattener: AttachmentFlattener,
    parser: MarkupParser,
    resolver: EntityResolver,
    renderer: RichTextRenderer,
    reverse: ReverseTranslator,
    echo: EchoTagger,
    notify: NotifyMode,
}

impl Bridge {
    /// Create a new bridge from configuration.
    pub fn new(config: &Config) -> Self {
        Self::with_identity(IdentityMap::from_config(config), config.notify_mode())
    }

    pub fn with_identity(identity: IdentityMap, notify: NotifyMode) -> Self {
        Self {
            normalizer: Normalizer::new(),
            flattener: AttachmentFlattener::new(),
            parser: MarkupParser::new(),
            resolver: EntityResolver::new(identity.clone()),
            renderer: RichTextRenderer::new(),
            reverse: ReverseTranslator::new(identity),
            echo: EchoTagger::new(),
            notify,
        }
    }

    /// Produce the plain and HTML bodies for a Slack message.
    ///
    /// Never fails. If a lookup errors, the text is delivered without markup
    /// processing and `html` is `None`.
    pub async fn normalize_inbound(
        &self,
        msg: &Message,
        lookup: &dyn PlatformLookup,
    ) -> NormalizedMessage {
        let composed = self.flattener.compose(&msg.text, &msg.attachments);
        let normalized = self.normalizer.normalize(&composed);

        let (plain_text, html) = match self.render(&normalized, lookup).await {
            Ok(bodies) => (bodies.plain_text, Some(bodies.html)),
            Err(e) => {
                error!(room = %msg.room_id, error = %e, "Failed to normalize message, delivering raw text");
                (scrub_mention_tokens(&strip_color_markers(&normalized)), None)
            }
        };

        NormalizedMessage {
            room_id: msg.room_id.clone(),
            sender_id: msg.sender_id.clone(),
            sender_name: msg.sender_name.clone(),
            avatar_url: msg.avatar_url.clone(),
            plain_text,
            html,
        }
    }

    async fn render(
        &self,
        text: &str,
        lookup: &dyn PlatformLookup,
    ) -> NormalizeResult<RenderedBodies> {
        let markup = self.parser.parse(text);
        let entities = self.resolver.resolve(&markup, lookup).await?;
        Ok(self.renderer.render(&markup, &entities))
    }

    /// Slack text for a formatted Matrix body.
    pub fn normalize_outbound(&self, html: &str, sender_is_self: bool) -> String {
        let text = self.reverse.translate(html);
        self.finish_outbound(&text, sender_is_self)
    }

    /// Slack text for a Matrix body without formatting.
    pub fn normalize_outbound_body(&self, body: &str, sender_is_self: bool) -> String {
        self.finish_outbound(&escape_slack(body), sender_is_self)
    }

    fn finish_outbound(&self, text: &str, sender_is_self: bool) -> String {
        let text = self.normalizer.alias_outbound(text, self.notify);
        if sender_is_self {
            self.echo.tag(&text)
        } else {
            text
        }
    }

    /// Filename to upload to Slack for a Matrix file.
    pub fn outbound_filename(&self, name: &str, sender_is_self: bool) -> String {
        if sender_is_self {
            self.echo.tag_filename(name)
        } else {
            name.to_string()
        }
    }

    /// Whether a body or file path came from the bridge itself.
    pub fn is_echo(&self, text_or_filename: &str) -> bool {
        self.echo.is_tagged(text_or_filename) || self.echo.is_tagged_filename(text_or_filename)
    }

    /// Apply the echo policy, then normalize.
    pub async fn deliver(&self, msg: &Message, lookup: &dyn PlatformLookup) -> Delivery {
        match self.echo.classify(msg.sender_id.as_deref(), &msg.text) {
            EchoVerdict::Echo => {
                debug!(room = %msg.room_id, "Dropping echo of our own message");
                Delivery::ignored(IgnoreReason::Echo)
            }
            EchoVerdict::UnknownOrigin => {
                debug!(room = %msg.room_id, "Ignoring self-authored message without text");
                Delivery::ignored(IgnoreReason::UnknownOrigin)
            }
            EchoVerdict::Deliver if msg.text.trim().is_empty() && msg.attachments.is_empty() => {
                Delivery::ignored(IgnoreReason::Empty)
            }
            EchoVerdict::Deliver => {
                let normalized = self.normalize_inbound(msg, lookup).await;
                info!(room = %msg.room_id, sender = %msg.sender_name, "Relaying message");
                Delivery::Message(normalized)
            }
            EchoVerdict::Notice => {
                let normalized = self.normalize_inbound(msg, lookup).await;
                info!(room = %msg.room_id, "Relaying own message written outside the bridge");
                Delivery::Notice(normalized)
            }
        }
    }

    /// Turn one Slack message event into deliveries.
    pub async fn handle_event(
        &self,
        event: SlackEvent,
        lookup: &dyn PlatformLookup,
    ) -> Vec<Delivery> {
        match event.subtype.as_deref() {
            Some("message_changed") => {
                let new = event.message.unwrap_or_default();
                let old = event.previous_message.unwrap_or_default();
                if new.text == old.text {
                    debug!(channel = %event.channel, "Ignoring duplicate edit");
                    return vec![Delivery::ignored(IgnoreReason::DuplicateEdit)];
                }
                let sender = self.resolve_sender(new.user.as_deref(), None, lookup).await;
                let msg = message_from(&event.channel, format!("Edit: {}", new.text), sender);
                vec![self.deliver(&msg, lookup).await]
            }
            Some("message_deleted") => {
                let old = event.previous_message.unwrap_or_default();
                let sender = self.resolve_sender(Some(DELETION_AUTHOR), None, lookup).await;
                let msg = message_from(&event.channel, format!("Deleted: {}", old.text), sender);
                vec![self.deliver(&msg, lookup).await]
            }
            Some("message_replied") => {
                debug!(channel = %event.channel, "Ignoring thread reply bookkeeping");
                vec![Delivery::ignored(IgnoreReason::ThreadReply)]
            }
            _ => {
                let sender = self
                    .resolve_sender(event.user.as_deref(), event.bot_id.as_deref(), lookup)
                    .await;
                let mut deliveries: Vec<Delivery> = event
                    .files
                    .into_iter()
                    .map(|file| {
                        let upload = Message {
                            file: Some(file),
                            ..message_from(&event.channel, String::new(), sender.clone())
                        };
                        self.file_delivery(&upload)
                    })
                    .collect();

                let has_files = !deliveries.is_empty();
                let mut msg = message_from(&event.channel, event.text, sender);
                msg.attachments = event.attachments;
                if !has_files || !msg.text.trim().is_empty() || !msg.attachments.is_empty() {
                    deliveries.push(self.deliver(&msg, lookup).await);
                }
                deliveries
            }
        }
    }

    /// Relay the file carried by `msg`.
    fn file_delivery(&self, msg: &Message) -> Delivery {
        let file = match msg.file.as_ref() {
            Some(file) => file,
            None => return Delivery::ignored(IgnoreReason::Empty),
        };
        let room_id = &msg.room_id;
        let from_self = msg.is_self_authored();
        if from_self && self.echo.is_tagged_filename(&file.name) {
            debug!(room = %room_id, file = %file.name, "Dropping echo of our own upload");
            return Delivery::ignored(IgnoreReason::Echo);
        }

        let title = file
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&file.name);
        let tag = |text: &str| {
            if from_self {
                self.echo.tag(text)
            } else {
                text.to_string()
            }
        };

        let snippet = self.renderer.render_snippet(file).map(|mut snippet| {
            snippet.body = tag(&snippet.body);
            snippet
        });

        info!(room = %room_id, file = %file.name, snippet = snippet.is_some(), "Relaying file");
        Delivery::File(FileDelivery {
            room_id: room_id.clone(),
            sender_id: msg.sender_id.clone(),
            sender_name: msg.sender_name.clone(),
            avatar_url: msg.avatar_url.clone(),
            filename: file.name.clone(),
            body: tag(title),
            url: file.url_private.clone(),
            mimetype: file.mimetype.clone(),
            snippet,
        })
    }

    /// Work out who wrote an event.
    ///
    /// The puppeted account gets no sender id. Failed lookups degrade to the
    /// name `unknown` and never abort the event.
    async fn resolve_sender(
        &self,
        user: Option<&str>,
        bot_id: Option<&str>,
        lookup: &dyn PlatformLookup,
    ) -> Sender {
        if let Some(user) = user {
            let id = (user != lookup.self_id()).then(|| user.to_string());
            return match lookup.lookup_user(user).await {
                Ok(Some(profile)) => Sender {
                    id,
                    name: profile.name,
                    avatar_url: profile.avatar_url,
                },
                Ok(None) => {
                    warn!(user = %user, "Unknown message author");
                    Sender {
                        id,
                        name: UNKNOWN_SENDER.to_string(),
                        avatar_url: None,
                    }
                }
                Err(e) => {
                    warn!(user = %user, error = %e, "Failed to look up message author");
                    Sender {
                        id,
                        name: UNKNOWN_SENDER.to_string(),
                        avatar_url: None,
                    }
                }
            };
        }

        if let Some(bot_id) = bot_id {
            let id = Some(bot_id.to_string());
            return match lookup.lookup_bot(bot_id).await {
                Ok(Some(bot)) => Sender {
                    id,
                    name: bot.name,
                    avatar_url: bot.avatar_url,
                },
                Ok(None) => Sender {
                    id,
                    name: UNKNOWN_SENDER.to_string(),
                    avatar_url: None,
                },
                Err(e) => {
                    warn!(bot = %bot_id, error = %e, "Failed to look up bot");
                    Sender {
                        id,
                        name: UNKNOWN_SENDER.to_string(),
                        avatar_url: None,
                    }
                }
            };
        }

        Sender::default()
    }

    /// Answer one driver request.
    pub async fn handle_request(
        &self,
        request: BridgeRequest,
        lookup: &dyn PlatformLookup,
    ) -> BridgeResponse {
        match request {
            BridgeRequest::Inbound { event } => {
                let channel = event.channel.clone();
                let deliveries = self.handle_event(event, lookup).await;
                debug!(
                    channel = %channel,
                    delivered = deliveries.iter().filter(|d| !d.is_ignored()).count(),
                    ignored = deliveries.iter().filter(|d| d.is_ignored()).count(),
                    "Handled inbound event"
                );
                BridgeResponse::Inbound { deliveries }
            }
            BridgeRequest::Outbound {
                body,
                html,
                sender_is_self,
            } => {
                let text = match html.as_deref().filter(|h| !h.trim().is_empty()) {
                    Some(html) => self.normalize_outbound(html, sender_is_self),
                    None => self.normalize_outbound_body(&body, sender_is_self),
                };
                BridgeResponse::Outbound { text }
            }
            BridgeRequest::EchoCheck { text } => BridgeResponse::EchoCheck {
                echo: self.is_echo(&text),
            },
        }
    }
}

fn message_from(room_id: &str, text: String, sender: Sender) -> Message {
    Message {
        room_id: room_id.to_string(),
        sender_id: sender.id,
        sender_name: sender.name,
        avatar_url: sender.avatar_url,
        text,
        ..Default::default()
    }
}
