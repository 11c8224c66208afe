//! Slack incoming-webhook payload types.
//!
//! The payload is built from typed values and serialized with `serde_json`,
//! so every user-supplied string is escaped by the encoder.

use serde::Serialize;

use crate::config::NotifyConfig;
use crate::fields::Field;

/// Top-level webhook body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WebhookPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub icon_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub icon_emoji: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub channel: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub link_names: String,
    pub unfurl_links: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
}

/// Legacy secondary attachment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Attachment {
    pub fallback: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pretext: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub color: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub author_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub author_link: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub author_icon: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub footer: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
}

// ---------------------------------------------------------------------------
// Block Kit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Context { elements: Vec<ContextElement> },
    Header { text: Text },
    Divider,
    Section { text: Text },
    Actions { elements: Vec<ActionElement> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Text {
    PlainText { text: String },
    Mrkdwn { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContextElement {
    Image { image_url: String, alt_text: String },
    Mrkdwn { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionElement {
    Button {
        text: Text,
        #[serde(skip_serializing_if = "Option::is_none")]
        style: Option<ButtonStyle>,
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    Primary,
}

impl Text {
    pub fn plain(text: impl Into<String>) -> Self {
        Text::PlainText { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Text::Mrkdwn { text: text.into() }
    }
}

impl Block {
    /// A context block with a single mrkdwn element.
    pub fn context_text(text: impl Into<String>) -> Self {
        Block::Context {
            elements: vec![ContextElement::Mrkdwn { text: text.into() }],
        }
    }
}

impl ActionElement {
    pub fn primary_button(label: &str, url: String, value: Option<String>) -> Self {
        ActionElement::Button {
            text: Text::plain(label),
            style: Some(ButtonStyle::Primary),
            url,
            value,
        }
    }
}

// ---------------------------------------------------------------------------
// Pull request ready message
// ---------------------------------------------------------------------------

/// Values the ready-for-review blocks are built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewRequest {
    pub actor: String,
    pub avatar_url: String,
    pub repository: String,
    pub title: String,
    /// Body with mentions already resolved.
    pub body: String,
    pub pull_request_url: String,
    pub ticket_id: String,
    pub ticket_url: String,
}

/// The fixed block sequence announcing a pull request ready for review.
pub fn review_blocks(request: &ReviewRequest) -> Vec<Block> {
    let ticket_value = if request.ticket_id.is_empty() {
        None
    } else {
        Some(request.ticket_id.clone())
    };

    vec![
        Block::Context {
            elements: vec![
                ContextElement::Image {
                    image_url: request.avatar_url.clone(),
                    alt_text: "github user".into(),
                },
                ContextElement::Mrkdwn {
                    text: format!(
                        "<!here> *{}* has a pull request ready for review.",
                        request.actor
                    ),
                },
            ],
        },
        Block::Header {
            text: Text::plain("Ready for Review"),
        },
        Block::context_text(format!("*Repository:* {}", request.repository)),
        Block::context_text(format!("*Title:* {}", request.title)),
        Block::Divider,
        Block::Section {
            text: Text::mrkdwn(request.body.as_str()),
        },
        Block::Actions {
            elements: vec![
                ActionElement::primary_button(
                    "View Pull Request",
                    request.pull_request_url.clone(),
                    None,
                ),
                ActionElement::primary_button(
                    "View JIRA Ticket",
                    request.ticket_url.clone(),
                    ticket_value,
                ),
            ],
        },
    ]
}

/// Attachment carrying the display fields, color and footer.
pub fn fields_attachment(config: &NotifyConfig, fields: Vec<Field>) -> Attachment {
    let gh = &config.github;
    let author_link = if gh.actor.is_empty() {
        String::new()
    } else {
        format!("{}/{}", gh.server_url, gh.actor)
    };

    Attachment {
        fallback: config.message.clone(),
        color: config.color.clone(),
        author_name: gh.actor.clone(),
        author_icon: if gh.actor.is_empty() {
            String::new()
        } else {
            gh.avatar_url()
        },
        author_link,
        footer: config.footer.clone(),
        fields,
        ..Default::default()
    }
}

impl WebhookPayload {
    /// Payload carrying the identity and routing settings from `config`.
    pub fn from_config(config: &NotifyConfig) -> Self {
        Self {
            username: config.username.clone(),
            icon_url: config.icon_url.clone(),
            icon_emoji: config.icon_emoji.clone(),
            channel: config.channel.clone(),
            link_names: config.link_names.clone(),
            unfurl_links: false,
            ..Default::default()
        }
    }
}
