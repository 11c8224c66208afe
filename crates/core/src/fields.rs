//! Display field selection.
//!
//! Fields are the compact key/value summary of a run (ref, event, actions
//! link, commit link, message). Which of them appear is controlled by the
//! `MSG_MINIMAL` selector:
//!
//! - unset: all four summary fields followed by the message field
//! - `true`: the message field only
//! - a comma-separated keyword list: the message field, with each recognized
//!   keyword's field pushed onto the front in list order. The result is the
//!   keyword list reversed, followed by the message field.
//!
//! When `HOST_NAME` is set, site and host fields go in front of everything.

use serde::Serialize;
use tracing::debug;

use crate::config::{GitHubContext, NotifyConfig};

/// Value shown for the message field when the message text is empty.
const EMPTY_MESSAGE: &str = "EOM";

/// One title/value pair of the summary. `short` fields render two per row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub short: bool,
}

impl Field {
    pub fn short(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            short: true,
        }
    }

    pub fn long(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            short: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Field constructors
// ---------------------------------------------------------------------------

type FieldBuilder = fn(&GitHubContext) -> Field;

fn ref_field(gh: &GitHubContext) -> Field {
    Field::short("Ref", gh.git_ref.as_str())
}

fn event_field(gh: &GitHubContext) -> Field {
    Field::short("Event", gh.event_name.as_str())
}

fn actions_url_field(gh: &GitHubContext) -> Field {
    Field::short(
        "Actions URL",
        format!("<{}|{}>", gh.checks_url(), gh.workflow),
    )
}

fn commit_field(gh: &GitHubContext) -> Field {
    Field::short(
        "Commit",
        format!("<{}|{}>", gh.commit_url(), gh.short_sha()),
    )
}

/// Keyword table for the list form of the selector. Matching is ASCII
/// case-insensitive.
const KEYWORD_FIELDS: &[(&str, FieldBuilder)] = &[
    ("ref", ref_field),
    ("event", event_field),
    ("actions url", actions_url_field),
    ("commit", commit_field),
];

/// Fields used when no selector is given, in display order.
const FULL_FIELDS: &[FieldBuilder] = &[ref_field, event_field, actions_url_field, commit_field];

fn builder_for(keyword: &str) -> Option<FieldBuilder> {
    let keyword = keyword.trim();
    KEYWORD_FIELDS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(keyword))
        .map(|(_, build)| *build)
}

// ---------------------------------------------------------------------------
// Minimal mode
// ---------------------------------------------------------------------------

/// Parsed form of the `MSG_MINIMAL` selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinimalMode {
    /// Selector unset.
    Full,
    /// Selector exactly `true`.
    MessageOnly,
    /// Any other value, split on commas. Keywords are kept raw.
    Keywords(Vec<String>),
}

impl MinimalMode {
    pub fn parse(selector: &str) -> Self {
        match selector {
            "" => MinimalMode::Full,
            "true" => MinimalMode::MessageOnly,
            list => MinimalMode::Keywords(list.split(',').map(str::to_string).collect()),
        }
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Build the ordered display fields for `config`.
pub fn select_fields(config: &NotifyConfig) -> Vec<Field> {
    let gh = &config.github;
    let message = message_field(config);

    let mut fields = match MinimalMode::parse(&config.minimal) {
        MinimalMode::Full => {
            let mut fields: Vec<Field> = FULL_FIELDS.iter().map(|build| build(gh)).collect();
            fields.push(message);
            fields
        }
        MinimalMode::MessageOnly => vec![message],
        MinimalMode::Keywords(keywords) => {
            keywords
                .iter()
                .fold(vec![message], |mut fields, keyword| match builder_for(keyword) {
                    Some(build) => {
                        fields.insert(0, build(gh));
                        fields
                    }
                    None => {
                        debug!(keyword = %keyword, "ignoring unknown minimal keyword");
                        fields
                    }
                })
        }
    };

    if !config.host_name.is_empty() {
        let mut with_host = vec![
            Field::short(config.site_title.as_str(), config.site_name.as_str()),
            Field::short(config.host_title.as_str(), config.host_name.as_str()),
        ];
        with_host.append(&mut fields);
        fields = with_host;
    }

    fields
}

fn message_field(config: &NotifyConfig) -> Field {
    let value = if config.message.is_empty() {
        EMPTY_MESSAGE
    } else {
        config.message.as_str()
    };
    Field::long(config.title.as_str(), value)
}
