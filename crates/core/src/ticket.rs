//! Ticket id extraction from pull request titles.

use regex_lite::Regex;
use tracing::debug;

use crate::errors::ConfigError;

/// Finds `<PREFIX>-<digits>` ticket ids and builds tracker links for them.
#[derive(Debug, Clone)]
pub struct TicketExtractor {
    pattern: Regex,
    base_url: String,
}

impl TicketExtractor {
    /// Build an extractor for `prefix` whose links start with `base_url`.
    pub fn new(prefix: &str, base_url: &str) -> Result<Self, ConfigError> {
        if prefix.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "TICKET_PREFIX".into(),
                detail: "ticket prefix must not be empty".into(),
            });
        }

        let pattern = Regex::new(&format!(r"{}-\d+", regex_lite::escape(prefix))).map_err(
            |e| ConfigError::InvalidValue {
                field: "TICKET_PREFIX".into(),
                detail: e.to_string(),
            },
        )?;

        Ok(Self {
            pattern,
            base_url: base_url.to_string(),
        })
    }

    /// First ticket id in `title`, or an empty string when there is none.
    pub fn extract<'a>(&self, title: &'a str) -> &'a str {
        match self.pattern.find(title) {
            Some(m) => m.as_str(),
            None => {
                debug!(title, "no ticket id in title");
                ""
            }
        }
    }

    /// Tracker URL for `ticket_id`.
    ///
    /// The id is appended as-is, so an empty id yields the bare base URL.
    pub fn ticket_url(&self, ticket_id: &str) -> String {
        format!("{}{}", self.base_url, ticket_id)
    }
}
