//! Handle to Slack user id directory and `@mention` rewriting.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::{debug, info};

use super::mapping_file::MappingFile;
use crate::errors::ConfigError;

/// Built-in team handles. Several handles may share one user id.
const BUILTIN_USERS: &[(&str, &str)] = &[
    ("alex", "U01FFMD8P7E"),
    ("Alex", "U01FFMD8P7E"),
    ("twigs67", "U01FFMD8P7E"),
    ("brad", "U058HUUKZ6U"),
    ("Brad", "U058HUUKZ6U"),
    ("dvrs-brad", "U058HUUKZ6U"),
    ("josh", "U061W1T6L0Y"),
    ("Josh", "U061W1T6L0Y"),
    ("skyfriends", "U061W1T6L0Y"),
    ("bryer", "U03HRTQ0LKW"),
    ("Bryer", "U03HRTQ0LKW"),
    ("bryercowan", "U03HRTQ0LKW"),
];

/// `@handle` where the handle is one or more ASCII word characters.
static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+)").expect("mention pattern is valid"));

/// Immutable, case-sensitive mapping from handle to Slack user id.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    users: HashMap<String, String>,
}

impl UserDirectory {
    /// Directory containing exactly `users`.
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }

    /// The built-in team table.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_USERS
                .iter()
                .map(|(handle, id)| (handle.to_string(), id.to_string()))
                .collect(),
        )
    }

    /// The built-in table with the entries of a mapping file laid over it.
    pub fn with_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut directory = Self::builtin();
        let extra = MappingFile::load(path)?;
        info!(count = extra.len(), "merging user mappings over built-in table");
        directory.users.extend(extra);
        Ok(directory)
    }

    /// Slack user id for `handle`, if known.
    pub fn lookup(&self, handle: &str) -> Option<&str> {
        self.users.get(handle).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Rewrite every known `@handle` in `text` to `<@USERID>`.
    ///
    /// Unknown handles are left untouched. The replacement is a single pass:
    /// rewritten output is never scanned again.
    pub fn resolve_mentions(&self, text: &str) -> String {
        MENTION
            .replace_all(text, |caps: &regex_lite::Captures<'_>| {
                let handle = &caps[1];
                match self.lookup(handle) {
                    Some(id) => {
                        debug!(handle, id, "resolved mention");
                        format!("<@{}>", id)
                    }
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::builtin()
    }
}
