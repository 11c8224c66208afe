//! Environment-driven configuration for the notifier.
//!
//! Every input comes from an environment variable. Reads go through the
//! [`EnvSource`] trait so the process environment can be swapped for an
//! [`EnvSnapshot`] in tests. [`NotifyConfig::from_env`] gathers everything in
//! one pass and enforces the two required values.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Variable names
// ---------------------------------------------------------------------------

pub const ENV_SLACK_WEBHOOK: &str = "SLACK_WEBHOOK";
pub const ENV_SLACK_ICON: &str = "SLACK_ICON";
pub const ENV_SLACK_ICON_EMOJI: &str = "SLACK_ICON_EMOJI";
pub const ENV_SLACK_CHANNEL: &str = "SLACK_CHANNEL";
pub const ENV_SLACK_TITLE: &str = "SLACK_TITLE";
pub const ENV_SLACK_MESSAGE: &str = "SLACK_MESSAGE";
pub const ENV_SLACK_COLOR: &str = "SLACK_COLOR";
pub const ENV_SLACK_USERNAME: &str = "SLACK_USERNAME";
pub const ENV_SLACK_FOOTER: &str = "SLACK_FOOTER";
pub const ENV_SLACK_LINK_NAMES: &str = "SLACK_LINK_NAMES";
pub const ENV_SLACK_USER_MAP: &str = "SLACK_USER_MAP";
pub const ENV_SLACK_ATTACH_FIELDS: &str = "SLACK_ATTACH_FIELDS";
pub const ENV_SITE_NAME: &str = "SITE_NAME";
pub const ENV_SITE_TITLE: &str = "SITE_TITLE";
pub const ENV_HOST_NAME: &str = "HOST_NAME";
pub const ENV_HOST_TITLE: &str = "HOST_TITLE";
pub const ENV_MINIMAL: &str = "MSG_MINIMAL";
pub const ENV_PR_TITLE: &str = "PR_TITLE";
pub const ENV_PR_NUMBER: &str = "PR_NUMBER";
pub const ENV_PR_BODY: &str = "PR_BODY";
pub const ENV_TICKET_PREFIX: &str = "TICKET_PREFIX";
pub const ENV_TICKET_BASE_URL: &str = "TICKET_BASE_URL";

pub const ENV_GITHUB_ACTOR: &str = "GITHUB_ACTOR";
pub const ENV_GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";
pub const ENV_GITHUB_SERVER_URL: &str = "GITHUB_SERVER_URL";
pub const ENV_GITHUB_REF: &str = "GITHUB_REF";
pub const ENV_GITHUB_EVENT_NAME: &str = "GITHUB_EVENT_NAME";
pub const ENV_GITHUB_WORKFLOW: &str = "GITHUB_WORKFLOW";
pub const ENV_GITHUB_SHA: &str = "GITHUB_SHA";

pub const DEFAULT_TICKET_PREFIX: &str = "FOR";
pub const DEFAULT_TICKET_BASE_URL: &str = "https://makersoftware.atlassian.net/browse/";

/// Label used in place of a workflow name that is really a workflow file path.
const WORKFLOW_PATH_LABEL: &str = "Link to action run";

/// Number of leading SHA characters shown as the commit link label.
const SHORT_SHA_LEN: usize = 6;

// ---------------------------------------------------------------------------
// Environment sources
// ---------------------------------------------------------------------------

/// Read-only view of environment variables.
pub trait EnvSource {
    /// Raw lookup: `None` when the variable is absent.
    fn lookup(&self, name: &str) -> Option<String>;

    /// Value of `name`, or an empty string when it is absent.
    fn get(&self, name: &str) -> String {
        self.lookup(name).unwrap_or_default()
    }

    /// Value of `name`, or `default` when it is absent.
    ///
    /// A variable that is set to the empty string yields the empty string.
    fn get_or(&self, name: &str, default: &str) -> String {
        self.lookup(name).unwrap_or_else(|| default.to_string())
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// An in-memory environment, used by tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_string(), value.to_string());
    }

    pub fn remove(&mut self, name: &str) {
        self.vars.remove(name);
    }
}

impl EnvSource for EnvSnapshot {
    fn lookup(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// GitHub Actions context
// ---------------------------------------------------------------------------

/// Ambient variables provided by the CI runner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitHubContext {
    /// Login of the user that triggered the run.
    pub actor: String,
    /// Repository in `owner/repo` format.
    pub repository: String,
    /// Server base URL, e.g. `https://github.com`.
    pub server_url: String,
    pub git_ref: String,
    pub event_name: String,
    /// Workflow name (already normalized, see [`normalize_workflow_name`]).
    pub workflow: String,
    /// Full commit SHA.
    pub sha: String,
}

impl GitHubContext {
    pub fn from_env(env: &impl EnvSource) -> Self {
        Self {
            actor: env.get(ENV_GITHUB_ACTOR),
            repository: env.get(ENV_GITHUB_REPOSITORY),
            server_url: env.get(ENV_GITHUB_SERVER_URL),
            git_ref: env.get(ENV_GITHUB_REF),
            event_name: env.get(ENV_GITHUB_EVENT_NAME),
            workflow: normalize_workflow_name(&env.get(ENV_GITHUB_WORKFLOW)),
            sha: env.get(ENV_GITHUB_SHA),
        }
    }

    /// `{server}/{repo}/commit/{sha}`.
    pub fn commit_url(&self) -> String {
        format!("{}/{}/commit/{}", self.server_url, self.repository, self.sha)
    }

    /// Checks page for the commit.
    pub fn checks_url(&self) -> String {
        format!("{}/checks", self.commit_url())
    }

    pub fn pull_request_url(&self, number: &str) -> String {
        format!("{}/{}/pull/{}", self.server_url, self.repository, number)
    }

    /// 32px avatar of the actor.
    pub fn avatar_url(&self) -> String {
        format!("{}/{}.png?size=32", self.server_url, self.actor)
    }

    /// First six characters of the SHA, or the whole SHA if it is shorter.
    pub fn short_sha(&self) -> &str {
        match self.sha.char_indices().nth(SHORT_SHA_LEN) {
            Some((idx, _)) => &self.sha[..idx],
            None => &self.sha,
        }
    }
}

/// Replace a workflow file path (`.github/workflows/...`) with a readable label.
///
/// GitHub reports the file path as the workflow name when the workflow file
/// has no `name:` key.
pub fn normalize_workflow_name(workflow: &str) -> String {
    if workflow.starts_with(".github") {
        WORKFLOW_PATH_LABEL.to_string()
    } else {
        workflow.to_string()
    }
}

// ---------------------------------------------------------------------------
// Notify config
// ---------------------------------------------------------------------------

/// The pull request being announced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequest {
    pub title: String,
    pub number: String,
    pub body: String,
}

/// Everything the notifier reads from the environment.
#[derive(Debug, Clone, Default)]
pub struct NotifyConfig {
    /// Incoming webhook URL (required).
    pub webhook_url: String,
    /// Message text (required, non-empty).
    pub message: String,
    /// Title of the message field.
    pub title: String,

    pub username: String,
    pub icon_url: String,
    pub icon_emoji: String,
    pub channel: String,
    pub link_names: String,

    /// Accent color, only emitted when fields are attached.
    pub color: String,
    /// Footer text, only emitted when fields are attached.
    pub footer: String,

    pub site_name: String,
    pub site_title: String,
    pub host_name: String,
    pub host_title: String,

    /// Raw minimal-mode selector.
    pub minimal: String,

    pub pr: PullRequest,
    pub github: GitHubContext,

    /// Project prefix of ticket ids, e.g. `FOR` in `FOR-482`.
    pub ticket_prefix: String,
    /// Ticket tracker URL the ticket id is appended to.
    pub ticket_base_url: String,

    /// Optional TOML file with extra handle to user id entries.
    pub user_map: Option<PathBuf>,
    /// Attach the display fields as a legacy attachment.
    pub attach_fields: bool,
}

impl NotifyConfig {
    /// Gather configuration from `env` and check the required values.
    ///
    /// The webhook URL is checked before the message so a run with neither
    /// reports the URL first.
    pub fn from_env(env: &impl EnvSource) -> Result<Self, ConfigError> {
        info!("reading notifier configuration from environment");

        let webhook_url = env.get(ENV_SLACK_WEBHOOK);
        if webhook_url.is_empty() {
            return Err(ConfigError::MissingRequired {
                var: ENV_SLACK_WEBHOOK.into(),
                what: "URL".into(),
            });
        }

        let message = env.get(ENV_SLACK_MESSAGE);
        if message.is_empty() {
            return Err(ConfigError::MissingRequired {
                var: ENV_SLACK_MESSAGE.into(),
                what: "Message".into(),
            });
        }

        let user_map = match env.get(ENV_SLACK_USER_MAP) {
            path if path.is_empty() => None,
            path => Some(PathBuf::from(path)),
        };

        let config = Self {
            webhook_url,
            message,
            title: env.get(ENV_SLACK_TITLE),
            username: env.get(ENV_SLACK_USERNAME),
            icon_url: env.get(ENV_SLACK_ICON),
            icon_emoji: env.get(ENV_SLACK_ICON_EMOJI),
            channel: env.get(ENV_SLACK_CHANNEL),
            link_names: env.get(ENV_SLACK_LINK_NAMES),
            color: env.get(ENV_SLACK_COLOR),
            footer: env.get(ENV_SLACK_FOOTER),
            site_name: env.get(ENV_SITE_NAME),
            site_title: env.get(ENV_SITE_TITLE),
            host_name: env.get(ENV_HOST_NAME),
            host_title: env.get(ENV_HOST_TITLE),
            minimal: env.get(ENV_MINIMAL),
            pr: PullRequest {
                title: env.get(ENV_PR_TITLE),
                number: env.get(ENV_PR_NUMBER),
                body: env.get(ENV_PR_BODY),
            },
            github: GitHubContext::from_env(env),
            ticket_prefix: non_empty_or(env.get(ENV_TICKET_PREFIX), DEFAULT_TICKET_PREFIX),
            ticket_base_url: non_empty_or(env.get(ENV_TICKET_BASE_URL), DEFAULT_TICKET_BASE_URL),
            user_map,
            attach_fields: env.get(ENV_SLACK_ATTACH_FIELDS).eq_ignore_ascii_case("true"),
        };

        debug!(
            repository = %config.github.repository,
            minimal = %config.minimal,
            attach_fields = config.attach_fields,
            "configuration gathered"
        );
        Ok(config)
    }
}

fn non_empty_or(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}
