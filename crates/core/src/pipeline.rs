//! Gather, build and deliver in one pass.
//!
//! [`Notifier::prepare`] does all the work that can fail on configuration
//! (exit status 1) and touches no network. [`Notifier::execute`] performs the
//! single POST (exit status 2 on failure), or skips it on a dry run.
//! [`run`] chains the two and returns a [`RunReport`].

use std::path::PathBuf;

use reqwest::StatusCode;
use tracing::{debug, info};

use crate::config::{EnvSource, NotifyConfig};
use crate::errors::CoreError;
use crate::fields::{select_fields, Field};
use crate::identity::UserDirectory;
use crate::notify::SlackNotifier;
use crate::payload::{fields_attachment, review_blocks, ReviewRequest, WebhookPayload};
use crate::ticket::TicketExtractor;

/// A fully built message and the structured fields that describe it.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub payload: WebhookPayload,
    /// Display fields, attached to the payload only when configured.
    pub fields: Vec<Field>,
    /// Ticket id found in the pull request title, possibly empty.
    pub ticket_id: String,
}

/// Build the outgoing message for `config`. Pure; no I/O.
pub fn build_notification(
    config: &NotifyConfig,
    directory: &UserDirectory,
    tickets: &TicketExtractor,
) -> Notification {
    let gh = &config.github;
    let fields = select_fields(config);
    let ticket_id = tickets.extract(&config.pr.title).to_string();

    let request = ReviewRequest {
        actor: gh.actor.clone(),
        avatar_url: gh.avatar_url(),
        repository: gh.repository.clone(),
        title: config.pr.title.clone(),
        body: directory.resolve_mentions(&config.pr.body),
        pull_request_url: gh.pull_request_url(&config.pr.number),
        ticket_id: ticket_id.clone(),
        ticket_url: tickets.ticket_url(&ticket_id),
    };

    let mut payload = WebhookPayload::from_config(config);
    payload.blocks = review_blocks(&request);
    if config.attach_fields {
        payload.attachments = vec![fields_attachment(config, fields.clone())];
    }

    debug!(
        fields = fields.len(),
        ticket_id = %ticket_id,
        attached = config.attach_fields,
        "built notification"
    );

    Notification {
        payload,
        fields,
        ticket_id,
    }
}

/// How a run behaves, independent of the message inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Build the payload but do not send it.
    pub dry_run: bool,
    /// Overrides the mapping file named in the environment.
    pub user_map: Option<PathBuf>,
}

/// What happened to the prepared message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The webhook accepted the message with this status.
    Sent(StatusCode),
    /// Dry run; nothing was sent.
    Skipped,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub webhook_url: String,
    pub message: String,
    pub notification: Notification,
    pub delivery: Delivery,
}

/// A prepared run: validated configuration plus the message to send.
pub struct Notifier {
    pub config: NotifyConfig,
    pub notification: Notification,
    dry_run: bool,
    slack: SlackNotifier,
}

impl Notifier {
    /// Read configuration from `env` and build the message.
    pub fn prepare(env: &impl EnvSource, options: &RunOptions) -> Result<Self, CoreError> {
        let config = NotifyConfig::from_env(env)?;

        let user_map = options.user_map.as_deref().or(config.user_map.as_deref());
        let directory = match user_map {
            Some(path) => UserDirectory::with_file(path)?,
            None => UserDirectory::builtin(),
        };
        let tickets = TicketExtractor::new(&config.ticket_prefix, &config.ticket_base_url)?;

        let notification = build_notification(&config, &directory, &tickets);
        let slack = SlackNotifier::new(config.webhook_url.clone());

        info!(users = directory.len(), "notification prepared");
        Ok(Self {
            config,
            notification,
            dry_run: options.dry_run,
            slack,
        })
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Post the prepared message, regardless of the dry-run setting.
    pub async fn deliver(&self) -> Result<StatusCode, CoreError> {
        let status = self.slack.send(&self.notification.payload).await?;
        Ok(status)
    }

    /// Post the prepared message unless this is a dry run.
    pub async fn execute(&self) -> Result<Delivery, CoreError> {
        if self.dry_run {
            info!("dry run, not sending");
            return Ok(Delivery::Skipped);
        }
        Ok(Delivery::Sent(self.deliver().await?))
    }

    pub fn into_report(self, delivery: Delivery) -> RunReport {
        RunReport {
            webhook_url: self.config.webhook_url,
            message: self.config.message,
            notification: self.notification,
            delivery,
        }
    }
}

/// Prepare, then send unless `options.dry_run` is set.
pub async fn run(env: &impl EnvSource, options: &RunOptions) -> Result<RunReport, CoreError> {
    let notifier = Notifier::prepare(env, options)?;
    let delivery = notifier.execute().await?;
    Ok(notifier.into_report(delivery))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::*;
    use crate::errors::ConfigError;

    fn env() -> EnvSnapshot {
        EnvSnapshot::new()
            .with(ENV_SLACK_WEBHOOK, "http://127.0.0.1:9/hook")
            .with(ENV_SLACK_MESSAGE, "Ready for eyes")
            .with(ENV_SLACK_TITLE, "Status")
            .with(ENV_SLACK_COLOR, "good")
            .with(ENV_MINIMAL, "true")
            .with(ENV_PR_TITLE, "FOR-482: fix bug")
            .with(ENV_PR_NUMBER, "17")
            .with(ENV_PR_BODY, "cc @alex\nthanks @nobody")
            .with(ENV_GITHUB_ACTOR, "octocat")
            .with(ENV_GITHUB_SERVER_URL, "https://github.com")
            .with(ENV_GITHUB_REPOSITORY, "acme/widgets")
            .with(ENV_GITHUB_SHA, "0123456789abcdef0123456789abcdef01234567")
    }

    #[test]
    fn test_build_notification() {
        let notifier = Notifier::prepare(&env(), &RunOptions::default()).unwrap();
        let notification = &notifier.notification;

        assert_eq!(notification.ticket_id, "FOR-482");
        assert_eq!(notification.fields, vec![Field::long("Status", "Ready for eyes")]);
        assert!(notification.payload.attachments.is_empty());

        let value = serde_json::to_value(&notification.payload).unwrap();
        assert_eq!(value["unfurl_links"], false);
        assert_eq!(value["blocks"][2]["elements"][0]["text"], "*Repository:* acme/widgets");
        assert_eq!(value["blocks"][3]["elements"][0]["text"], "*Title:* FOR-482: fix bug");
        assert_eq!(
            value["blocks"][5]["text"]["text"],
            "cc <@U01FFMD8P7E>\nthanks @nobody"
        );
        assert_eq!(
            value["blocks"][6]["elements"][0]["url"],
            "https://github.com/acme/widgets/pull/17"
        );
        assert_eq!(
            value["blocks"][6]["elements"][1]["url"],
            "https://makersoftware.atlassian.net/browse/FOR-482"
        );
    }

    #[test]
    fn test_attach_fields_carries_color() {
        let notifier = Notifier::prepare(
            &env().with(ENV_SLACK_ATTACH_FIELDS, "true"),
            &RunOptions::default(),
        )
        .unwrap();
        let attachments = &notifier.notification.payload.attachments;
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].color, "good");
        assert_eq!(attachments[0].fields, notifier.notification.fields);
    }

    #[test]
    fn test_user_map_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.toml");
        std::fs::write(&path, "[users]\nnobody = \"U0NOBODY01\"\n").unwrap();

        let options = RunOptions {
            user_map: Some(path),
            ..Default::default()
        };
        let notifier = Notifier::prepare(&env(), &options).unwrap();
        let value = serde_json::to_value(&notifier.notification.payload).unwrap();
        assert_eq!(
            value["blocks"][5]["text"]["text"],
            "cc <@U01FFMD8P7E>\nthanks <@U0NOBODY01>"
        );
    }

    #[test]
    fn test_missing_user_map_is_config_error() {
        let env = env().with(ENV_SLACK_USER_MAP, "/nonexistent/users.toml");
        let err = Notifier::prepare(&env, &RunOptions::default()).err().unwrap();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::MappingFileError { .. })
        ));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_missing_message_is_exit_one() {
        let mut env = env();
        env.remove(ENV_SLACK_MESSAGE);
        let err = Notifier::prepare(&env, &RunOptions::default()).err().unwrap();
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().starts_with("Message is required"));
    }

    #[tokio::test]
    async fn test_dry_run_skips_delivery() {
        // Nothing listens on the discard port; a send would fail.
        let options = RunOptions {
            dry_run: true,
            ..Default::default()
        };
        let report = run(&env(), &options).await.unwrap();
        assert_eq!(report.delivery, Delivery::Skipped);
        assert_eq!(report.webhook_url, "http://127.0.0.1:9/hook");
        assert_eq!(report.message, "Ready for eyes");
        assert_eq!(report.notification.ticket_id, "FOR-482");
    }
}
