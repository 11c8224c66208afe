//! End-to-end delivery tests against a mock webhook.
//!
//! These tests exercise the real `Notifier` with:
//! - an in-memory `EnvSnapshot` instead of the process environment
//! - a `wiremock` server standing in for the Slack webhook
//!
//! No external network I/O: every request goes to 127.0.0.1.

use serde_json::Value;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use prready_core::config::*;
use prready_core::errors::{ConfigError, CoreError, NotificationError};
use prready_core::pipeline::{run, Delivery, Notifier, RunOptions};

// ===========================================================================
// Helpers
// ===========================================================================

fn ci_env(webhook_url: &str) -> EnvSnapshot {
    [
        (ENV_SLACK_WEBHOOK, webhook_url),
        (ENV_SLACK_MESSAGE, "PR ready"),
        (ENV_SLACK_TITLE, "Message"),
        (ENV_SLACK_USERNAME, "Review Bot"),
        (ENV_SLACK_CHANNEL, "#reviews"),
        (ENV_PR_TITLE, "FOR-482: fix bug"),
        (ENV_PR_NUMBER, "17"),
        (ENV_PR_BODY, "Summary\n\ncc @alex"),
        (ENV_GITHUB_ACTOR, "octocat"),
        (ENV_GITHUB_SERVER_URL, "https://github.com"),
        (ENV_GITHUB_REPOSITORY, "acme/widgets"),
        (ENV_GITHUB_REF, "refs/pull/17/merge"),
        (ENV_GITHUB_EVENT_NAME, "pull_request"),
        (ENV_GITHUB_WORKFLOW, ".github/workflows/pr.yml"),
        (ENV_GITHUB_SHA, "0123456789abcdef0123456789abcdef01234567"),
    ]
    .into_iter()
    .collect()
}

async fn mock_webhook(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

/// A URL on a port nothing is listening on.
fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/hook", addr)
}

// ===========================================================================
// Tests
// ===========================================================================

#[tokio::test]
async fn test_no_content_is_success() {
    let server = mock_webhook(204).await;
    let env = ci_env(&format!("{}/hook", server.uri()));

    let report = run(&env, &RunOptions::default())
        .await
        .expect("delivery should succeed");
    assert_eq!(report.delivery, Delivery::Sent(reqwest::StatusCode::NO_CONTENT));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["username"], "Review Bot");
    assert_eq!(body["channel"], "#reviews");
    assert_eq!(body["unfurl_links"], false);
    assert!(body.get("text").is_none());
    assert!(body.get("attachments").is_none());

    let blocks = body["blocks"].as_array().unwrap();
    assert_eq!(blocks.len(), 7);
    assert_eq!(blocks[5]["text"]["text"], "Summary\n\ncc <@U01FFMD8P7E>");
    assert_eq!(
        blocks[0]["elements"][0]["image_url"],
        "https://github.com/octocat.png?size=32"
    );
}

#[tokio::test]
async fn test_not_found_is_rejected() {
    let server = mock_webhook(404).await;
    let env = ci_env(&format!("{}/hook", server.uri()));

    let err = run(&env, &RunOptions::default()).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Notification(NotificationError::Rejected { .. })
    ));
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("404"));
    assert!(err.to_string().contains("Not Found"));
}

#[tokio::test]
async fn test_redirect_status_is_rejected() {
    let server = mock_webhook(300).await;
    let env = ci_env(&format!("{}/hook", server.uri()));

    let err = run(&env, &RunOptions::default()).await.unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let env = ci_env(&refused_url());

    let err = run(&env, &RunOptions::default()).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Notification(NotificationError::Transport(_))
    ));
    assert_eq!(err.exit_code(), 2);
    // The underlying cause must reach the user, not just "error sending request".
    assert!(err.to_string().to_lowercase().contains("refused"));
}

#[tokio::test]
async fn test_missing_message_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut env = ci_env(&format!("{}/hook", server.uri()));
    env.remove(ENV_SLACK_MESSAGE);

    let err = run(&env, &RunOptions::default()).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Config(ConfigError::MissingRequired { .. })
    ));
    assert_eq!(err.exit_code(), 1);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_prepare_then_deliver_with_attached_fields() {
    let server = mock_webhook(200).await;
    let env = ci_env(&format!("{}/hook", server.uri()))
        .with(ENV_SLACK_ATTACH_FIELDS, "true")
        .with(ENV_SLACK_COLOR, "#2eb886")
        .with(ENV_MINIMAL, "commit,ref");

    let notifier = Notifier::prepare(&env, &RunOptions::default()).unwrap();
    let titles: Vec<&str> = notifier
        .notification
        .fields
        .iter()
        .map(|f| f.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Ref", "Commit", "Message"]);

    let status = notifier.deliver().await.unwrap();
    assert!(status.is_success());

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let attachment = &body["attachments"][0];
    assert_eq!(attachment["color"], "#2eb886");
    assert_eq!(attachment["fields"][0]["title"], "Ref");
    assert_eq!(attachment["fields"][0]["short"], true);
    assert_eq!(attachment["fields"][2]["value"], "PR ready");
    assert!(attachment["fields"][2].get("short").is_none());
}

#[tokio::test]
async fn test_dry_run_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let env = ci_env(&format!("{}/hook", server.uri()));
    let options = RunOptions {
        dry_run: true,
        ..Default::default()
    };

    let report = run(&env, &options).await.unwrap();
    assert_eq!(report.delivery, Delivery::Skipped);
    assert_eq!(report.message, "PR ready");
    assert_eq!(report.notification.payload.blocks.len(), 7);
    assert!(server.received_requests().await.unwrap().is_empty());
}
