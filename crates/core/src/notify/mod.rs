//! Notification delivery.
//!
//! Only Slack-compatible incoming webhooks are supported.

pub mod slack;

pub use slack::SlackNotifier;
