//! prready core library.
//!
//! Builds the "pull request ready for review" Slack message from CI
//! environment variables and delivers it to an incoming webhook:
//! configuration, display field selection, mention and ticket resolution,
//! typed Block Kit payloads, and the webhook sender.

pub mod config;
pub mod errors;
pub mod fields;
pub mod identity;
pub mod notify;
pub mod payload;
pub mod pipeline;
pub mod ticket;

// Re-exports for convenience.
pub use config::{EnvSnapshot, EnvSource, NotifyConfig, ProcessEnv};
pub use errors::CoreError;
pub use identity::UserDirectory;
pub use pipeline::{build_notification, Notification, Notifier};
