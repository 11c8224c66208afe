//! Mapping from GitHub-style handles to Slack user ids.
//!
//! The directory is built once at startup from the built-in team table,
//! optionally overlaid with a TOML mapping file, and then passed to whatever
//! needs to rewrite `@mentions`.

pub mod directory;
pub mod mapping_file;

pub use directory::UserDirectory;
