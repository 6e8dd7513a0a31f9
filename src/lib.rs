//! # jtimer - Jira worklog timer
//!
//! Tracks work time against a Jira issue with pause and resume, then posts
//! it as one worklog or one worklog per work period. Worklogs Jira does not
//! accept are kept in an offline queue and replayed on the next run.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use jtimer::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod api;
pub mod commands;
pub mod libs;
