//! Tags issue tracker tickets referenced by merged pull requests with the
//! stage they were deployed to and announces production releases.
pub mod cli;
pub mod config;
pub mod deployment;
pub mod error;
pub mod event;
pub mod http;
pub mod issue_key;
pub mod notifier;
pub mod source_control;
pub mod task;
pub mod tracker;
pub mod workflow;

pub use error::{MarkIssuesError, Result};
