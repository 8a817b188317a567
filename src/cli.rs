//! CLI argument parsing and service credentials.
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use std::path::PathBuf;

use crate::{
    MarkIssuesError, Result, config::Config,
    source_control::types::PullRequestRef,
};

/// Global CLI arguments for credentials, configuration and debugging.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, global = true)]
    /// Path to the configuration file. Defaults to ./mark-issues.toml.
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "GITHUB_TOKEN",
        default_value = "",
        hide_env_values = true,
        global = true
    )]
    /// GitHub access token.
    pub github_token: String,

    #[arg(long, env = "JIRA_USERNAME", default_value = "", global = true)]
    /// Jira username.
    pub jira_username: String,

    #[arg(
        long,
        env = "JIRA_PASSWORD",
        default_value = "",
        hide_env_values = true,
        global = true
    )]
    /// Jira password or API token.
    pub jira_password: String,

    #[arg(long, env = "JIRA_ROOT", global = true)]
    /// Jira root url. Overrides `tracker.url` from the configuration file.
    pub jira_root: Option<String>,

    #[arg(
        long,
        env = "SLACK_WEBHOOK",
        default_value = "",
        hide_env_values = true,
        global = true
    )]
    /// Slack incoming webhook url used for changelogs.
    pub slack_webhook: String,

    #[arg(long, default_value_t = false, global = true)]
    /// Enable debug logging.
    pub debug: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Workflow subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Tag tickets referenced by a merged pull request with its deployment
    /// stage.
    MarkDeployed(PullRequestArgs),

    /// Send a changelog for a pull request merged into production.
    Changelog(PullRequestArgs),

    /// Filter a webhook payload and run every workflow it triggers.
    HandleEvent {
        #[arg(long)]
        /// Webhook event name, e.g. "pull_request".
        event: String,

        #[arg(long)]
        /// File containing the JSON webhook payload.
        payload: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
pub struct PullRequestArgs {
    #[arg(long)]
    /// Repository name within the configured organization.
    pub repo: String,

    #[arg(long)]
    /// Pull request number.
    pub number: u64,
}

impl From<&PullRequestArgs> for PullRequestRef {
    fn from(args: &PullRequestArgs) -> Self {
        PullRequestRef::new(args.repo.as_str(), args.number)
    }
}

impl Args {
    pub fn github_token(&self) -> SecretString {
        SecretString::from(self.github_token.clone())
    }

    pub fn jira_password(&self) -> SecretString {
        SecretString::from(self.jira_password.clone())
    }

    /// Applies command line overrides to the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(root) = &self.jira_root {
            config.tracker.url = root.trim_end_matches('/').to_string();
        }
    }

    /// Fails early when the tracker has no credentials.
    pub fn require_tracker_credentials(&self) -> Result<()> {
        if self.jira_username.is_empty() || self.jira_password.is_empty() {
            return Err(MarkIssuesError::invalid_config(
                "must set jira username and password",
            ));
        }

        Ok(())
    }
}
