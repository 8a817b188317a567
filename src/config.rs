//! Configuration loading and parsing for `mark-issues.toml` files.
//!
//! Every section is optional; missing values fall back to the defaults the
//! service has always run with. Secrets never live here, they are supplied
//! on the command line or through the environment.
use log::*;
use serde::Deserialize;
use std::{
    collections::{BTreeMap, HashSet},
    path::Path,
    time::Duration,
};
use tokio::fs;

use crate::{MarkIssuesError, Result, issue_key::compile_pattern};

/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "mark-issues.toml";
/// Hard ceiling on issue keys per tracker search request.
pub const MAX_BATCH_SIZE: usize = 50;
/// Default pattern for issue keys, compiled case-insensitively over ASCII.
pub const DEFAULT_ISSUE_PATTERN: &str = r"[A-Za-z]{1,10}-[0-9]+";
/// Canonical project prefix legacy prefixes are rewritten to.
pub const DEFAULT_CANONICAL_PREFIX: &str = "DASH-";

/// Branch groups mapped to deployment stages.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BranchConfig {
    /// Branches whose merges deploy to production.
    pub production: Vec<String>,
    /// Branches whose merges deploy to staging.
    pub staging: Vec<String>,
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            production: vec!["master".into()],
            staging: vec!["devel".into(), "development".into()],
        }
    }
}

impl BranchConfig {
    /// True if the branch belongs to either group.
    pub fn is_allowed(&self, branch: &str) -> bool {
        self.production.iter().any(|b| b == branch)
            || self.staging.iter().any(|b| b == branch)
    }
}

/// Issue key extraction settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IssueConfig {
    pub pattern: String,
    /// Literal prefixes rewritten before matching (e.g. "FRONT-" -> "DASH-").
    pub prefix_remaps: BTreeMap<String, String>,
}

impl Default for IssueConfig {
    fn default() -> Self {
        let prefix_remaps = ["FRONT-", "SYNGUI-"]
            .into_iter()
            .map(|p| (p.to_string(), DEFAULT_CANONICAL_PREFIX.to_string()))
            .collect();

        Self {
            pattern: DEFAULT_ISSUE_PATTERN.into(),
            prefix_remaps,
        }
    }
}

/// Source control API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_url: String,
    /// Organization owning every repository named in webhook events.
    pub org: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".into(),
            org: "syncano".into(),
        }
    }
}

/// Issue tracker settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Tracker root, e.g. "https://example.atlassian.net".
    pub url: String,
    /// Multi-select custom field holding deployment stages.
    pub deployed_to_field: String,
    /// Custom field holding the parent epic key.
    pub epic_link_field: String,
    pub batch_size: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            url: "".into(),
            deployed_to_field: "customfield_10200".into(),
            epic_link_field: "customfield_10007".into(),
            batch_size: MAX_BATCH_SIZE,
        }
    }
}

/// Changelog notification settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub channel: String,
    pub username: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            channel: "".into(),
            username: "Changelog".into(),
        }
    }
}

/// Fixed retry policy applied to every task.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 4,
            delay_secs: 60 * 15,
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Root configuration structure for `mark-issues.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Webhook event names the receiver forwards.
    pub allowed_events: Vec<String>,
    pub branches: BranchConfig,
    pub issues: IssueConfig,
    pub github: GithubConfig,
    pub tracker: TrackerConfig,
    pub notifier: NotifierConfig,
    pub retry: RetryConfig,
    pub http: HttpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allowed_events: vec!["pull_request".into(), "release".into()],
            branches: BranchConfig::default(),
            issues: IssueConfig::default(),
            github: GithubConfig::default(),
            tracker: TrackerConfig::default(),
            notifier: NotifierConfig::default(),
            retry: RetryConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Parse and validate configuration from TOML content.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] in the
    /// working directory when no path is given. An explicit path must exist;
    /// a missing default file yields the defaults.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p, true),
            None => (Path::new(DEFAULT_CONFIG_FILE), false),
        };

        if !required && !fs::try_exists(path).await? {
            info!("no configuration found: using default");
            let config = Config::default();
            config.validate()?;
            return Ok(config);
        }

        debug!("loading configuration from {}", path.display());
        let content = fs::read_to_string(path).await?;
        Self::from_toml(&content)
    }

    pub fn is_allowed_event(&self, event: &str) -> bool {
        self.allowed_events.iter().any(|e| e == event)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let production: HashSet<&String> =
            self.branches.production.iter().collect();

        if let Some(branch) = self
            .branches
            .staging
            .iter()
            .find(|b| production.contains(b))
        {
            return Err(MarkIssuesError::invalid_config(format!(
                "branch \"{branch}\" is configured for both production and staging"
            )));
        }

        if self.tracker.batch_size == 0
            || self.tracker.batch_size > MAX_BATCH_SIZE
        {
            return Err(MarkIssuesError::invalid_config(format!(
                "tracker batch_size must be between 1 and {MAX_BATCH_SIZE}, got {}",
                self.tracker.batch_size
            )));
        }

        compile_pattern(&self.issues.pattern)?;

        Ok(())
    }
}
