use serde::Deserialize;
use std::fmt;

/// Identifies the pull request a task works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub repository: String,
    pub number: u64,
}

impl PullRequestRef {
    pub fn new(repository: impl Into<String>, number: u64) -> Self {
        Self {
            repository: repository.into(),
            number,
        }
    }
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repository, self.number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestState {
    Open,
    Closed,
    #[serde(other)]
    Other,
}

impl fmt::Display for PullRequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::Closed => f.write_str("closed"),
            Self::Other => f.write_str("other"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BranchRef {
    #[serde(rename = "ref")]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Actor {
    pub login: String,
}

/// Pull request metadata as fetched once per task run.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestSnapshot {
    pub state: PullRequestState,
    #[serde(default)]
    pub merged: bool,
    pub base: BranchRef,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(default)]
    pub merged_by: Option<Actor>,
    #[serde(default)]
    pub commits_url: Option<String>,
}

impl PullRequestSnapshot {
    /// Only closed and merged pull requests are acted upon.
    pub fn is_merged(&self) -> bool {
        self.state == PullRequestState::Closed && self.merged
    }

    pub fn base_branch(&self) -> &str {
        &self.base.name
    }

    pub fn merged_by_login(&self) -> &str {
        self.merged_by
            .as_ref()
            .map(|a| a.login.as_str())
            .unwrap_or_default()
    }
}

// GitHub sends `"body": null` for pull requests without a description
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// One page of commit messages and the cursor to the next page, if any.
#[derive(Debug, Clone, Default)]
pub struct CommitPage {
    pub messages: Vec<String>,
    pub next: Option<String>,
}
