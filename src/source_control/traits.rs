//! Traits related to source control platforms
use async_trait::async_trait;

use crate::{
    Result,
    source_control::types::{CommitPage, PullRequestRef, PullRequestSnapshot},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Fetch pull request metadata. Non-2xx responses are upstream errors.
    async fn get_pull_request(
        &self,
        pr: &PullRequestRef,
    ) -> Result<PullRequestSnapshot>;

    /// Fetch one page of commit messages. `cursor` is `None` for the first
    /// page and otherwise the `next` value of the previous page.
    async fn get_commit_page(
        &self,
        pr: &PullRequestRef,
        cursor: Option<String>,
    ) -> Result<CommitPage>;
}
