//! Manager that wraps source control implementations
use log::*;

use crate::{
    Result,
    source_control::{
        traits::SourceControl,
        types::{PullRequestRef, PullRequestSnapshot},
    },
};

pub struct SourceControlManager {
    client: Box<dyn SourceControl>,
}

impl SourceControlManager {
    pub fn new(client: Box<dyn SourceControl>) -> Self {
        Self { client }
    }

    pub async fn get_pull_request(
        &self,
        pr: &PullRequestRef,
    ) -> Result<PullRequestSnapshot> {
        self.client.get_pull_request(pr).await
    }

    /// Lazily walks the commit pages of a pull request from the first page.
    pub fn commit_pages<'a>(
        &'a self,
        pr: &'a PullRequestRef,
    ) -> CommitPager<'a> {
        CommitPager {
            client: self.client.as_ref(),
            pr,
            cursor: None,
            done: false,
        }
    }

    /// Collects the commit messages of every page. A failed page aborts
    /// the walk.
    pub async fn commit_messages(
        &self,
        pr: &PullRequestRef,
    ) -> Result<Vec<String>> {
        let mut pages = self.commit_pages(pr);
        let mut messages = vec![];

        while let Some(page) = pages.next_page().await? {
            messages.extend(page);
        }

        debug!("found {} commits for {pr}", messages.len());

        Ok(messages)
    }
}

/// Sequential cursor over commit pages. Finite and not restartable; request
/// a new pager to walk the pages again.
pub struct CommitPager<'a> {
    client: &'a dyn SourceControl,
    pr: &'a PullRequestRef,
    cursor: Option<String>,
    done: bool,
}

impl CommitPager<'_> {
    /// Returns the next page of messages, or `None` once the last page has
    /// been returned.
    pub async fn next_page(&mut self) -> Result<Option<Vec<String>>> {
        if self.done {
            return Ok(None);
        }

        let page = match self
            .client
            .get_commit_page(self.pr, self.cursor.take())
            .await
        {
            Ok(page) => page,
            Err(err) => {
                self.done = true;
                return Err(err);
            }
        };

        match page.next {
            Some(next) => self.cursor = Some(next),
            None => self.done = true,
        }

        Ok(Some(page.messages))
    }
}
