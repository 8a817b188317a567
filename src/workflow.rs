//! Workflows run for a merged pull request: tagging tickets with their
//! deployment stage and announcing production releases.
use async_trait::async_trait;
use derive_builder::Builder;
use log::*;
use std::{collections::BTreeSet, fmt, sync::Arc};

use crate::{
    MarkIssuesError, Result,
    config::Config,
    deployment::DeploymentStage,
    issue_key::{IssueKey, KeyExtractor},
    notifier::traits::Notifier,
    source_control::{
        manager::SourceControlManager,
        types::{PullRequestRef, PullRequestSnapshot, PullRequestState},
    },
    task::{Task, TaskHandler},
    tracker::manager::TrackerManager,
};

pub mod changelog;
pub mod mark_deployed;

/// Why a workflow ended without side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotClosed(PullRequestState),
    NotMerged,
    UnsupportedBranch(String),
    NoIssues,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotClosed(state) => {
                write!(f, "unsupported state of pull request \"{state}\"")
            }
            Self::NotMerged => f.write_str("pull request needs to be merged"),
            Self::UnsupportedBranch(branch) => {
                write!(f, "unsupported \"{branch}\" branch")
            }
            Self::NoIssues => f.write_str("no issues referenced"),
        }
    }
}

/// Terminal state of one workflow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    Marked {
        stage: DeploymentStage,
        updated: usize,
    },
    ChangelogSent {
        issues: usize,
        groups: usize,
    },
}

#[derive(Builder)]
#[builder(setter(into), build_fn(private, name = "_build"))]
pub struct WorkflowParams {
    pub config: Arc<Config>,
    pub source_control: Arc<SourceControlManager>,
    pub tracker: Arc<TrackerManager>,
    pub notifier: Arc<dyn Notifier>,
}

impl WorkflowParamsBuilder {
    pub fn build(&self) -> Result<Workflows> {
        let params = self._build().map_err(|e| {
            MarkIssuesError::invalid_config(format!(
                "Failed to build workflows: {}",
                e
            ))
        })?;
        Workflows::new(params)
    }
}

/// Shared collaborators for both workflows. Holds no per-run state, so one
/// instance may serve concurrent runs.
pub struct Workflows {
    config: Arc<Config>,
    source_control: Arc<SourceControlManager>,
    tracker: Arc<TrackerManager>,
    notifier: Arc<dyn Notifier>,
    extractor: KeyExtractor,
}

impl Workflows {
    pub fn builder() -> WorkflowParamsBuilder {
        WorkflowParamsBuilder::default()
    }

    pub fn new(params: WorkflowParams) -> Result<Self> {
        let extractor = KeyExtractor::new(&params.config.issues)?;

        Ok(Self {
            config: params.config,
            source_control: params.source_control,
            tracker: params.tracker,
            notifier: params.notifier,
            extractor,
        })
    }

    ////////////////////////////////////////////////////////////////////////////
    //// private
    ////////////////////////////////////////////////////////////////////////////

    /// Keys referenced by the title, body and every commit message.
    async fn issue_keys(
        &self,
        pr: &PullRequestRef,
        snapshot: &PullRequestSnapshot,
    ) -> Result<BTreeSet<IssueKey>> {
        info!("fetching issues for {pr}");

        let mut texts = self.source_control.commit_messages(pr).await?;
        texts.push(snapshot.title.clone());
        texts.push(snapshot.body.clone());

        let keys = self.extractor.extract(&texts);

        info!("{} issues found", keys.len());

        Ok(keys)
    }
}

/// Only pull requests closed by a merge are acted upon.
fn unmerged_reason(snapshot: &PullRequestSnapshot) -> Option<SkipReason> {
    if snapshot.state != PullRequestState::Closed {
        return Some(SkipReason::NotClosed(snapshot.state.clone()));
    }

    if !snapshot.merged {
        return Some(SkipReason::NotMerged);
    }

    None
}

fn skipped(pr: &PullRequestRef, reason: SkipReason) -> Outcome {
    info!("skipping {pr}: {reason}");
    Outcome::Skipped(reason)
}

#[async_trait]
impl TaskHandler for Workflows {
    async fn run(&self, task: &Task) -> Result<Outcome> {
        match task {
            Task::MarkDeployed(pr) => self.mark_deployed(pr).await,
            Task::SendChangelog(pr) => self.send_changelog(pr).await,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::{test_helpers::*, *};
    use crate::{
        notifier::traits::MockNotifier, tracker::traits::MockTracker,
    };

    #[test]
    fn builder_requires_every_collaborator() {
        let result = Workflows::builder()
            .config(Arc::new(test_config()))
            .build();

        assert!(matches!(result, Err(MarkIssuesError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn task_handler_routes_tasks() {
        let source = source_control(
            snapshot("open", false, "master", "", ""),
            &[],
        );
        let workflows =
            workflows(source, MockTracker::new(), MockNotifier::new());
        let pr = PullRequestRef::new("api", 1);

        let outcome =
            workflows.run(&Task::MarkDeployed(pr.clone())).await.unwrap();
        assert_eq!(
            outcome,
            Outcome::Skipped(SkipReason::NotClosed(PullRequestState::Open))
        );

        let outcome = workflows.run(&Task::SendChangelog(pr)).await.unwrap();
        assert_eq!(
            outcome,
            Outcome::Skipped(SkipReason::NotClosed(PullRequestState::Open))
        );
    }

    #[test]
    fn only_closed_and_merged_pull_requests_proceed() {
        let open = snapshot("open", false, "master", "", "");
        let closed = snapshot("closed", false, "master", "", "");
        let merged = snapshot("closed", true, "master", "", "");

        assert_eq!(
            unmerged_reason(&open),
            Some(SkipReason::NotClosed(PullRequestState::Open))
        );
        assert_eq!(unmerged_reason(&closed), Some(SkipReason::NotMerged));
        assert_eq!(unmerged_reason(&merged), None);
    }

    #[test]
    fn skip_reasons_read_as_log_lines() {
        assert_eq!(
            SkipReason::UnsupportedBranch("feature".into()).to_string(),
            "unsupported \"feature\" branch"
        );
        assert_eq!(
            SkipReason::NotClosed(PullRequestState::Open).to_string(),
            "unsupported state of pull request \"open\""
        );
    }
}
