//! Tasks dispatched for accepted events and the in-process retry runner
//! that executes them.
use async_trait::async_trait;
use log::*;
use std::{fmt, sync::Arc, time::Duration};

use crate::{
    Result, config::RetryConfig, source_control::types::PullRequestRef,
    workflow::Outcome,
};

/// A unit of work for one pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    MarkDeployed(PullRequestRef),
    SendChangelog(PullRequestRef),
}

impl Task {
    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MarkDeployed(_) => "MarkIssues",
            Self::SendChangelog(_) => "SendChangelog",
        }
    }

    pub fn pull_request(&self) -> &PullRequestRef {
        match self {
            Self::MarkDeployed(pr) | Self::SendChangelog(pr) => pr,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.pull_request())
    }
}

/// Runs a single attempt of a task.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn run(&self, task: &Task) -> Result<Outcome>;
}

/// Fixed-delay retry schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delay: config.delay(),
        }
    }
}

pub struct TaskRunner {
    handler: Arc<dyn TaskHandler>,
    policy: RetryPolicy,
}

impl TaskRunner {
    pub fn new(handler: Arc<dyn TaskHandler>, policy: RetryPolicy) -> Self {
        Self { handler, policy }
    }

    /// Runs `task` until it succeeds or `max_retries` retries have failed.
    /// Every retry re-runs the whole task. The last error is returned once
    /// retries are exhausted.
    pub async fn execute(&self, task: &Task) -> Result<Outcome> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!("running {task}: attempt {attempt}");

            match self.handler.run(task).await {
                Ok(outcome) => {
                    info!("{task} finished: {outcome:?}");
                    return Ok(outcome);
                }
                Err(err) if attempt > self.policy.max_retries => {
                    error!("{task} failed after {attempt} attempts: {err}");
                    return Err(err);
                }
                Err(err) => {
                    warn!(
                        "{task} failed on attempt {attempt}, retrying in {}s: {err}",
                        self.policy.delay.as_secs()
                    );
                    tokio::time::sleep(self.policy.delay).await;
                }
            }
        }
    }

    /// Executes tasks in order, collecting each result. A failed task does
    /// not prevent the remaining ones from running.
    pub async fn execute_all(&self, tasks: &[Task]) -> Vec<Result<Outcome>> {
        let mut results = Vec::with_capacity(tasks.len());

        for task in tasks {
            results.push(self.execute(task).await);
        }

        results
    }
}
