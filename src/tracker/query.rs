//! JQL policies for selecting tickets in a batch of keys.
use crate::{deployment::DeploymentStage, issue_key::IssueKey};

/// How a batch of keys is turned into a search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JqlPolicy {
    /// Only tickets not yet marked as deployed to the stage.
    DeploymentStatus(DeploymentStage),
    /// Every ticket matching the keys.
    Plain,
}

impl JqlPolicy {
    pub fn build(&self, batch: &[IssueKey]) -> String {
        match self {
            Self::DeploymentStatus(stage) => {
                let keys = batch
                    .iter()
                    .map(IssueKey::as_str)
                    .collect::<Vec<_>>()
                    .join(",");
                format!(
                    r#"("Deployed to" != {stage} OR "Deployed to" = EMPTY) AND issuekey in ({keys})"#
                )
            }
            Self::Plain => {
                let keys = batch
                    .iter()
                    .map(IssueKey::as_str)
                    .collect::<Vec<_>>()
                    .join(r#"",""#);
                format!(r#"issuekey in ("{keys}")"#)
            }
        }
    }
}
