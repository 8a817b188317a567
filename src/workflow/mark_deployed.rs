//! Tags referenced tickets with the stage their pull request deployed to.
use log::*;
use serde_json::{Map, Value, json};

use crate::{
    Result,
    deployment::DeploymentStage,
    source_control::types::PullRequestRef,
    tracker::{
        query::JqlPolicy,
        types::{TicketRecord, UpdateIssueRequest},
    },
    workflow::{Outcome, SkipReason, Workflows, skipped, unmerged_reason},
};

impl Workflows {
    /// Appends the deployment stage of the pull request's base branch to the
    /// "deployed to" field of every referenced ticket not yet marked with it.
    ///
    /// Updates are written one by one; a failed update aborts the run without
    /// undoing earlier updates. A rerun after such a failure only revisits
    /// tickets the search still selects.
    pub async fn mark_deployed(&self, pr: &PullRequestRef) -> Result<Outcome> {
        let snapshot = self.source_control.get_pull_request(pr).await?;

        if let Some(reason) = unmerged_reason(&snapshot) {
            return Ok(skipped(pr, reason));
        }

        let branch = snapshot.base_branch();

        let Some(stage) =
            DeploymentStage::for_branch(&self.config.branches, branch)
        else {
            return Ok(skipped(
                pr,
                SkipReason::UnsupportedBranch(branch.to_string()),
            ));
        };

        let keys = self.issue_keys(pr, &snapshot).await?;

        if keys.is_empty() {
            return Ok(skipped(pr, SkipReason::NoIssues));
        }

        let field = self.config.tracker.deployed_to_field.as_str();
        let policy = JqlPolicy::DeploymentStatus(stage);

        let tickets = self
            .tracker
            .search_by_keys(&keys, Some(&["key", field][..]), |batch| {
                policy.build(batch)
            })
            .await?;

        info!("{} issues needs to be updated", tickets.len());

        for ticket in tickets.iter() {
            info!("updating issue {}", ticket.key);
            self.tracker
                .update_issue(stage_update(ticket, field, stage))
                .await?;
        }

        Ok(Outcome::Marked {
            stage,
            updated: tickets.len(),
        })
    }
}

/// Existing entries are kept and the stage is appended, even if an equal
/// entry is already present.
fn stage_update(
    ticket: &TicketRecord,
    field: &str,
    stage: DeploymentStage,
) -> UpdateIssueRequest {
    let mut values = ticket.multi_values(field);
    values.push(json!({ "value": stage.as_str() }));

    let mut fields = Map::new();
    fields.insert(field.to_string(), Value::Array(values));

    UpdateIssueRequest {
        key: ticket.key.clone(),
        fields,
    }
}
