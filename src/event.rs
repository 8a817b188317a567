//! Filtering of source control webhook events down to merged pull requests.
use log::*;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    MarkIssuesError, Result, config::Config,
    source_control::types::PullRequestRef, task::Task,
};

const PULL_REQUEST_EVENT: &str = "pull_request";

#[derive(Debug, Deserialize)]
struct PullRequestEvent {
    action: String,
    pull_request: EventPullRequest,
    repository: EventRepository,
}

#[derive(Debug, Deserialize)]
struct EventPullRequest {
    number: u64,
    merged: bool,
    base: EventBranch,
}

#[derive(Debug, Deserialize)]
struct EventBranch {
    #[serde(rename = "ref")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct EventRepository {
    name: String,
}

/// Returns the pull request an event refers to when it is a merge into a
/// configured branch, or `None` when the event needs no work.
pub fn filter_event(
    event: &str,
    payload: &Value,
    config: &Config,
) -> Result<Option<PullRequestRef>> {
    if !config.is_allowed_event(event) {
        info!("ignoring event \"{event}\": not allowed");
        return Ok(None);
    }

    if event != PULL_REQUEST_EVENT {
        debug!("ignoring event \"{event}\": no workflow");
        return Ok(None);
    }

    let parsed = PullRequestEvent::deserialize(payload).map_err(|e| {
        MarkIssuesError::invalid_event(format!(
            "malformed {event} payload: {e}"
        ))
    })?;

    let pr = PullRequestRef::new(
        parsed.repository.name,
        parsed.pull_request.number,
    );

    if parsed.action != "closed" {
        debug!("ignoring {pr}: action \"{}\"", parsed.action);
        return Ok(None);
    }

    if !parsed.pull_request.merged {
        debug!("ignoring {pr}: closed without merge");
        return Ok(None);
    }

    let base = parsed.pull_request.base.name;

    if !config.branches.is_allowed(&base) {
        debug!("ignoring {pr}: base branch \"{base}\" is not tracked");
        return Ok(None);
    }

    info!("accepted {event} event for {pr}");

    Ok(Some(pr))
}

/// Tasks dispatched for an accepted pull request. The changelog task skips
/// itself for non-production branches.
pub fn tasks_for(pr: &PullRequestRef) -> Vec<Task> {
    vec![Task::MarkDeployed(pr.clone()), Task::SendChangelog(pr.clone())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(action: &str, merged: bool, base: &str) -> Value {
        json!({
            "action": action,
            "number": 42,
            "pull_request": {
                "number": 42,
                "merged": merged,
                "base": { "ref": base }
            },
            "repository": { "name": "dashboard", "full_name": "syncano/dashboard" }
        })
    }

    #[test]
    fn accepts_merged_pull_request_into_tracked_branch() {
        let config = Config::default();

        for base in ["master", "devel", "development"] {
            let pr = filter_event(
                "pull_request",
                &payload("closed", true, base),
                &config,
            )
            .unwrap();

            assert_eq!(pr, Some(PullRequestRef::new("dashboard", 42)));
        }
    }

    #[test]
    fn ignores_unmerged_or_open_pull_requests() {
        let config = Config::default();

        for event in [
            payload("closed", false, "master"),
            payload("opened", false, "master"),
            payload("synchronize", false, "devel"),
        ] {
            assert_eq!(
                filter_event("pull_request", &event, &config).unwrap(),
                None
            );
        }
    }

    #[test]
    fn ignores_untracked_branches() {
        let pr = filter_event(
            "pull_request",
            &payload("closed", true, "feature/login"),
            &Config::default(),
        )
        .unwrap();

        assert_eq!(pr, None);
    }

    #[test]
    fn ignores_other_events() {
        let config = Config::default();
        let body = payload("closed", true, "master");

        assert_eq!(filter_event("release", &body, &config).unwrap(), None);
        assert_eq!(filter_event("push", &body, &config).unwrap(), None);
    }

    #[test]
    fn malformed_payload_is_invalid_event() {
        let err = filter_event(
            "pull_request",
            &json!({ "action": "closed" }),
            &Config::default(),
        )
        .unwrap_err();

        assert!(matches!(err, MarkIssuesError::InvalidEvent(_)));
    }

    #[test]
    fn dispatches_both_workflows() {
        let pr = PullRequestRef::new("dashboard", 42);

        assert_eq!(
            tasks_for(&pr),
            vec![Task::MarkDeployed(pr.clone()), Task::SendChangelog(pr)]
        );
    }
}
