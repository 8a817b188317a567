//! Builds and sends the release digest for merges into production.
use log::*;

use crate::{
    Result,
    config::{NotifierConfig, TrackerConfig},
    deployment::DeploymentStage,
    notifier::types::{Attachment, AttachmentField, Message},
    source_control::types::{PullRequestRef, PullRequestSnapshot},
    tracker::{query::JqlPolicy, types::TicketRecord},
    workflow::{Outcome, SkipReason, Workflows, skipped, unmerged_reason},
};

/// Color of the summary block and of unrecognized issue types.
pub const DEFAULT_COLOR: &str = "#C3C3C3";

/// Display color for an issue type.
pub fn issue_type_color(issue_type: &str) -> &'static str {
    match issue_type {
        "Task" => "#3B7FC4",
        "Bug" => "#D04437",
        "Story" => "#67AB49",
        "Epic" => "#654982",
        _ => DEFAULT_COLOR,
    }
}

/// Display lines for all tickets of one issue type.
#[derive(Debug, Clone, PartialEq)]
pub struct DigestGroup {
    pub issue_type: String,
    pub fallback: Vec<String>,
    pub text: Vec<String>,
}

impl DigestGroup {
    fn attachment(&self) -> Attachment {
        Attachment {
            color: issue_type_color(&self.issue_type).into(),
            title: None,
            text: Some(self.text.join("\n")),
            fallback: Some(self.fallback.join("\n")),
            fields: vec![
                AttachmentField::short("Issue type", self.issue_type.as_str()),
                AttachmentField::short("Total", self.text.len()),
            ],
        }
    }
}

/// Tickets of a release grouped by issue type, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangelogDigest {
    pub groups: Vec<DigestGroup>,
}

impl ChangelogDigest {
    pub fn build(tickets: &[TicketRecord], tracker: &TrackerConfig) -> Self {
        let mut digest = Self::default();
        let browse = |key: &str| format!("{}/browse/{key}", tracker.url);

        for ticket in tickets {
            let issue_type = ticket.issue_type().unwrap_or_default();
            let key = ticket.key.as_str();
            let url = browse(key);
            let summary = ticket.summary();
            let epic_key =
                ticket.text(&tracker.epic_link_field).unwrap_or_default();
            let epic_url = browse(epic_key);

            let index = match digest
                .groups
                .iter()
                .position(|g| g.issue_type == issue_type)
            {
                Some(index) => index,
                None => {
                    digest.groups.push(DigestGroup {
                        issue_type: issue_type.to_string(),
                        fallback: vec![],
                        text: vec![],
                    });
                    digest.groups.len() - 1
                }
            };

            let group = &mut digest.groups[index];
            group
                .fallback
                .push(format!("[{key}] {summary}: {url} Epic: [{epic_key}]"));
            group.text.push(format!(
                "<{url}|[{key}]> {summary} Epic <{epic_url}|[{epic_key}]>"
            ));
        }

        digest
    }

    /// Message with one summary block followed by one block per group.
    pub fn message(
        &self,
        pr: &PullRequestRef,
        snapshot: &PullRequestSnapshot,
        notifier: &NotifierConfig,
    ) -> Message {
        let summary = Attachment {
            color: DEFAULT_COLOR.into(),
            title: Some("There was a new release".into()),
            text: None,
            fallback: None,
            fields: vec![
                AttachmentField::short("Project", pr.repository.as_str()),
                AttachmentField::short("Pull request", snapshot.title.as_str()),
                AttachmentField::short(
                    "Release done by",
                    snapshot.merged_by_login(),
                ),
            ],
        };

        let mut attachments = vec![summary];
        attachments.extend(self.groups.iter().map(DigestGroup::attachment));

        Message {
            username: notifier.username.clone(),
            channel: notifier.channel.clone(),
            attachments,
        }
    }
}

impl Workflows {
    /// Sends a digest of every referenced ticket when a pull request is
    /// merged into a production branch.
    pub async fn send_changelog(&self, pr: &PullRequestRef) -> Result<Outcome> {
        let snapshot = self.source_control.get_pull_request(pr).await?;

        if let Some(reason) = unmerged_reason(&snapshot) {
            return Ok(skipped(pr, reason));
        }

        let branch = snapshot.base_branch();

        if DeploymentStage::for_branch(&self.config.branches, branch)
            != Some(DeploymentStage::Production)
        {
            return Ok(skipped(
                pr,
                SkipReason::UnsupportedBranch(branch.to_string()),
            ));
        }

        let keys = self.issue_keys(pr, &snapshot).await?;

        if keys.is_empty() {
            return Ok(skipped(pr, SkipReason::NoIssues));
        }

        let tracker = &self.config.tracker;
        let fields = ["issuetype", "summary", tracker.epic_link_field.as_str()];

        let tickets = self
            .tracker
            .search_by_keys(&keys, Some(&fields[..]), |batch| {
                JqlPolicy::Plain.build(batch)
            })
            .await?;

        let digest = ChangelogDigest::build(&tickets, tracker);
        let message = digest.message(pr, &snapshot, &self.config.notifier);

        info!(
            "sending changelog for {pr} with {} issues in {} groups",
            tickets.len(),
            digest.groups.len()
        );

        self.notifier.send(&message).await?;

        Ok(Outcome::ChangelogSent {
            issues: tickets.len(),
            groups: digest.groups.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        MarkIssuesError,
        notifier::traits::MockNotifier,
        tracker::traits::MockTracker,
        workflow::test_helpers::*,
    };
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    fn ticket(
        key: &str,
        issue_type: &str,
        summary: &str,
        epic: Value,
    ) -> TicketRecord {
        serde_json::from_value(json!({
            "key": key,
            "fields": {
                "issuetype": { "name": issue_type },
                "summary": summary,
                "customfield_10007": epic
            }
        }))
        .unwrap()
    }

    fn pr() -> PullRequestRef {
        PullRequestRef::new("dashboard", 99)
    }

    #[test]
    fn groups_tickets_by_type_in_order_of_appearance() {
        let tickets = vec![
            ticket("DASH-1", "Bug", "Crash", json!("DASH-100")),
            ticket("DASH-2", "Story", "Login", json!("DASH-100")),
            ticket("DASH-3", "Bug", "Typo", Value::Null),
        ];

        let digest = ChangelogDigest::build(&tickets, &test_config().tracker);

        assert_eq!(digest.groups.len(), 2);
        assert_eq!(digest.groups[0].issue_type, "Bug");
        assert_eq!(digest.groups[1].issue_type, "Story");
        assert_eq!(
            digest.groups[0].fallback,
            vec![
                format!("[DASH-1] Crash: {TRACKER_URL}/browse/DASH-1 Epic: [DASH-100]"),
                format!("[DASH-3] Typo: {TRACKER_URL}/browse/DASH-3 Epic: []"),
            ]
        );
        assert_eq!(
            digest.groups[0].text[0],
            format!(
                "<{TRACKER_URL}/browse/DASH-1|[DASH-1]> Crash Epic <{TRACKER_URL}/browse/DASH-100|[DASH-100]>"
            )
        );
    }

    #[test]
    fn same_type_tickets_share_one_block_with_total() {
        let tickets = vec![
            ticket("DASH-1", "Task", "One", Value::Null),
            ticket("DASH-2", "Task", "Two", Value::Null),
        ];
        let config = test_config();
        let snap = snapshot("closed", true, "master", "Release 1.2", "");

        let message = ChangelogDigest::build(&tickets, &config.tracker)
            .message(&pr(), &snap, &config.notifier);

        assert_eq!(message.attachments.len(), 2);

        let block = &message.attachments[1];
        assert_eq!(block.color, "#3B7FC4");
        assert_eq!(block.field("Total").unwrap().value, json!(2));
        assert_eq!(block.field("Issue type").unwrap().value, json!("Task"));
    }

    #[test]
    fn summary_block_describes_the_release() {
        let config = test_config();
        let snap = snapshot("closed", true, "master", "Release 1.2", "");

        let message =
            ChangelogDigest::default().message(&pr(), &snap, &config.notifier);

        assert_eq!(message.username, "Changelog");
        assert_eq!(message.channel, "#releases");

        let summary = &message.attachments[0];
        assert_eq!(summary.color, DEFAULT_COLOR);
        assert_eq!(summary.title.as_deref(), Some("There was a new release"));
        assert_eq!(summary.field("Project").unwrap().value, json!("dashboard"));
        assert_eq!(
            summary.field("Pull request").unwrap().value,
            json!("Release 1.2")
        );
        assert_eq!(
            summary.field("Release done by").unwrap().value,
            json!("octocat")
        );
    }

    #[test]
    fn unknown_issue_type_uses_default_color() {
        assert_eq!(issue_type_color("Sub-task"), DEFAULT_COLOR);
        assert_eq!(issue_type_color("Epic"), "#654982");
    }

    #[tokio::test]
    async fn sends_digest_for_production_merge() {
        let source = source_control(
            snapshot("closed", true, "master", "Release", "DASH-1, SYNGUI-2"),
            &[],
        );

        let mut tracker = MockTracker::new();
        tracker
            .expect_search()
            .withf(|req| {
                req.jql == r#"issuekey in ("DASH-1","DASH-2")"#
                    && req.fields
                        == Some(vec![
                            "issuetype".to_string(),
                            "summary".to_string(),
                            "customfield_10007".to_string(),
                        ])
            })
            .times(1)
            .returning(|_| {
                Ok(vec![
                    ticket("DASH-1", "Bug", "Crash", Value::Null),
                    ticket("DASH-2", "Bug", "Typo", Value::Null),
                ])
            });
        tracker.expect_update_issue().times(0);

        let sent: Arc<Mutex<Vec<Message>>> = Arc::default();
        let captured = Arc::clone(&sent);
        let mut notifier = MockNotifier::new();
        notifier.expect_send().times(1).returning(move |message| {
            captured.lock().unwrap().push(message.clone());
            Ok(())
        });

        let outcome = workflows(source, tracker, notifier)
            .send_changelog(&pr())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::ChangelogSent { issues: 2, groups: 1 });

        let sent = sent.lock().unwrap();
        assert_eq!(sent[0].attachments[1].field("Total").unwrap().value, json!(2));
    }

    #[tokio::test]
    async fn no_issues_sends_nothing() {
        let source = source_control(
            snapshot("closed", true, "master", "Release", ""),
            &["Merge branch 'devel'"],
        );

        let mut tracker = MockTracker::new();
        tracker.expect_search().times(0);
        let mut notifier = MockNotifier::new();
        notifier.expect_send().times(0);

        let outcome = workflows(source, tracker, notifier)
            .send_changelog(&pr())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Skipped(SkipReason::NoIssues));
    }

    #[tokio::test]
    async fn staging_merge_sends_nothing() {
        let source = source_control(
            snapshot("closed", true, "devel", "DASH-1", ""),
            &[],
        );

        let mut notifier = MockNotifier::new();
        notifier.expect_send().times(0);

        let outcome = workflows(source, MockTracker::new(), notifier)
            .send_changelog(&pr())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Skipped(SkipReason::UnsupportedBranch("devel".into()))
        );
    }

    #[tokio::test]
    async fn send_failure_propagates() {
        let source = source_control(
            snapshot("closed", true, "master", "DASH-1", ""),
            &[],
        );

        let mut tracker = MockTracker::new();
        tracker
            .expect_search()
            .returning(|_| Ok(vec![ticket("DASH-1", "Task", "One", Value::Null)]));

        let mut notifier = MockNotifier::new();
        notifier.expect_send().returning(|_| {
            Err(MarkIssuesError::upstream("slack", 500, "hooks"))
        });

        let err = workflows(source, tracker, notifier)
            .send_changelog(&pr())
            .await
            .unwrap_err();

        assert!(err.is_upstream());
    }
}
