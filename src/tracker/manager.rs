//! Manager that batches lookups against a tracker implementation
use log::*;
use std::collections::BTreeSet;

use crate::{
    Result,
    config::MAX_BATCH_SIZE,
    issue_key::IssueKey,
    tracker::{
        traits::Tracker,
        types::{SearchRequest, TicketRecord, UpdateIssueRequest},
    },
};

pub struct TrackerManager {
    client: Box<dyn Tracker>,
    batch_size: usize,
}

impl TrackerManager {
    /// `batch_size` is clamped to `1..=MAX_BATCH_SIZE`.
    pub fn new(client: Box<dyn Tracker>, batch_size: usize) -> Self {
        Self {
            client,
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
        }
    }

    /// Looks up `keys` in ordered batches, one search per batch, building
    /// each query with `jql`. Records are returned in tracker order. The
    /// first failing batch aborts the lookup.
    pub async fn search_by_keys<F>(
        &self,
        keys: &BTreeSet<IssueKey>,
        fields: Option<&[&str]>,
        jql: F,
    ) -> Result<Vec<TicketRecord>>
    where
        F: Fn(&[IssueKey]) -> String,
    {
        let keys = keys.iter().cloned().collect::<Vec<IssueKey>>();
        let fields = fields
            .map(|f| f.iter().map(|s| s.to_string()).collect::<Vec<String>>());
        let mut records = vec![];

        for (index, batch) in keys.chunks(self.batch_size).enumerate() {
            debug!("searching batch {} with {} keys", index + 1, batch.len());

            let found = self
                .client
                .search(SearchRequest {
                    jql: jql(batch),
                    fields: fields.clone(),
                    max_results: batch.len(),
                })
                .await?;

            records.extend(found);
        }

        Ok(records)
    }

    pub async fn update_issue(&self, req: UpdateIssueRequest) -> Result<()> {
        self.client.update_issue(req).await
    }
}
