//! Traits related to issue trackers
use async_trait::async_trait;

use crate::{
    Result,
    tracker::types::{SearchRequest, TicketRecord, UpdateIssueRequest},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Tracker: Send + Sync {
    /// Run a single search request and return the records in tracker order.
    async fn search(&self, req: SearchRequest) -> Result<Vec<TicketRecord>>;

    /// Overwrite the given fields of one issue.
    async fn update_issue(&self, req: UpdateIssueRequest) -> Result<()>;
}
