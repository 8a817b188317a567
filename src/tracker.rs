//! Issue tracker access: batched key lookups and field updates.

/// Jira REST API client implementation.
pub mod jira;

/// Batching wrapper over a tracker client.
pub mod manager;

/// JQL builders used by the workflows.
pub mod query;

/// Common trait for issue tracker clients.
pub mod traits;

/// Ticket and request types.
pub mod types;
