//! Source control access for pull requests and their commit history.

/// GitHub REST API client implementation.
pub mod github;

/// Pagination and convenience wrapper over a source control client.
pub mod manager;

/// Common trait for source control clients.
pub mod traits;

/// Pull request data types shared by every client.
pub mod types;
