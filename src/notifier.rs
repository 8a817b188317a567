//! Delivery of formatted messages to a chat webhook.

/// Slack incoming-webhook implementation.
pub mod slack;

/// Common trait for notification channels.
pub mod traits;

/// Message payload types.
pub mod types;
