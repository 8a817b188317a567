//! Traits related to notification channels
use async_trait::async_trait;

use crate::{Result, notifier::types::Message};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message. Non-2xx responses are upstream errors.
    async fn send(&self, message: &Message) -> Result<()>;
}
