//! Implements the Notifier trait for Slack incoming webhooks
use async_trait::async_trait;
use log::*;
use reqwest::{Client, Url, header::HeaderMap};
use std::time::Duration;

use crate::{
    MarkIssuesError, Result,
    http::{build_client, ensure_success},
    notifier::{traits::Notifier, types::Message},
};

const SERVICE: &str = "slack";

pub struct SlackWebhook {
    url: Url,
    client: Client,
}

impl SlackWebhook {
    pub fn new(webhook_url: &str, timeout: Duration) -> Result<Self> {
        if webhook_url.is_empty() {
            return Err(MarkIssuesError::invalid_config(
                "must provide slack webhook url",
            ));
        }

        Ok(Self {
            url: Url::parse(webhook_url)?,
            client: build_client(timeout, HeaderMap::new())?,
        })
    }
}

#[async_trait]
impl Notifier for SlackWebhook {
    async fn send(&self, message: &Message) -> Result<()> {
        debug!(
            "sending message with {} attachments to {}",
            message.attachments.len(),
            message.channel
        );

        let response = self
            .client
            .post(self.url.clone())
            .json(message)
            .send()
            .await?;

        ensure_success(SERVICE, response)?;

        Ok(())
    }
}
