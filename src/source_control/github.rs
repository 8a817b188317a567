//! Implements the SourceControl trait for GitHub
use async_trait::async_trait;
use log::*;
use reqwest::{
    Client, Url,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use crate::{
    Result,
    config::GithubConfig,
    http::{build_client, ensure_success, next_link},
    source_control::{
        traits::SourceControl,
        types::{CommitPage, PullRequestRef, PullRequestSnapshot},
    },
};

const SERVICE: &str = "github";

#[derive(Debug, Deserialize)]
struct GithubCommitDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GithubCommit {
    commit: GithubCommitDetail,
}

/// GitHub REST client using token authentication.
pub struct Github {
    base_url: Url,
    org: String,
    client: Client,
}

impl Github {
    pub fn new(
        config: &GithubConfig,
        token: &SecretString,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();

        headers.append(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        let token = token.expose_secret();
        if !token.is_empty() {
            let mut value = HeaderValue::from_str(&format!("token {token}"))?;
            value.set_sensitive(true);
            headers.append(AUTHORIZATION, value);
        }

        let client = build_client(timeout, headers)?;

        let mut base_url = config.api_url.trim_end_matches('/').to_string();
        base_url.push('/');

        Ok(Self {
            base_url: Url::parse(&base_url)?,
            org: config.org.clone(),
            client,
        })
    }

    fn pull_request_url(
        &self,
        pr: &PullRequestRef,
        suffix: &str,
    ) -> Result<Url> {
        let url = self.base_url.join(&format!(
            "repos/{}/{}/pulls/{}{suffix}",
            self.org, pr.repository, pr.number
        ))?;
        Ok(url)
    }
}

#[async_trait]
impl SourceControl for Github {
    async fn get_pull_request(
        &self,
        pr: &PullRequestRef,
    ) -> Result<PullRequestSnapshot> {
        let url = self.pull_request_url(pr, "")?;
        debug!("fetching pull request: {url}");

        let response = self.client.get(url).send().await?;
        let response = ensure_success(SERVICE, response)?;
        let snapshot: PullRequestSnapshot = response.json().await?;

        Ok(snapshot)
    }

    async fn get_commit_page(
        &self,
        pr: &PullRequestRef,
        cursor: Option<String>,
    ) -> Result<CommitPage> {
        let url = match cursor {
            Some(next) => Url::parse(&next)?,
            None => self.pull_request_url(pr, "/commits")?,
        };

        debug!("fetching commit page: {url}");

        let response = self.client.get(url).send().await?;
        let response = ensure_success(SERVICE, response)?;
        let next = next_link(response.headers());
        let commits: Vec<GithubCommit> = response.json().await?;

        Ok(CommitPage {
            messages: commits.into_iter().map(|c| c.commit.message).collect(),
            next,
        })
    }
}
