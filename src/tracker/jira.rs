//! Implements the Tracker trait for Jira
use async_trait::async_trait;
use log::*;
use reqwest::{Client, Url, header::HeaderMap};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::{
    MarkIssuesError, Result,
    http::{build_client, ensure_success},
    tracker::{
        traits::Tracker,
        types::{
            SearchRequest, SearchResponse, TicketRecord, UpdateIssueRequest,
        },
    },
};

const SERVICE: &str = "jira";

/// Jira REST (v2) client using basic authentication.
pub struct Jira {
    api_url: Url,
    username: String,
    password: SecretString,
    client: Client,
}

impl Jira {
    pub fn new(
        root: &str,
        username: impl Into<String>,
        password: SecretString,
        timeout: Duration,
    ) -> Result<Self> {
        if root.is_empty() {
            return Err(MarkIssuesError::invalid_config(
                "tracker url must be configured",
            ));
        }

        let api_url =
            Url::parse(&format!("{}/rest/api/2/", root.trim_end_matches('/')))?;

        Ok(Self {
            api_url,
            username: username.into(),
            password,
            client: build_client(timeout, HeaderMap::new())?,
        })
    }
}

#[async_trait]
impl Tracker for Jira {
    async fn search(&self, req: SearchRequest) -> Result<Vec<TicketRecord>> {
        let url = self.api_url.join("search/")?;

        let mut params = vec![
            ("jql", req.jql),
            ("maxResults", req.max_results.to_string()),
        ];

        if let Some(fields) = req.fields {
            params.push(("fields", fields.join(",")));
        }

        debug!("searching issues: {params:?}");

        let response = self
            .client
            .get(url)
            .query(&params)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .send()
            .await?;

        let response = ensure_success(SERVICE, response)?;
        let result: SearchResponse = response.json().await?;

        Ok(result.issues)
    }

    async fn update_issue(&self, req: UpdateIssueRequest) -> Result<()> {
        let url = self.api_url.join(&format!("issue/{}", req.key))?;

        let response = self
            .client
            .put(url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .json(&req)
            .send()
            .await?;

        ensure_success(SERVICE, response)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header_exists, method, path, query_param},
    };

    fn jira(server: &MockServer) -> Jira {
        Jira::new(
            &server.uri(),
            "bot",
            SecretString::from("secret".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn requires_tracker_url() {
        let result = Jira::new(
            "",
            "bot",
            SecretString::from("secret".to_string()),
            Duration::from_secs(5),
        );

        assert!(matches!(result, Err(MarkIssuesError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn search_sends_jql_fields_and_limit() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/2/search/"))
            .and(query_param("jql", r#"issuekey in ("DASH-1")"#))
            .and(query_param("fields", "key,customfield_10200"))
            .and(query_param("maxResults", "1"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issues": [
                    { "key": "DASH-1", "fields": { "customfield_10200": null } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let issues = jira(&server)
            .search(SearchRequest {
                jql: r#"issuekey in ("DASH-1")"#.into(),
                fields: Some(vec!["key".into(), "customfield_10200".into()]),
                max_results: 1,
            })
            .await
            .unwrap();

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].key.as_str(), "DASH-1");
    }

    #[tokio::test]
    async fn search_failure_is_upstream_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/2/search/"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let err = jira(&server)
            .search(SearchRequest {
                jql: "bad".into(),
                fields: None,
                max_results: 1,
            })
            .await
            .unwrap_err();

        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn update_puts_fields_body() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/rest/api/2/issue/DASH-1"))
            .and(body_json(json!({
                "fields": { "customfield_10200": [{ "value": "Production" }] }
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let mut fields = Map::new();
        fields.insert(
            "customfield_10200".into(),
            json!([{ "value": "Production" }]),
        );

        jira(&server)
            .update_issue(UpdateIssueRequest {
                key: "DASH-1".into(),
                fields,
            })
            .await
            .unwrap();
    }
}
