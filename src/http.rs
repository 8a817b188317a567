//! Shared helpers for the reqwest based API clients.
use regex::Regex;
use reqwest::{
    Client, Response,
    header::{HeaderMap, LINK},
};
use std::{sync::LazyLock, time::Duration};

use crate::{MarkIssuesError, Result};

static NEXT_LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(?<url>[^>]+)>\s*;\s*rel="?next"?"#).unwrap()
});

/// Build a client with the configured transport timeout and default headers.
pub fn build_client(timeout: Duration, headers: HeaderMap) -> Result<Client> {
    let client = Client::builder()
        .user_agent(concat!("mark-issues/", env!("CARGO_PKG_VERSION")))
        .default_headers(headers)
        .timeout(timeout)
        .build()?;

    Ok(client)
}

/// Turn any non-2xx response into an upstream error for `service`.
pub fn ensure_success(service: &str, response: Response) -> Result<Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    log::error!(
        "{service} responded with {status} for {}",
        response.url()
    );

    Err(MarkIssuesError::upstream(
        service,
        status.as_u16(),
        response.url().as_str(),
    ))
}

/// Extract the `rel="next"` target from an RFC 8288 Link header.
pub fn next_link(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .find_map(|part| {
            NEXT_LINK_REGEX
                .captures(part)
                .and_then(|caps| caps.name("url"))
                .map(|m| m.as_str().to_string())
        })
}
