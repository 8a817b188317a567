use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::issue_key::IssueKey;

/// A ticket as returned by a search, limited to the requested fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub key: IssueKey,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl TicketRecord {
    /// Entries of a multi-value field. Absent and null fields are empty.
    pub fn multi_values(&self, field: &str) -> Vec<Value> {
        match self.fields.get(field) {
            Some(Value::Array(values)) => values.clone(),
            _ => vec![],
        }
    }

    pub fn issue_type(&self) -> Option<&str> {
        self.fields
            .get("issuetype")
            .and_then(|t| t.get("name"))
            .and_then(Value::as_str)
    }

    pub fn summary(&self) -> &str {
        self.text("summary").unwrap_or_default()
    }

    /// A plain string field, e.g. an epic link.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One search request against the tracker.
pub struct SearchRequest {
    pub jql: String,
    /// Fields to return; `None` lets the tracker pick its defaults.
    pub fields: Option<Vec<String>>,
    pub max_results: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Request to overwrite fields of a single issue.
pub struct UpdateIssueRequest {
    #[serde(skip)]
    pub key: IssueKey,
    pub fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub issues: Vec<TicketRecord>,
}
