use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentField {
    pub title: String,
    pub value: Value,
    pub short: bool,
}

impl AttachmentField {
    pub fn short(title: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            short: true,
        }
    }
}

/// A colored block of a message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    pub fields: Vec<AttachmentField>,
}

impl Attachment {
    pub fn field(&self, title: &str) -> Option<&AttachmentField> {
        self.fields.iter().find(|f| f.title == title)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub username: String,
    pub channel: String,
    pub attachments: Vec<Attachment>,
}
