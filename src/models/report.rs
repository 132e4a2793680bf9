use serde::{Deserialize, Serialize};

/// The drafted email, split into subject and body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedReport {
    pub subject: String,
    pub body: String,
    pub includes_news: bool,
}

#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub subject: String,
    pub body: String,
    pub attachment: Option<EmailAttachment>,
}
