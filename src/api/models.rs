use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// A scheduled mail as the server stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailItem {
    pub item_id: String,
    pub title: String,
    pub content: String,
    pub mail_destination: String,
    pub send_date: String,
    #[serde(default)]
    pub send_with_attachment: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
}

impl MailItem {
    /// The stored attachment, only when the item was sent with one.
    pub fn attachment_url(&self) -> Option<&str> {
        if !self.send_with_attachment {
            return None;
        }

        self.attachment_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMail {
    pub content: String,
    pub mail_destination: String,
    pub send_date: String,
    pub title: String,
    pub send_with_attachment: bool,
}

/// Create response: the committed item plus a one-time upload target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedMail {
    #[serde(flatten)]
    pub item: MailItem,
    #[serde(default)]
    pub presigned_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|value| value.to_string_lossy().to_string())
            .ok_or_else(|| {
                AppError::InvalidInput(format!("invalid attachment path: {}", path.display()))
            })?;
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self {
            filename,
            mime_type,
            data,
        })
    }
}
