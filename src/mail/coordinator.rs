//! Creating a mail item is two remote steps: the metadata record, then (maybe)
//! the binary upload to the URL the server handed back. The item from the
//! first step is final; the upload only ever reports how it went.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::MailApi;
use crate::api::models::{MailItem, NewMail};
use crate::error::AppResult;

use super::draft::MailDraft;
use super::schedule::{self, SendDateMode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    /// The draft was not marked as carrying an attachment.
    NotRequested,
    NoFileSelected,
    /// The server did not hand out an upload URL.
    NoPresignedUrl,
    Uploaded { bytes: usize },
    Failed { message: String },
}

impl UploadOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOutcome {
    pub item: MailItem,
    pub upload: UploadOutcome,
}

pub fn new_mail(draft: &MailDraft, mode: SendDateMode) -> AppResult<NewMail> {
    Ok(NewMail {
        content: draft.content.clone(),
        mail_destination: draft.mail_receive.clone(),
        send_date: schedule::normalize_send_date(&draft.send_date, mode)?,
        title: draft.title.clone(),
        send_with_attachment: draft.send_with_attachment,
    })
}

/// Fails only when the metadata record could not be created.
pub async fn submit_create<A: MailApi>(
    api: &A,
    token: &str,
    draft: &MailDraft,
    mode: SendDateMode,
) -> AppResult<CreateOutcome> {
    let body = new_mail(draft, mode)?;
    debug!(send_date = %body.send_date, attachment = body.send_with_attachment, "creating mail item");
    let created = api.create(token, &body).await?;
    info!(item_id = %created.item.item_id, "mail item created");

    let upload = match (
        draft.send_with_attachment,
        created.presigned_url.as_deref(),
        draft.file.as_ref(),
    ) {
        (false, _, _) => UploadOutcome::NotRequested,
        (true, _, None) => UploadOutcome::NoFileSelected,
        (true, None, Some(_)) => UploadOutcome::NoPresignedUrl,
        (true, Some(url), Some(file)) => match api.upload_attachment(url, file).await {
            Ok(()) => {
                info!(item_id = %created.item.item_id, bytes = file.data.len(), "attachment uploaded");
                UploadOutcome::Uploaded {
                    bytes: file.data.len(),
                }
            }
            Err(err) => {
                warn!(item_id = %created.item.item_id, error = %err, "attachment upload failed");
                UploadOutcome::Failed {
                    message: err.to_string(),
                }
            }
        },
    };

    Ok(CreateOutcome {
        item: created.item,
        upload,
    })
}
