use std::fs;

use crate::api::models::Attachment;
use crate::cli::CreateArgs;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::mail::{CreateOutcome, DraftEdit, UploadOutcome};
use crate::output::mails;

pub async fn run(ctx: &AppContext, args: CreateArgs) -> AppResult<()> {
    let content = read_content(&args)?;
    let file = args.attach.as_deref().map(Attachment::from_path).transpose()?;

    let store = ctx.mail_store()?;
    store.open_create_modal();
    store.edit_draft(DraftEdit::Title(args.title));
    store.edit_draft(DraftEdit::MailReceive(args.to));
    store.edit_draft(DraftEdit::Content(content));
    if let Some(send_date) = args.send_date {
        store.edit_draft(DraftEdit::SendDate(send_date));
    }
    if file.is_some() {
        store.edit_draft(DraftEdit::File(file));
    }

    let outcome = store.submit_draft().await?;
    if args.require_attachment {
        ensure_attachment_stored(&outcome)?;
    }

    ctx.output.emit(&mails::describe_created(&outcome), &outcome)
}

fn read_content(args: &CreateArgs) -> AppResult<String> {
    match (&args.content, &args.content_file) {
        (Some(content), None) => Ok(content.clone()),
        (None, Some(path)) => Ok(fs::read_to_string(path)?),
        (None, None) => Err(AppError::InvalidInput(
            "missing message; pass --content or --content-file".to_string(),
        )),
        (Some(_), Some(_)) => Err(AppError::InvalidInput(
            "pass only one of --content or --content-file".to_string(),
        )),
    }
}

fn ensure_attachment_stored(outcome: &CreateOutcome) -> AppResult<()> {
    let reason = match &outcome.upload {
        UploadOutcome::Uploaded { .. } | UploadOutcome::NotRequested => return Ok(()),
        UploadOutcome::NoFileSelected => "no file was selected".to_string(),
        UploadOutcome::NoPresignedUrl => "the server returned no upload url".to_string(),
        UploadOutcome::Failed { message } => message.clone(),
    };

    Err(AppError::Upload(format!(
        "mail item {} was created but its attachment was not stored: {reason}",
        outcome.item.item_id
    )))
}
