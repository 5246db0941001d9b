use crate::api::models::MailItem;
use crate::mail::schedule::display_send_date;
use crate::mail::{CreateOutcome, ListState, UploadOutcome};

const PREVIEW_CHARS: usize = 120;

pub fn render_list(state: &ListState) -> Vec<String> {
    if state.loading_mails() {
        return vec!["loading mails...".to_string()];
    }

    let items = state.items();
    if items.is_empty() {
        return vec!["0 mails".to_string()];
    }

    let mut lines = Vec::new();
    for (index, item) in items.iter().enumerate() {
        lines.extend(item_lines(index, item));
        if index + 1 < items.len() {
            lines.push(String::new());
        }
    }
    lines
}

fn item_lines(index: usize, item: &MailItem) -> Vec<String> {
    let mut lines = vec![
        format!("{}. {} [{}]", index + 1, item.title, item.item_id),
        format!("   to: {}", item.mail_destination),
        format!("   send at: {}", display_send_date(&item.send_date)),
        format!("   {}", format_preview(&item.content)),
    ];

    if let Some(url) = item.attachment_url() {
        lines.push(format!("   attachment: {url}"));
    }

    lines
}

pub fn describe_created(outcome: &CreateOutcome) -> String {
    let item = &outcome.item;
    let created = format!(
        "created mail item {} for {} at {}",
        item.item_id,
        item.mail_destination,
        display_send_date(&item.send_date)
    );

    match &outcome.upload {
        UploadOutcome::NotRequested => created,
        UploadOutcome::NoFileSelected => {
            format!("{created} (no file selected, sent without attachment)")
        }
        UploadOutcome::NoPresignedUrl => {
            format!("{created} (server gave no upload url, attachment not stored)")
        }
        UploadOutcome::Uploaded { bytes } => format!("{created} (attachment uploaded, {bytes} bytes)"),
        UploadOutcome::Failed { message } => format!("{created} (attachment upload failed: {message})"),
    }
}

fn format_preview(content: &str) -> String {
    let compact = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.is_empty() {
        return "(no content)".to_string();
    }

    match compact.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => format!("{}...", &compact[..end]),
        None => compact,
    }
}
