use chrono::Local;

use crate::api::models::Attachment;

use super::schedule;

/// Client-side create form contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailDraft {
    pub title: String,
    pub content: String,
    pub mail_receive: String,
    pub send_date: String,
    pub send_with_attachment: bool,
    pub file: Option<Attachment>,
}

impl MailDraft {
    /// Empty form with the send date one hour from now.
    pub fn fresh() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            mail_receive: String::new(),
            send_date: schedule::default_send_date(Local::now()),
            send_with_attachment: false,
            file: None,
        }
    }

    pub fn apply(&mut self, edit: DraftEdit) {
        match edit {
            DraftEdit::Title(title) => self.title = title,
            DraftEdit::Content(content) => self.content = content,
            DraftEdit::MailReceive(address) => self.mail_receive = address,
            DraftEdit::SendDate(send_date) => self.send_date = send_date,
            DraftEdit::SendWithAttachment(flag) => self.send_with_attachment = flag,
            DraftEdit::File(Some(file)) => {
                self.file = Some(file);
                self.send_with_attachment = true;
            }
            DraftEdit::File(None) => self.file = None,
        }
    }

    pub fn with(mut self, edit: DraftEdit) -> Self {
        self.apply(edit);
        self
    }
}

impl Default for MailDraft {
    fn default() -> Self {
        Self::fresh()
    }
}

/// One field of [`MailDraft`] changing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftEdit {
    Title(String),
    Content(String),
    MailReceive(String),
    SendDate(String),
    SendWithAttachment(bool),
    File(Option<Attachment>),
}
