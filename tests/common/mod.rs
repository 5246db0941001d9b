#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use mailsched::api::{Attachment, CreatedMail, MailApi, MailItem, NewMail};
use mailsched::auth::StaticToken;
use mailsched::error::{AppError, AppResult};
use mailsched::mail::{MailStore, SendDateMode};

pub const TOKEN: &str = "id-token-123";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Search,
    Create,
    Delete,
    Upload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List { token: String },
    Search { key: String },
    Create(NewMail),
    Delete(String),
    Upload { url: String, file: Attachment },
}

/// In-memory stand-in for the scheduling API. Creates and deletes change the
/// server list; list calls read it on arrival. Every call yields once so
/// concurrently driven operations interleave.
#[derive(Debug, Default)]
pub struct FakeApi {
    items: Mutex<Vec<MailItem>>,
    presigned_url: Option<String>,
    list_yields: usize,
    failing: Mutex<HashSet<Op>>,
    calls: Mutex<Vec<Call>>,
    next_id: AtomicUsize,
}

impl FakeApi {
    pub fn with_items(items: Vec<MailItem>) -> Self {
        Self {
            items: Mutex::new(items),
            ..Self::default()
        }
    }

    pub fn presigned_url(mut self, url: &str) -> Self {
        self.presigned_url = Some(url.to_string());
        self
    }

    /// Makes `list_all` yield `count` times between reading the list and
    /// answering.
    pub fn slow_list(mut self, count: usize) -> Self {
        self.list_yields = count;
        self
    }

    pub fn fail(&self, op: Op) {
        self.failing.lock().expect("failing lock").insert(op);
    }

    pub fn recover(&self, op: Op) {
        self.failing.lock().expect("failing lock").remove(&op);
    }

    pub fn server_ids(&self) -> Vec<String> {
        self.items
            .lock()
            .expect("items lock")
            .iter()
            .map(|item| item.item_id.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn uploads(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Upload { .. }))
            .collect()
    }

    async fn enter(&self, op: Op, call: Call) -> AppResult<()> {
        self.calls.lock().expect("calls lock").push(call);
        tokio::task::yield_now().await;
        if self.failing.lock().expect("failing lock").contains(&op) {
            return Err(AppError::Api(format!("{op:?} unavailable")));
        }
        Ok(())
    }
}

impl MailApi for FakeApi {
    async fn list_all(&self, token: &str) -> AppResult<Vec<MailItem>> {
        let snapshot = self.items.lock().expect("items lock").clone();
        for _ in 0..self.list_yields {
            tokio::task::yield_now().await;
        }
        self.enter(
            Op::List,
            Call::List {
                token: token.to_string(),
            },
        )
        .await?;
        Ok(snapshot)
    }

    async fn search(&self, _token: &str, key: &str) -> AppResult<Vec<MailItem>> {
        self.enter(
            Op::Search,
            Call::Search {
                key: key.to_string(),
            },
        )
        .await?;
        Ok(self
            .items
            .lock()
            .expect("items lock")
            .iter()
            .filter(|item| item.title.contains(key))
            .cloned()
            .collect())
    }

    async fn create(&self, _token: &str, mail: &NewMail) -> AppResult<CreatedMail> {
        self.enter(Op::Create, Call::Create(mail.clone())).await?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let item = MailItem {
            item_id: format!("item-{id}"),
            title: mail.title.clone(),
            content: mail.content.clone(),
            mail_destination: mail.mail_destination.clone(),
            send_date: mail.send_date.clone(),
            send_with_attachment: mail.send_with_attachment,
            attachment_url: None,
        };
        self.items.lock().expect("items lock").push(item.clone());
        Ok(CreatedMail {
            item,
            presigned_url: self.presigned_url.clone(),
        })
    }

    async fn delete(&self, _token: &str, item_id: &str) -> AppResult<()> {
        self.enter(Op::Delete, Call::Delete(item_id.to_string()))
            .await?;
        self.items
            .lock()
            .expect("items lock")
            .retain(|item| item.item_id != item_id);
        Ok(())
    }

    async fn upload_attachment(&self, presigned_url: &str, file: &Attachment) -> AppResult<()> {
        self.enter(
            Op::Upload,
            Call::Upload {
                url: presigned_url.to_string(),
                file: file.clone(),
            },
        )
        .await
    }
}

pub fn item(id: &str, title: &str) -> MailItem {
    MailItem {
        item_id: id.to_string(),
        title: title.to_string(),
        content: format!("body of {title}"),
        mail_destination: "team@example.com".to_string(),
        send_date: "2024-03-01T09:30:00Z".to_string(),
        send_with_attachment: false,
        attachment_url: None,
    }
}

pub fn attachment() -> Attachment {
    Attachment {
        filename: "report.pdf".to_string(),
        mime_type: "application/pdf".to_string(),
        data: b"%PDF-1.7".to_vec(),
    }
}

pub fn store(api: FakeApi) -> MailStore<FakeApi, StaticToken> {
    MailStore::new(api, StaticToken(TOKEN.to_string())).with_send_date_mode(SendDateMode::Verbatim)
}
