use std::sync::{Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::api::MailApi;
use crate::api::models::MailItem;
use crate::auth::TokenSource;
use crate::error::AppResult;

use super::coordinator::{self, CreateOutcome};
use super::draft::{DraftEdit, MailDraft};
use super::schedule::SendDateMode;
use super::state::{FetchTicket, ListState, NoticeKind};

/// Owns the mail list the terminal views render from.
///
/// Every change goes through a [`ListState`] method applied under a short
/// lock that is never held across an `.await`. Creates and deletes that land
/// while a fetch is in flight are replayed onto its result, so operations may
/// be driven concurrently without losing each other's edits. Failures are
/// returned and also recorded as the state's notice; the previous list is
/// kept.
pub struct MailStore<A, T> {
    api: A,
    tokens: T,
    send_date_mode: SendDateMode,
    state: Mutex<ListState>,
}

impl<A: MailApi, T: TokenSource> MailStore<A, T> {
    pub fn new(api: A, tokens: T) -> Self {
        Self {
            api,
            tokens,
            send_date_mode: SendDateMode::default(),
            state: Mutex::new(ListState::default()),
        }
    }

    pub fn with_send_date_mode(mut self, mode: SendDateMode) -> Self {
        self.send_date_mode = mode;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn snapshot(&self) -> ListState {
        self.with_state(|state| state.clone())
    }

    pub async fn load_all(&self) -> AppResult<()> {
        let ticket = self.with_state(ListState::begin_fetch);
        let result = self.fetch_all().await;
        self.apply_fetch(ticket, result)
    }

    /// Only records the key; [`MailStore::run_search`] does the fetch.
    pub fn set_search_key(&self, key: impl Into<String>) {
        let key = key.into();
        self.with_state(|state| state.set_search_key(key));
    }

    pub async fn run_search(&self) -> AppResult<()> {
        let (ticket, key) = self.with_state(|state| {
            let ticket = state.begin_fetch();
            (ticket, state.search_key().to_string())
        });
        debug!(key = %key, "searching mails");
        let result = self.fetch_matching(&key).await;
        self.apply_fetch(ticket, result)
    }

    /// Leaves the store's own form and draft untouched.
    pub async fn create(&self, draft: MailDraft) -> AppResult<CreateOutcome> {
        self.commit_create(&draft, |_| {}).await
    }

    /// Creates from the store's draft; on success the form closes and the
    /// draft starts over.
    pub async fn submit_draft(&self) -> AppResult<CreateOutcome> {
        let draft = self.with_state(|state| state.draft().clone());
        self.commit_create(&draft, |state| {
            state.set_modal(false);
            state.reset_draft();
        })
        .await
    }

    /// A local list edit: the loading phase is left alone.
    pub async fn delete(&self, item_id: &str) -> AppResult<()> {
        match self.remote_delete(item_id).await {
            Ok(()) => {
                match self.with_state(|state| state.remove_item(item_id)) {
                    Some(_) => info!(item_id, "mail item deleted"),
                    None => warn!(item_id, "deleted item was not in the local list"),
                }
                Ok(())
            }
            Err(err) => {
                let message = format!("Mail item deletion failed: {err}");
                self.with_state(|state| state.report(NoticeKind::Delete, message));
                Err(err)
            }
        }
    }

    pub fn open_create_modal(&self) {
        self.with_state(|state| state.set_modal(true));
    }

    pub fn close_create_modal(&self) {
        self.with_state(|state| state.set_modal(false));
    }

    /// Closes the form and throws the draft away.
    pub fn cancel_create(&self) {
        self.with_state(|state| {
            state.set_modal(false);
            state.reset_draft();
        });
    }

    pub fn edit_draft(&self, edit: DraftEdit) {
        self.with_state(|state| state.edit_draft(edit));
    }

    pub fn dismiss_notice(&self) {
        self.with_state(ListState::dismiss_notice);
    }

    async fn fetch_all(&self) -> AppResult<Vec<MailItem>> {
        let token = self.tokens.id_token().await?;
        self.api.list_all(&token).await
    }

    async fn fetch_matching(&self, key: &str) -> AppResult<Vec<MailItem>> {
        let token = self.tokens.id_token().await?;
        self.api.search(&token, key).await
    }

    async fn commit_create(
        &self,
        draft: &MailDraft,
        on_success: impl FnOnce(&mut ListState),
    ) -> AppResult<CreateOutcome> {
        match self.remote_create(draft).await {
            Ok(outcome) => {
                let item = outcome.item.clone();
                self.with_state(|state| {
                    state.append_created(item);
                    on_success(state);
                });
                Ok(outcome)
            }
            Err(err) => {
                let message = format!("Create new item failed: {err}");
                self.with_state(|state| state.report(NoticeKind::Create, message));
                Err(err)
            }
        }
    }

    async fn remote_create(&self, draft: &MailDraft) -> AppResult<CreateOutcome> {
        let token = self.tokens.id_token().await?;
        coordinator::submit_create(&self.api, &token, draft, self.send_date_mode).await
    }

    async fn remote_delete(&self, item_id: &str) -> AppResult<()> {
        let token = self.tokens.id_token().await?;
        self.api.delete(&token, item_id).await
    }

    fn apply_fetch(&self, ticket: FetchTicket, result: AppResult<Vec<MailItem>>) -> AppResult<()> {
        match result {
            Ok(items) => {
                let count = items.len();
                if self.with_state(|state| state.finish_fetch(ticket, items)) {
                    info!(count, "mail list replaced");
                } else {
                    debug!(count, "dropping superseded fetch result");
                }
                Ok(())
            }
            Err(err) => {
                let message = format!("Failed to fetch mails: {err}");
                if !self.with_state(|state| state.fail_fetch(ticket, message)) {
                    debug!(error = %err, "superseded fetch failed");
                }
                Err(err)
            }
        }
    }

    fn with_state<R>(&self, apply: impl FnOnce(&mut ListState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut state)
    }
}
