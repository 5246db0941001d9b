use crate::api::models::MailItem;

use super::draft::{DraftEdit, MailDraft};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListPhase {
    #[default]
    Uninitialized,
    Loading,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Fetch,
    Create,
    Delete,
}

/// A failure the user should see. The list it refers to is left as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Identifies one list fetch; only the most recent one may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// A local list change made while a fetch was in flight.
#[derive(Debug, Clone)]
enum ListEdit {
    Added(MailItem),
    Removed(String),
}

#[derive(Debug, Clone, Default)]
pub struct ListState {
    items: Vec<MailItem>,
    search_key: String,
    phase: ListPhase,
    show_modal: bool,
    draft: MailDraft,
    notice: Option<Notice>,
    version: u64,
    fetch_generation: u64,
    edits_since_fetch: Vec<ListEdit>,
}

impl ListState {
    pub fn items(&self) -> &[MailItem] {
        &self.items
    }

    pub fn search_key(&self) -> &str {
        &self.search_key
    }

    pub fn phase(&self) -> ListPhase {
        self.phase
    }

    pub fn loading_mails(&self) -> bool {
        self.phase == ListPhase::Loading
    }

    pub fn show_modal(&self) -> bool {
        self.show_modal
    }

    pub fn draft(&self) -> &MailDraft {
        &self.draft
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Bumped on every applied change.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.fetch_generation += 1;
        self.edits_since_fetch.clear();
        self.phase = ListPhase::Loading;
        self.touch();
        FetchTicket(self.fetch_generation)
    }

    /// Replaces the list if `ticket` is still the latest fetch. Creates and
    /// deletes applied while it was in flight are replayed on the result.
    pub fn finish_fetch(&mut self, ticket: FetchTicket, mut items: Vec<MailItem>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }

        for edit in self.edits_since_fetch.drain(..) {
            match edit {
                ListEdit::Added(item) => {
                    if !items.iter().any(|known| known.item_id == item.item_id) {
                        items.push(item);
                    }
                }
                ListEdit::Removed(item_id) => items.retain(|known| known.item_id != item_id),
            }
        }
        self.items = items;
        self.phase = ListPhase::Ready;
        self.touch();
        true
    }

    /// Leaves the list untouched and returns to `Ready` if `ticket` is current.
    pub fn fail_fetch(&mut self, ticket: FetchTicket, message: String) -> bool {
        if !self.is_current(ticket) {
            return false;
        }

        self.edits_since_fetch.clear();
        self.phase = ListPhase::Ready;
        self.notice = Some(Notice {
            kind: NoticeKind::Fetch,
            message,
        });
        self.touch();
        true
    }

    pub fn append_created(&mut self, item: MailItem) {
        if self.loading_mails() {
            self.edits_since_fetch.push(ListEdit::Added(item.clone()));
        }
        self.items.push(item);
        self.touch();
    }

    /// A miss is still remembered while a fetch is in flight, since the
    /// fetched list may contain the item.
    pub fn remove_item(&mut self, item_id: &str) -> Option<MailItem> {
        if self.loading_mails() {
            self.edits_since_fetch
                .push(ListEdit::Removed(item_id.to_string()));
        }
        let index = self.items.iter().position(|item| item.item_id == item_id)?;
        let removed = self.items.remove(index);
        self.touch();
        Some(removed)
    }

    pub fn set_search_key(&mut self, key: String) {
        self.search_key = key;
        self.touch();
    }

    pub fn set_modal(&mut self, open: bool) {
        self.show_modal = open;
        self.touch();
    }

    pub fn edit_draft(&mut self, edit: DraftEdit) {
        self.draft.apply(edit);
        self.touch();
    }

    pub fn reset_draft(&mut self) {
        self.draft = MailDraft::fresh();
        self.touch();
    }

    pub fn report(&mut self, kind: NoticeKind, message: String) {
        self.notice = Some(Notice { kind, message });
        self.touch();
    }

    pub fn dismiss_notice(&mut self) {
        if self.notice.take().is_some() {
            self.touch();
        }
    }

    fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.fetch_generation
    }

    fn touch(&mut self) {
        self.version += 1;
    }
}
