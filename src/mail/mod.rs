pub mod coordinator;
pub mod draft;
pub mod schedule;
pub mod state;
pub mod store;

pub use coordinator::{CreateOutcome, UploadOutcome, submit_create};
pub use draft::{DraftEdit, MailDraft};
pub use schedule::SendDateMode;
pub use state::{ListPhase, ListState, Notice, NoticeKind};
pub use store::MailStore;
