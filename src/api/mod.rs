pub mod client;
pub mod mails;
pub mod models;

use std::future::Future;

use crate::error::AppResult;

pub use client::MailApiClient;
pub use models::{Attachment, CreatedMail, MailItem, NewMail};

/// Remote operations the mail store depends on.
pub trait MailApi {
    fn list_all(&self, token: &str) -> impl Future<Output = AppResult<Vec<MailItem>>> + Send;

    fn search(
        &self,
        token: &str,
        key: &str,
    ) -> impl Future<Output = AppResult<Vec<MailItem>>> + Send;

    fn create(
        &self,
        token: &str,
        mail: &NewMail,
    ) -> impl Future<Output = AppResult<CreatedMail>> + Send;

    fn delete(&self, token: &str, item_id: &str) -> impl Future<Output = AppResult<()>> + Send;

    /// Direct-to-storage PUT; not authenticated with the API token.
    fn upload_attachment(
        &self,
        presigned_url: &str,
        file: &Attachment,
    ) -> impl Future<Output = AppResult<()>> + Send;
}
