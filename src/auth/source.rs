use std::future::Future;
use std::time::SystemTime;

use tracing::debug;

use crate::config::Settings;
use crate::error::AppResult;

use super::oauth::{AuthService, not_logged_in};
use super::token_store::{FileTokenStore, TokenStore};

/// Supplies the bearer credential for one remote call.
pub trait TokenSource {
    fn id_token(&self) -> impl Future<Output = AppResult<String>> + Send;
}

/// Reads the profile's stored token, refreshing it first when expired.
#[derive(Debug, Clone)]
pub struct ProfileTokenSource {
    profile: String,
    settings: Settings,
    store: FileTokenStore,
}

impl ProfileTokenSource {
    pub fn new(profile: String, settings: Settings, store: FileTokenStore) -> Self {
        Self {
            profile,
            settings,
            store,
        }
    }
}

impl TokenSource for ProfileTokenSource {
    async fn id_token(&self) -> AppResult<String> {
        let token = self.store.load(&self.profile)?.ok_or_else(not_logged_in)?;

        if token.is_expired(SystemTime::now()) {
            debug!(profile = %self.profile, "stored token expired");
            let refreshed =
                AuthService::refresh(&self.profile, &self.settings, &self.store).await?;
            return Ok(refreshed.bearer().to_string());
        }

        Ok(token.bearer().to_string())
    }
}

/// A bearer token known up front.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenSource for StaticToken {
    async fn id_token(&self) -> AppResult<String> {
        Ok(self.0.clone())
    }
}
