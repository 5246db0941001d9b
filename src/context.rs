use crate::api::MailApiClient;
use crate::auth::{FileTokenStore, ProfileTokenSource};
use crate::config::{self, AppPaths, Settings};
use crate::error::AppResult;
use crate::mail::MailStore;
use crate::output::Output;

pub type CliMailStore = MailStore<MailApiClient, ProfileTokenSource>;

#[derive(Debug)]
pub struct AppContext {
    pub profile: String,
    pub paths: AppPaths,
    pub settings: Settings,
    pub token_store: FileTokenStore,
    pub output: Output,
}

impl AppContext {
    pub fn bootstrap(profile: String, json: bool) -> AppResult<Self> {
        let profile = config::resolve_profile(&profile);
        let paths = AppPaths::discover()?;
        let settings = config::load_settings(&paths, &profile)?;
        let token_store = FileTokenStore::new(paths.clone());
        let output = Output::new(json);

        Ok(Self {
            profile,
            paths,
            settings,
            token_store,
            output,
        })
    }

    pub fn token_source(&self) -> ProfileTokenSource {
        ProfileTokenSource::new(
            self.profile.clone(),
            self.settings.clone(),
            self.token_store.clone(),
        )
    }

    pub fn mail_store(&self) -> AppResult<CliMailStore> {
        let client = MailApiClient::new(&self.settings.api_base_url()?)?;
        Ok(MailStore::new(client, self.token_source())
            .with_send_date_mode(self.settings.send_date_mode))
    }
}
