use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::mail::schedule::SendDateMode;

use super::paths::write_private;

const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8787/callback";
pub const API_URL_ENV: &str = "MAILSCHED_API_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub auth_domain: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub send_date_mode: SendDateMode,
}

impl Settings {
    pub fn api_base_url(&self) -> AppResult<String> {
        self.resolve_api_base_url(std::env::var(API_URL_ENV).ok())
    }

    fn resolve_api_base_url(&self, from_env: Option<String>) -> AppResult<String> {
        from_env
            .or_else(|| self.api_base_url.clone())
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                AppError::Config(format!(
                    "missing api_base_url in profile settings. add it to your profile json or set {API_URL_ENV}"
                ))
            })
    }

    pub fn auth_domain(&self) -> AppResult<&str> {
        non_blank(self.auth_domain.as_deref()).ok_or_else(|| {
            AppError::Config(
                "missing auth_domain in profile settings. run `mailsched auth login` to be prompted"
                    .to_string(),
            )
        })
    }

    pub fn client_id(&self) -> AppResult<&str> {
        non_blank(self.client_id.as_deref()).ok_or_else(|| {
            AppError::Config(
                "missing oauth client_id in profile settings. add it to your profile json"
                    .to_string(),
            )
        })
    }

    pub fn client_secret(&self) -> Option<&str> {
        non_blank(self.client_secret.as_deref())
    }

    pub fn audience(&self) -> Option<&str> {
        non_blank(self.audience.as_deref())
    }

    pub fn redirect_uri(&self) -> String {
        non_blank(self.redirect_uri.as_deref())
            .unwrap_or(DEFAULT_REDIRECT_URI)
            .to_string()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub fn load(path: &Path) -> AppResult<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(path)?;
    let settings = serde_json::from_str(&raw)?;
    Ok(settings)
}

pub fn save(path: &Path, settings: &Settings) -> AppResult<()> {
    let payload = serde_json::to_string_pretty(settings)?;
    write_private(path, &payload)
}
