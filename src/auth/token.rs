use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at_unix: Option<u64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub email: Option<String>,
}

impl TokenSet {
    const EXPIRY_SKEW_SECS: u64 = 30;

    pub fn is_expired(&self, now: SystemTime) -> bool {
        let Some(expires_at) = self.expires_at_unix else {
            return false;
        };

        let Ok(duration) = now.duration_since(UNIX_EPOCH) else {
            return false;
        };

        duration.as_secs().saturating_add(Self::EXPIRY_SKEW_SECS) >= expires_at
    }

    pub fn expires_in_seconds(&self, now: SystemTime) -> Option<i64> {
        let expires_at = self.expires_at_unix? as i64;
        let now_secs = now.duration_since(UNIX_EPOCH).ok()?.as_secs() as i64;
        Some(expires_at - now_secs)
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Bearer credential for the mail API: the id token when the provider issued one.
    pub fn bearer(&self) -> &str {
        self.id_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .unwrap_or(&self.access_token)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn token(expires_at_unix: Option<u64>, id_token: Option<&str>) -> TokenSet {
        TokenSet {
            access_token: "access".to_string(),
            id_token: id_token.map(ToOwned::to_owned),
            refresh_token: None,
            expires_at_unix,
            token_type: Some("Bearer".to_string()),
            scope: None,
            email: None,
        }
    }

    #[test]
    fn expiry_includes_skew() {
        let now = UNIX_EPOCH + Duration::from_secs(1_000);
        assert!(token(Some(1_020), None).is_expired(now));
        assert!(!token(Some(1_100), None).is_expired(now));
        assert!(!token(None, None).is_expired(now));
    }

    #[test]
    fn bearer_prefers_id_token() {
        assert_eq!(token(None, Some("id")).bearer(), "id");
        assert_eq!(token(None, Some("")).bearer(), "access");
        assert_eq!(token(None, None).bearer(), "access");
    }
}
