use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Settings;
use crate::error::{AppError, AppResult};

use super::token::TokenSet;
use super::token_store::TokenStore;

const OAUTH_CALLBACK_TIMEOUT_SECS: u64 = 180;
const OAUTH_SCOPES: &str = "openid profile email offline_access";

#[derive(Debug, Serialize)]
pub struct AuthLoginResult {
    pub profile: String,
    pub opened_browser: bool,
    pub authorization_url: String,
    pub email: Option<String>,
    pub note: String,
}

#[derive(Debug, Serialize)]
pub struct AuthStatus {
    pub profile: String,
    pub logged_in: bool,
    pub email: Option<String>,
    pub expired: Option<bool>,
    pub expires_in_seconds: Option<i64>,
    pub has_refresh_token: Option<bool>,
    pub note: Option<String>,
}

impl AuthStatus {
    fn logged_out(profile: &str, note: String) -> Self {
        Self {
            profile: profile.to_string(),
            logged_in: false,
            email: None,
            expired: None,
            expires_in_seconds: None,
            has_refresh_token: None,
            note: Some(note),
        }
    }
}

#[derive(Debug, Default)]
pub struct AuthService;

impl AuthService {
    pub async fn login<S: TokenStore>(
        profile: &str,
        settings: &Settings,
        store: &S,
    ) -> AppResult<AuthLoginResult> {
        let oauth = OAuthConfig::from_settings(settings)?;
        let flow = LoginFlow::new(&oauth)?;
        let opened_browser = open_browser(&flow.authorization_url);

        if !opened_browser {
            eprintln!(
                "open this URL in your browser to continue login:\n{}",
                flow.authorization_url
            );
        }

        let code = wait_for_auth_callback(
            &oauth.redirect_uri,
            &flow.state,
            Duration::from_secs(OAUTH_CALLBACK_TIMEOUT_SECS),
        )
        .await?;

        let token = request_token(
            &oauth,
            &[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("redirect_uri", oauth.redirect_uri.as_str()),
                ("code_verifier", flow.code_verifier.as_str()),
            ],
        )
        .await?;
        store.save(profile, &token)?;
        info!(profile, email = ?token.email, "login completed");

        Ok(AuthLoginResult {
            profile: profile.to_string(),
            opened_browser,
            authorization_url: flow.authorization_url,
            email: token.email,
            note: "oauth login completed and token stored".to_string(),
        })
    }

    pub async fn refresh<S: TokenStore>(
        profile: &str,
        settings: &Settings,
        store: &S,
    ) -> AppResult<TokenSet> {
        let current = store.load(profile)?.ok_or_else(not_logged_in)?;
        if !current.is_expired(SystemTime::now()) {
            return Ok(current);
        }

        let refresh_token = current.refresh_token.clone().ok_or_else(|| {
            AppError::Auth(
                "token expired and no refresh token is stored. run `mailsched auth login`"
                    .to_string(),
            )
        })?;

        let oauth = OAuthConfig::from_settings(settings)?;
        debug!(profile, "refreshing expired token");
        let mut refreshed = request_token(
            &oauth,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ],
        )
        .await?;

        refreshed.refresh_token.get_or_insert(refresh_token);
        if refreshed.email.is_none() {
            refreshed.email = current.email;
        }

        store.save(profile, &refreshed)?;
        Ok(refreshed)
    }

    pub async fn status<S: TokenStore>(profile: &str, store: &S) -> AppResult<AuthStatus> {
        let Some(token) = store.load(profile)? else {
            return Ok(AuthStatus::logged_out(profile, "no token found".to_string()));
        };

        let now = SystemTime::now();
        Ok(AuthStatus {
            profile: profile.to_string(),
            logged_in: true,
            email: token.email.clone(),
            expired: Some(token.is_expired(now)),
            expires_in_seconds: token.expires_in_seconds(now),
            has_refresh_token: Some(token.has_refresh_token()),
            note: Some("token loaded from local store".to_string()),
        })
    }

    pub async fn logout<S: TokenStore>(
        profile: &str,
        settings: &Settings,
        store: &S,
    ) -> AppResult<AuthStatus> {
        let refresh_token = store
            .load(profile)?
            .and_then(|token| token.refresh_token);

        let note = match (refresh_token, OAuthConfig::from_settings(settings)) {
            (Some(refresh_token), Ok(oauth)) => match revoke_token(&oauth, &refresh_token).await {
                Ok(()) => "refresh token revoked and local credentials removed".to_string(),
                Err(err) => {
                    warn!(profile, error = %err, "token revocation failed");
                    format!("local credentials removed (revoke failed: {err})")
                }
            },
            _ => "local credentials removed".to_string(),
        };

        store.clear(profile)?;
        Ok(AuthStatus::logged_out(profile, note))
    }
}

pub(crate) fn not_logged_in() -> AppError {
    AppError::Auth("not logged in. run `mailsched auth login`".to_string())
}

#[derive(Debug)]
struct OAuthConfig {
    domain_url: Url,
    client_id: String,
    client_secret: Option<String>,
    audience: Option<String>,
    redirect_uri: String,
}

impl OAuthConfig {
    fn from_settings(settings: &Settings) -> AppResult<Self> {
        let domain = settings.auth_domain()?;
        let domain_url = if domain.contains("://") {
            Url::parse(domain)?
        } else {
            Url::parse(&format!("https://{domain}"))?
        };

        Ok(Self {
            domain_url,
            client_id: settings.client_id()?.to_string(),
            client_secret: settings.client_secret().map(ToOwned::to_owned),
            audience: settings.audience().map(ToOwned::to_owned),
            redirect_uri: settings.redirect_uri(),
        })
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        Ok(self.domain_url.join(path)?)
    }
}

#[derive(Debug)]
struct LoginFlow {
    authorization_url: String,
    code_verifier: String,
    state: String,
}

impl LoginFlow {
    fn new(config: &OAuthConfig) -> AppResult<Self> {
        let state = random_token(32);
        let code_verifier = random_token(64);
        let code_challenge = pkce_challenge(&code_verifier);

        let mut url = config.endpoint("/authorize")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &config.client_id)
                .append_pair("redirect_uri", &config.redirect_uri)
                .append_pair("scope", OAUTH_SCOPES)
                .append_pair("state", &state)
                .append_pair("code_challenge", &code_challenge)
                .append_pair("code_challenge_method", "S256");
            if let Some(audience) = &config.audience {
                query.append_pair("audience", audience);
            }
        }

        Ok(Self {
            authorization_url: url.to_string(),
            code_verifier,
            state,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    token_type: Option<String>,
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    email: Option<String>,
}

async fn request_token(config: &OAuthConfig, grant: &[(&str, &str)]) -> AppResult<TokenSet> {
    let mut form = grant.to_vec();
    form.push(("client_id", config.client_id.as_str()));
    if let Some(client_secret) = &config.client_secret {
        form.push(("client_secret", client_secret.as_str()));
    }

    let response = reqwest::Client::new()
        .post(config.endpoint("/oauth/token")?)
        .form(&form)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(token_error(status, &body));
    }

    let payload: OAuthTokenResponse = serde_json::from_str(&body)?;
    let email = payload.id_token.as_deref().and_then(email_from_id_token);

    Ok(TokenSet {
        access_token: payload.access_token,
        id_token: payload.id_token,
        refresh_token: payload.refresh_token,
        expires_at_unix: expires_at_unix(payload.expires_in),
        token_type: payload.token_type,
        scope: payload.scope,
        email,
    })
}

fn token_error(status: reqwest::StatusCode, body: &str) -> AppError {
    match serde_json::from_str::<OAuthErrorResponse>(body) {
        Ok(OAuthErrorResponse {
            error,
            error_description,
        }) if error.is_some() || error_description.is_some() => AppError::Auth(format!(
            "oauth token exchange failed ({status}): {} ({})",
            error.unwrap_or_else(|| "unknown_oauth_error".to_string()),
            error_description.unwrap_or_else(|| "no description".to_string()),
        )),
        _ => AppError::Auth(format!(
            "oauth token exchange failed ({status}): {}",
            body.trim()
        )),
    }
}

/// Reads the `email` claim without verifying the signature; the token came
/// straight from the token endpoint over TLS.
fn email_from_id_token(id_token: &str) -> Option<String> {
    let payload = id_token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: IdTokenClaims = serde_json::from_slice(&decoded).ok()?;
    claims.email.filter(|email| !email.is_empty())
}

fn expires_at_unix(expires_in: Option<u64>) -> Option<u64> {
    let expires_in = expires_in?;
    let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
    Some(now.saturating_add(expires_in))
}

async fn revoke_token(config: &OAuthConfig, token: &str) -> AppResult<()> {
    let mut form = vec![("token", token), ("client_id", config.client_id.as_str())];
    if let Some(client_secret) = &config.client_secret {
        form.push(("client_secret", client_secret.as_str()));
    }

    let response = reqwest::Client::new()
        .post(config.endpoint("/oauth/revoke")?)
        .form(&form)
        .send()
        .await?;

    if response.status().is_success() {
        return Ok(());
    }

    Err(AppError::Auth(format!(
        "revoke endpoint returned {}",
        response.status()
    )))
}

async fn wait_for_auth_callback(
    redirect_uri: &str,
    expected_state: &str,
    timeout: Duration,
) -> AppResult<String> {
    let redirect = Url::parse(redirect_uri)?;
    if redirect.scheme() != "http" {
        return Err(AppError::Config(
            "redirect_uri must use http for local callback capture".to_string(),
        ));
    }

    let host = redirect
        .host_str()
        .ok_or_else(|| AppError::Config("redirect_uri is missing host".to_string()))?;
    let port = redirect
        .port_or_known_default()
        .ok_or_else(|| AppError::Config("redirect_uri is missing port".to_string()))?;

    let listener = TcpListener::bind((host, port)).await.map_err(|err| {
        AppError::Auth(format!(
            "failed to bind oauth callback listener on {host}:{port}: {err}"
        ))
    })?;
    debug!(host, port, "waiting for oauth callback");

    time::timeout(timeout, accept_callback(&listener, redirect.path(), expected_state))
        .await
        .map_err(|_| AppError::Auth("timed out waiting for oauth callback".to_string()))?
}

async fn accept_callback(
    listener: &TcpListener,
    expected_path: &str,
    expected_state: &str,
) -> AppResult<String> {
    let (mut stream, _) = listener.accept().await?;

    let mut buf = vec![0_u8; 8192];
    let size = stream.read(&mut buf).await?;
    let request = String::from_utf8_lossy(&buf[..size]);
    let mut request_line = request.lines().next().unwrap_or_default().split_whitespace();

    let (Some("GET"), Some(target)) = (request_line.next(), request_line.next()) else {
        write_callback_response(
            &mut stream,
            "405 Method Not Allowed",
            "oauth callback only accepts GET requests",
        )
        .await?;
        return Err(AppError::Auth(
            "oauth callback received a malformed or non-GET request".to_string(),
        ));
    };

    match extract_callback_code(target, expected_path, expected_state) {
        Ok(code) => {
            write_callback_response(
                &mut stream,
                "200 OK",
                "mailsched login complete. you can return to the terminal.",
            )
            .await?;
            Ok(code)
        }
        Err(err) => {
            let _ = write_callback_response(
                &mut stream,
                "400 Bad Request",
                &format!("oauth callback error: {err}"),
            )
            .await;
            Err(err)
        }
    }
}

fn extract_callback_code(
    target: &str,
    expected_path: &str,
    expected_state: &str,
) -> AppResult<String> {
    let callback_url = Url::parse(&format!("http://localhost{target}"))?;
    if callback_url.path() != expected_path {
        return Err(AppError::Auth(format!(
            "oauth callback path mismatch: expected {expected_path}, got {}",
            callback_url.path()
        )));
    }

    let param = |name: &str| {
        callback_url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if let Some(error) = param("error") {
        let description = param("error_description").unwrap_or_else(|| "no description".into());
        return Err(AppError::Auth(format!(
            "oauth authorization failed: {error} ({description})"
        )));
    }

    let received_state = param("state")
        .ok_or_else(|| AppError::Auth("oauth callback missing state parameter".to_string()))?;
    if received_state != expected_state {
        return Err(AppError::Auth(
            "oauth state mismatch; aborting login".to_string(),
        ));
    }

    param("code").ok_or_else(|| AppError::Auth("oauth callback missing code parameter".to_string()))
}

async fn write_callback_response(
    stream: &mut TcpStream,
    status: &str,
    message: &str,
) -> AppResult<()> {
    let body = format!(
        "<!doctype html><html><body><p>{}</p></body></html>",
        escape_html(message)
    );

    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

fn random_token(len: usize) -> String {
    let mut bytes = vec![0_u8; len];
    rand::thread_rng().fill(bytes.as_mut_slice());
    URL_SAFE_NO_PAD.encode(bytes)
}

fn pkce_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

fn open_browser(url: &str) -> bool {
    let mut command = if cfg!(target_os = "macos") {
        std::process::Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut command = std::process::Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    } else {
        std::process::Command::new("xdg-open")
    };

    command
        .arg(url)
        .status()
        .is_ok_and(|status| status.success())
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            auth_domain: Some("dev-xyz.us.auth0.com".to_string()),
            client_id: Some("client-123".to_string()),
            audience: Some("https://mails.example.com".to_string()),
            ..Settings::default()
        }
    }

    #[test]
    fn parses_callback_code() {
        let code = extract_callback_code("/callback?code=abc123&state=xyz", "/callback", "xyz")
            .expect("callback should parse");
        assert_eq!(code, "abc123");
    }

    #[test]
    fn rejects_state_mismatch() {
        let result =
            extract_callback_code("/callback?code=abc123&state=wrong", "/callback", "expected");
        assert!(result.is_err());
    }

    #[test]
    fn surfaces_provider_error() {
        let result = extract_callback_code(
            "/callback?error=access_denied&error_description=user%20cancelled&state=xyz",
            "/callback",
            "xyz",
        );

        match result {
            Err(AppError::Auth(message)) => assert!(message.contains("user cancelled")),
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[test]
    fn authorization_url_targets_tenant() {
        let config = OAuthConfig::from_settings(&settings()).expect("config");
        let flow = LoginFlow::new(&config).expect("flow");
        let url = Url::parse(&flow.authorization_url).expect("url");

        assert_eq!(url.host_str(), Some("dev-xyz.us.auth0.com"));
        assert_eq!(url.path(), "/authorize");
        let audience = url
            .query_pairs()
            .find(|(key, _)| key == "audience")
            .map(|(_, value)| value.into_owned());
        assert_eq!(audience.as_deref(), Some("https://mails.example.com"));
    }

    #[test]
    fn reads_email_claim_from_id_token() {
        let claims = URL_SAFE_NO_PAD.encode(r#"{"email":"me@example.com","sub":"auth0|1"}"#);
        let id_token = format!("header.{claims}.signature");
        assert_eq!(
            email_from_id_token(&id_token).as_deref(),
            Some("me@example.com")
        );
        assert_eq!(email_from_id_token("not-a-jwt"), None);
    }

    #[test]
    fn builds_pkce_challenge() {
        let challenge = pkce_challenge("test_verifier_value");
        assert_eq!(challenge.len(), 43);
    }

    #[test]
    fn random_token_is_non_empty() {
        let token = random_token(32);
        assert!(token.len() >= 43);
    }
}
