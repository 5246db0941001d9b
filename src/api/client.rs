use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{AppError, AppResult};

use super::MailApi;
use super::mails;
use super::models::{Attachment, CreatedMail, MailItem, NewMail};

#[derive(Debug, Clone)]
pub struct MailApiClient {
    http: Client,
    base_url: Url,
}

impl MailApiClient {
    pub fn new(base_url: &str) -> AppResult<Self> {
        let base_url = Url::parse(base_url.trim())?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "api base url `{base_url}` cannot carry a path"
            )));
        }

        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        access_token: &str,
        query: Option<&[(String, String)]>,
    ) -> AppResult<T> {
        let url = self.endpoint_url(segments)?;
        debug!(%url, "GET");
        let mut request = self.http.get(url).bearer_auth(access_token);
        if let Some(query) = query {
            request = request.query(query);
        }

        let response = request.send().await?;
        self.parse_json_response(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        segments: &[&str],
        access_token: &str,
        body: &B,
    ) -> AppResult<T> {
        let url = self.endpoint_url(segments)?;
        debug!(%url, "POST");
        let response = self
            .http
            .post(url)
            .bearer_auth(access_token)
            .json(body)
            .send()
            .await?;

        self.parse_json_response(response).await
    }

    async fn delete_resource(&self, segments: &[&str], access_token: &str) -> AppResult<()> {
        let url = self.endpoint_url(segments)?;
        debug!(%url, "DELETE");
        let response = self.http.delete(url).bearer_auth(access_token).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_api_error(status, &body))
    }

    fn endpoint_url(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                AppError::Config(format!(
                    "api base url `{}` cannot carry a path",
                    self.base_url
                ))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    async fn parse_json_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_api_error(status, &body))
    }
}

impl MailApi for MailApiClient {
    async fn list_all(&self, token: &str) -> AppResult<Vec<MailItem>> {
        let response: MailListResponse = self
            .get_json(&mails::collection_path(), token, None)
            .await?;
        Ok(response.into_items())
    }

    async fn search(&self, token: &str, key: &str) -> AppResult<Vec<MailItem>> {
        let query = mails::search_query(key);
        let response: MailListResponse = self
            .get_json(&mails::search_path(), token, Some(&query))
            .await?;
        Ok(response.into_items())
    }

    async fn create(&self, token: &str, mail: &NewMail) -> AppResult<CreatedMail> {
        self.post_json(&mails::collection_path(), token, mail).await
    }

    async fn delete(&self, token: &str, item_id: &str) -> AppResult<()> {
        self.delete_resource(&mails::item_path(item_id), token)
            .await
    }

    async fn upload_attachment(&self, presigned_url: &str, file: &Attachment) -> AppResult<()> {
        let url = Url::parse(presigned_url)?;
        debug!(
            host = url.host_str().unwrap_or_default(),
            bytes = file.data.len(),
            "PUT attachment"
        );
        let response = self
            .http
            .put(url)
            .header(CONTENT_TYPE, file.mime_type.as_str())
            .body(file.data.clone())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::Upload(format!(
            "storage rejected {} ({status}): {}",
            file.filename,
            summarize_body(&body)
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MailListResponse {
    Wrapped { items: Vec<MailItem> },
    Bare(Vec<MailItem>),
}

impl MailListResponse {
    fn into_items(self) -> Vec<MailItem> {
        match self {
            Self::Wrapped { items } | Self::Bare(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<String>,
}

fn summarize_body(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        "no error details in response body".to_string()
    } else {
        body.to_string()
    }
}

fn map_api_error(status: StatusCode, body: &str) -> AppError {
    let message = parse_api_error_message(body).unwrap_or_else(|| summarize_body(body));

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return AppError::Auth(format!(
            "mail api authorization failed ({status}): {message}. run `mailsched auth login`"
        ));
    }

    AppError::Api(format!("mail api request failed ({status}): {message}"))
}

fn parse_api_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<ApiErrorBody>(body).ok()?;
    let parts = [parsed.message, parsed.error]
        .into_iter()
        .flatten()
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>();

    if parts.is_empty() {
        return None;
    }

    Some(parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_base_path_when_joining_segments() {
        let client = MailApiClient::new("https://abc.execute-api.us-east-1.amazonaws.com/dev/")
            .expect("base url should parse");

        let url = client
            .endpoint_url(&mails::item_path("a b/c"))
            .expect("url should build");
        assert_eq!(
            url.as_str(),
            "https://abc.execute-api.us-east-1.amazonaws.com/dev/mails/a%20b%2Fc"
        );
    }

    #[test]
    fn rejects_non_hierarchical_base() {
        let result = MailApiClient::new("mailto:someone@example.com");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn decodes_wrapped_and_bare_lists() {
        let item = r#"{"itemId":"1","title":"A","content":"x","mailDestination":"a@b.com","sendDate":"2024-03-01T02:30:00Z","sendWithAttachment":false}"#;

        let wrapped: MailListResponse =
            serde_json::from_str(&format!(r#"{{"items":[{item}]}}"#)).expect("wrapped");
        let bare: MailListResponse = serde_json::from_str(&format!("[{item}]")).expect("bare");

        assert_eq!(wrapped.into_items()[0].item_id, "1");
        assert_eq!(bare.into_items()[0].title, "A");
    }

    #[test]
    fn maps_unauthorized_as_auth_error() {
        let error = map_api_error(StatusCode::UNAUTHORIZED, r#"{"message":"Unauthorized"}"#);

        match error {
            AppError::Auth(message) => {
                assert!(message.contains("Unauthorized"));
                assert!(message.contains("mailsched auth login"));
            }
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[test]
    fn maps_server_error_as_api_error() {
        let error = map_api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"dynamodb unavailable"}"#,
        );

        match error {
            AppError::Api(message) => assert!(message.contains("dynamodb unavailable")),
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_raw_body() {
        let error = map_api_error(StatusCode::BAD_GATEWAY, "  upstream timeout ");

        match error {
            AppError::Api(message) => assert!(message.ends_with("upstream timeout")),
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
