//! The single HTTP client every backend call goes through.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use taskpilot_core::config::ApiConfig;
use taskpilot_core::error::{AppError, ErrorKind};
use taskpilot_core::result::AppResult;
use taskpilot_core::traits::{ACCESS_TOKEN_KEY, CredentialStore};

/// HTTP client bound to the backend base URL.
///
/// Every request passes through [`RequestDispatcher::intercept`], which
/// attaches the stored access token as a bearer credential when one is
/// present. The dispatcher never checks whether the session is usable;
/// callers do that first.
#[derive(Clone)]
pub struct RequestDispatcher {
    /// Shared connection pool.
    http: reqwest::Client,
    /// Base URL, always ending in `/`.
    base_url: Url,
    /// Source of the bearer token.
    store: Arc<dyn CredentialStore>,
}

impl fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl RequestDispatcher {
    /// Builds the dispatcher from API configuration.
    pub fn new(config: &ApiConfig, store: Arc<dyn CredentialStore>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: normalize_base_url(&config.base_url)?,
            store,
        })
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Credential store the bearer token is read from.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Resolves `path` against the base URL and appends query pairs.
    pub fn url(&self, path: &str, query: &[(&str, String)]) -> AppResult<Url> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| AppError::internal(format!("Invalid request path '{path}': {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Outbound interceptor: attaches `Authorization: Bearer <access_token>`
    /// when a token is stored, and leaves the request untouched otherwise.
    fn intercept(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.store.get(ACCESS_TOKEN_KEY) {
            Ok(Some(token)) if !token.is_empty() => builder.bearer_auth(token),
            Ok(_) => builder,
            Err(e) => {
                warn!(error = %e, "Could not read access token, sending request without it");
                builder
            }
        }
    }

    /// Sends one request and returns the raw response, whatever its status.
    pub async fn send<B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> AppResult<Response>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path, query)?;
        debug!(method = %method, url = %url, "Dispatching request");

        let mut builder = self.intercept(self.http.request(method, url));
        if let Some(body) = body {
            builder = builder.json(body);
        }

        builder.send().await.map_err(map_reqwest_error)
    }

    /// Sends one request and decodes a successful JSON response.
    pub async fn execute<B, T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(method, path, query, body).await?;
        decode_response(response).await
    }

    /// `GET path`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.execute::<(), T>(Method::GET, path, &[], None).await
    }

    /// `GET path?query`.
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        self.execute::<(), T>(Method::GET, path, query, None).await
    }

    /// `POST path` with a JSON body.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(Method::POST, path, &[], Some(body)).await
    }

    /// `POST path` without a body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.execute::<(), T>(Method::POST, path, &[], None).await
    }

    /// `PATCH path` with a JSON body.
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(Method::PATCH, path, &[], Some(body)).await
    }

    /// `DELETE path`.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.execute::<(), T>(Method::DELETE, path, &[], None).await
    }

    /// `DELETE path` with a JSON body.
    pub async fn delete_with_body<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(Method::DELETE, path, &[], Some(body)).await
    }
}

/// Decodes a response: success bodies as `T` (an empty body reads as
/// `null`), failure statuses as an [`AppError`].
pub async fn decode_response<T: DeserializeOwned>(response: Response) -> AppResult<T> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;

    if !status.is_success() {
        let body = String::from_utf8_lossy(&bytes);
        return Err(status_error(status, &body));
    }

    let payload: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &bytes
    };
    serde_json::from_slice(payload).map_err(AppError::from)
}

/// Maps a failure status and its body onto an [`AppError`].
pub fn status_error(status: StatusCode, body: &str) -> AppError {
    let message = error_detail(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Unexpected response")
            .to_string()
    });
    let message = format!("{message} (HTTP {})", status.as_u16());

    match status {
        StatusCode::UNAUTHORIZED => AppError::authentication(message),
        StatusCode::FORBIDDEN => AppError::authorization(message),
        StatusCode::NOT_FOUND => AppError::not_found(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AppError::validation(message),
        StatusCode::CONFLICT => AppError::conflict(message),
        StatusCode::TOO_MANY_REQUESTS => AppError::rate_limit(message),
        s if s.is_server_error() => AppError::external_service(message),
        _ => AppError::internal(message),
    }
}

/// Extracts the `detail` field of an error body. Validation errors carry a
/// list of `{loc, msg}` objects instead of a string.
pub fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(detail) => Some(detail.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| {
                    let msg = item.get("msg")?.as_str()?;
                    let field = item
                        .get("loc")
                        .and_then(|loc| loc.as_array())
                        .and_then(|loc| loc.last())
                        .and_then(|last| last.as_str());
                    Some(match field {
                        Some(field) => format!("{field}: {msg}"),
                        None => msg.to_string(),
                    })
                })
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        other => Some(other.to_string()),
    }
}

/// Maps a client-side request failure onto an [`AppError`].
pub fn map_reqwest_error(err: reqwest::Error) -> AppError {
    if err.is_decode() {
        AppError::with_source(
            ErrorKind::Serialization,
            format!("Unreadable response body: {err}"),
            err,
        )
    } else if err.is_builder() {
        AppError::with_source(
            ErrorKind::Internal,
            format!("Invalid request: {err}"),
            err,
        )
    } else {
        let message = if err.is_timeout() {
            format!("Request timed out: {err}")
        } else {
            format!("Request failed: {err}")
        };
        AppError::with_source(ErrorKind::Transport, message, err)
    }
}

fn normalize_base_url(raw: &str) -> AppResult<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| AppError::configuration(format!("Invalid API base URL '{raw}': {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskpilot_auth::MemoryCredentialStore;

    fn dispatcher(base_url: &str) -> RequestDispatcher {
        let config = ApiConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        };
        RequestDispatcher::new(&config, Arc::new(MemoryCredentialStore::new())).unwrap()
    }

    #[test]
    fn test_url_joins_under_base_path() {
        let d = dispatcher("https://tasks.example.com/api");
        assert_eq!(
            d.url("/tasks/", &[]).unwrap().as_str(),
            "https://tasks.example.com/api/tasks/"
        );
        assert_eq!(
            d.url("auth/reset-password", &[("token", "a b&c".to_string())])
                .unwrap()
                .as_str(),
            "https://tasks.example.com/api/auth/reset-password?token=a+b%26c"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ApiConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        let err = RequestDispatcher::new(&config, Arc::new(MemoryCredentialStore::new()))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_status_error_kinds() {
        assert_eq!(status_error(StatusCode::UNAUTHORIZED, "").kind, ErrorKind::Authentication);
        assert_eq!(status_error(StatusCode::FORBIDDEN, "").kind, ErrorKind::Authorization);
        assert_eq!(status_error(StatusCode::NOT_FOUND, "").kind, ErrorKind::NotFound);
        assert_eq!(
            status_error(StatusCode::UNPROCESSABLE_ENTITY, "").kind,
            ErrorKind::Validation
        );
        assert_eq!(
            status_error(StatusCode::BAD_GATEWAY, "").kind,
            ErrorKind::ExternalService
        );
    }

    #[test]
    fn test_error_detail_string_and_list() {
        assert_eq!(
            error_detail(r#"{"detail": "Task not found"}"#),
            Some("Task not found".to_string())
        );
        assert_eq!(
            error_detail(
                r#"{"detail": [{"loc": ["body", "end_time"], "msg": "end_time must be after start_time"}]}"#
            ),
            Some("end_time: end_time must be after start_time".to_string())
        );
        assert_eq!(error_detail("<html>oops</html>"), None);
    }

    #[test]
    fn test_status_error_message() {
        let err = status_error(StatusCode::NOT_FOUND, r#"{"detail": "Task not found"}"#);
        assert_eq!(err.message, "Task not found (HTTP 404)");
    }
}
