//! HTTP client for the remote session store.
//!
//! Talks JSON to the backend's `/api/v1` routes. Every failure is mapped to
//! `ChatError::Gateway`; the store's own `detail` text is preferred over a
//! generic message so it can be shown inline.

use async_trait::async_trait;
use chatdeck_core::config::ChatConfig;
use chatdeck_core::error::{ChatError, Result};
use chatdeck_core::gateway::{
    EditAck, SendTurnPayload, SendTurnResponse, SessionGateway, SessionSnapshot, SessionSummary,
};
use chatdeck_core::settings::SessionSettings;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const API_PREFIX: [&str; 2] = ["api", "v1"];

/// `SessionGateway` over HTTP.
#[derive(Clone)]
pub struct HttpSessionGateway {
    client: Client,
    base_url: Url,
}

impl HttpSessionGateway {
    /// Creates a gateway for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Config` when the URL cannot be parsed or the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ChatError::config(format!("Invalid API base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ChatError::config(format!(
                "API base URL '{base_url}' cannot carry a path"
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    /// Creates a gateway from the loaded configuration.
    pub fn from_config(config: &ChatConfig) -> Result<Self> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds `{base}/api/v1/{segments...}`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(API_PREFIX.iter())
                .extend(segments.iter());
        }
        url
    }

    async fn execute(&self, action: &str, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|err| map_transport_error(action, &err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = map_http_error(action, status, &body);
            tracing::warn!("[HttpSessionGateway] {} failed: {}", action, err);
            return Err(err);
        }
        Ok(response)
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        action: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.execute(action, request).await?;
        response.json::<T>().await.map_err(|err| {
            ChatError::gateway(format!("Failed to {action}: unreadable response ({err})"))
        })
    }
}

/// Wire form of a send. The store reads sampling values as top-level
/// fields and only saves a new chat when `save_chat` is set.
#[derive(Serialize)]
struct SendTurnBody<'a> {
    #[serde(flatten)]
    payload: &'a SendTurnPayload,
    save_chat: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repetition_penalty: Option<f64>,
}

impl<'a> From<&'a SendTurnPayload> for SendTurnBody<'a> {
    fn from(payload: &'a SendTurnPayload) -> Self {
        let sampling = &payload.sampling_settings;
        Self {
            payload,
            save_chat: payload.thread_id.is_none(),
            temperature: sampling.temperature,
            top_p: sampling.top_p,
            max_tokens: sampling.max_new_tokens,
            repetition_penalty: sampling.repetition_penalty,
        }
    }
}

#[derive(Serialize)]
struct EditMessageBody<'a> {
    new_content: &'a str,
}

#[derive(Serialize)]
struct RenameSessionBody<'a> {
    #[serde(rename = "newName")]
    new_name: &'a str,
}

#[derive(Serialize)]
struct SettingsUpdateBody<'a> {
    system_prompt: &'a str,
    temperature: f64,
    top_p: f64,
    max_new_tokens: u32,
    repetition_penalty: f64,
}

impl<'a> From<&'a SessionSettings> for SettingsUpdateBody<'a> {
    fn from(settings: &'a SessionSettings) -> Self {
        Self {
            system_prompt: &settings.system_prompt,
            temperature: settings.temperature,
            top_p: settings.top_p,
            max_new_tokens: settings.max_tokens,
            repetition_penalty: settings.repetition_penalty,
        }
    }
}

#[async_trait]
impl SessionGateway for HttpSessionGateway {
    async fn fetch_session(&self, thread_id: &str) -> Result<SessionSnapshot> {
        let url = self.endpoint(&["chat", "session", thread_id]);
        tracing::debug!("[HttpSessionGateway] GET {}", url);
        let mut snapshot: SessionSnapshot = self
            .execute_json("load session", self.client.get(url))
            .await?;
        if snapshot.thread_id.is_empty() {
            snapshot.thread_id = thread_id.to_string();
        }
        Ok(snapshot)
    }

    async fn send_turn(&self, payload: SendTurnPayload) -> Result<SendTurnResponse> {
        let url = self.endpoint(&["chat", "chat", "v2"]);
        tracing::debug!(
            "[HttpSessionGateway] POST {} (mode: {}, thread: {:?})",
            url,
            payload.mode,
            payload.thread_id
        );
        self.execute_json(
            "send message",
            self.client.post(url).json(&SendTurnBody::from(&payload)),
        )
        .await
    }

    async fn edit_message(
        &self,
        thread_id: &str,
        index: usize,
        new_content: &str,
    ) -> Result<EditAck> {
        let index = index.to_string();
        let url = self.endpoint(&["chat", "session", thread_id, "message", &index]);
        tracing::debug!("[HttpSessionGateway] PUT {}", url);
        self.execute_json(
            "edit message",
            self.client.put(url).json(&EditMessageBody { new_content }),
        )
        .await
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let url = self.endpoint(&["chat", "sessions"]);
        self.execute_json("list sessions", self.client.get(url))
            .await
    }

    async fn update_default_settings(&self, settings: &SessionSettings) -> Result<()> {
        let url = self.endpoint(&["settings", "update"]);
        self.execute(
            "update settings",
            self.client.post(url).json(&SettingsUpdateBody::from(settings)),
        )
        .await?;
        Ok(())
    }

    async fn rename_session(&self, thread_id: &str, title: &str) -> Result<()> {
        let url = self.endpoint(&["chat", "session", thread_id, "rename"]);
        self.execute(
            "rename session",
            self.client
                .put(url)
                .json(&RenameSessionBody { new_name: title }),
        )
        .await?;
        Ok(())
    }

    async fn delete_session(&self, thread_id: &str) -> Result<()> {
        let url = self.endpoint(&["chat", "session", thread_id]);
        self.execute("delete session", self.client.delete(url))
            .await?;
        Ok(())
    }
}

fn map_transport_error(action: &str, err: &reqwest::Error) -> ChatError {
    if err.is_timeout() {
        ChatError::gateway(format!("Failed to {action}: request timed out"))
    } else if err.is_connect() {
        ChatError::gateway(format!("Failed to {action}: backend unreachable"))
    } else {
        ChatError::gateway(format!("Failed to {action}: {err}"))
    }
}

/// Maps a non-success response to a gateway error.
///
/// The store reports failures as `{"detail": ...}`; a string detail is used
/// verbatim, a validation list is flattened to its messages.
fn map_http_error(action: &str, status: StatusCode, body: &str) -> ChatError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json.get("detail").and_then(detail_text))
        .unwrap_or_else(|| {
            let reason = status.canonical_reason().unwrap_or_default();
            format!("Failed to {action}: {} {reason}", status.as_u16())
                .trim_end()
                .to_string()
        });
    ChatError::gateway_with_status(detail, status.as_u16())
}

fn detail_text(detail: &Value) -> Option<String> {
    match detail {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .map(|item| {
                    item.get("msg")
                        .and_then(|msg| msg.as_str())
                        .map(|msg| msg.to_string())
                        .unwrap_or_else(|| item.to_string())
                })
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        Value::Null | Value::String(_) => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(base: &str) -> HttpSessionGateway {
        HttpSessionGateway::new(base, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_and_encodes_segments() {
        let gw = gateway("http://localhost:8000");
        assert_eq!(
            gw.endpoint(&["chat", "session", "a b/c"]).as_str(),
            "http://localhost:8000/api/v1/chat/session/a%20b%2Fc"
        );

        let prefixed = gateway("http://host/proxy/");
        assert_eq!(
            prefixed.endpoint(&["chat", "sessions"]).as_str(),
            "http://host/proxy/api/v1/chat/sessions"
        );
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        assert!(matches!(
            HttpSessionGateway::new("not a url", Duration::from_secs(1)),
            Err(ChatError::Config(_))
        ));
        assert!(matches!(
            HttpSessionGateway::new("mailto:someone@example.com", Duration::from_secs(1)),
            Err(ChatError::Config(_))
        ));
    }

    #[test]
    fn test_string_detail_is_verbatim() {
        let err = map_http_error(
            "load session",
            StatusCode::NOT_FOUND,
            r#"{"detail": "Session with ID 'x' not found."}"#,
        );
        assert_eq!(
            err,
            ChatError::gateway_with_status("Session with ID 'x' not found.", 404)
        );
    }

    #[test]
    fn test_validation_detail_list_is_flattened() {
        let err = map_http_error(
            "edit message",
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail": [{"loc": ["body"], "msg": "field required"}, {"msg": "too long"}]}"#,
        );
        assert_eq!(err.detail(), "field required; too long");
    }

    #[test]
    fn test_missing_detail_falls_back_to_status_text() {
        let err = map_http_error("edit message", StatusCode::INTERNAL_SERVER_ERROR, "oops");
        assert_eq!(
            err.detail(),
            "Failed to edit message: 500 Internal Server Error"
        );

        let blank = map_http_error("load session", StatusCode::BAD_GATEWAY, r#"{"detail": ""}"#);
        assert_eq!(blank.detail(), "Failed to load session: 502 Bad Gateway");
    }

    #[test]
    fn test_settings_body_uses_backend_names() {
        let settings = SessionSettings::default().with_max_tokens(64);
        let body = serde_json::to_value(SettingsUpdateBody::from(&settings)).unwrap();
        assert_eq!(body["max_new_tokens"], 64);
        assert_eq!(body["system_prompt"], settings.system_prompt.as_str());
        assert!(body.get("max_tokens").is_none());
    }
}
