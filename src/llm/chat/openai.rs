use async_trait::async_trait;
use log::{ debug, error };
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::Serialize;
use serde_json::Value;

use super::ChatClient;
use crate::llm::{ LlmConfig, LlmError, DEFAULT_BASE_URL, DEFAULT_MODEL };
use crate::models::chat::ChatMessage;

/// Client for any endpoint speaking the OpenAI chat-completions protocol.
///
/// The API key is checked on every call rather than at construction, so a
/// server without credentials still starts and only message relays fail.
pub struct OpenAIChatClient {
    http: HttpClient,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

impl OpenAIChatClient {
    pub fn new(
        api_key: Option<String>,
        model: Option<String>,
        base_url: Option<String>
    ) -> Result<Self, LlmError> {
        let chat_model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            api_key: api_key.filter(|k| !k.is_empty()),
            model: chat_model,
            base_url: api_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Self::new(
            config.api_key.clone(),
            config.completion_model.clone(),
            config.base_url.clone()
        )
    }

    fn completions_url(&self) -> String {
        if self.base_url.ends_with("/chat/completions") {
            self.base_url.clone()
        } else {
            format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
        }
    }

    fn auth_header(&self) -> Result<HeaderValue, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;
        HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|_| LlmError::InvalidApiKey)
    }
}

/// Pulls the reply text out of a completion body.
///
/// Accepts `content` either as a plain string or as a list of typed parts
/// (`[{"type": "text", "text": ...}]`). Missing, null or empty content is
/// reported as `EmptyResponse`.
pub fn extract_content(body: &Value) -> Result<String, LlmError> {
    let text = match body.pointer("/choices/0/message/content") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(parts)) =>
            Some(
                parts
                    .iter()
                    .filter_map(|part| {
                        part.get("text")
                            .and_then(Value::as_str)
                            .or_else(|| part.as_str())
                    })
                    .collect::<String>()
            ),
        _ => None,
    };

    text.filter(|t| !t.is_empty()).ok_or(LlmError::EmptyResponse)
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: Option<&str>
    ) -> Result<String, LlmError> {
        let auth = self.auth_header()?;
        let url = self.completions_url();
        let req = OpenAIChatRequest {
            model: model.unwrap_or(&self.model),
            messages,
        };

        debug!("POST {} ({} messages, model {})", url, messages.len(), req.model);
        let resp = self.http.post(&url).header(AUTHORIZATION, auth).json(&req).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("Completion API returned {}: {}", status, body);
            return Err(LlmError::Status { status: status.as_u16(), body });
        }

        let body: Value = resp.json().await?;
        extract_content(&body)
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}
