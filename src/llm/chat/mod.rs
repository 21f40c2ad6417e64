pub mod openai;

use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use super::{ LlmConfig, LlmError };
use self::openai::OpenAIChatClient;
use crate::models::chat::ChatMessage;

/// Turns a conversation history into the assistant's next reply.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends `messages` in one request. `model` overrides the client's default.
    /// An absent or empty reply is an error, never an empty string.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: Option<&str>
    ) -> Result<String, LlmError>;

    fn get_model(&self) -> String;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client = OpenAIChatClient::from_config(config)?;
    Ok(Arc::new(client))
}

pub async fn generate_llm_response(
    client: &dyn ChatClient,
    messages: &[ChatMessage],
    model: Option<&str>
) -> Result<String, LlmError> {
    if messages.is_empty() {
        return Err(LlmError::EmptyHistory);
    }
    debug!(
        "Requesting completion for {} message(s) with model {}",
        messages.len(),
        model.map(str::to_owned).unwrap_or_else(|| client.get_model())
    );
    client.complete(messages, model).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::ChatRole;
    use std::sync::atomic::{ AtomicUsize, Ordering };

    struct CountingClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatClient for CountingClient {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _model: Option<&str>
        ) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{} in", messages.len()))
        }

        fn get_model(&self) -> String {
            "counting".into()
        }
    }

    #[tokio::test]
    async fn empty_history_never_reaches_client() {
        let client = CountingClient { calls: AtomicUsize::new(0) };
        let err = generate_llm_response(&client, &[], None).await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyHistory));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn history_is_forwarded() {
        let client = CountingClient { calls: AtomicUsize::new(0) };
        let history = [
            ChatMessage::new(ChatRole::System, "be brief"),
            ChatMessage::new(ChatRole::User, "hi"),
        ];
        let reply = generate_llm_response(&client, &history, Some("other")).await.unwrap();
        assert_eq!(reply, "2 in");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }
}
