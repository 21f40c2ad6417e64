use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("NRP_API_KEY / OPENAI_API_KEY not set")]
    MissingApiKey,

    #[error("API key is not a valid header value")]
    InvalidApiKey,

    #[error("no messages to send")]
    EmptyHistory,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion API returned {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },

    #[error("LLM returned empty response")]
    EmptyResponse,
}
