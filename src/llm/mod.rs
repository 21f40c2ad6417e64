pub mod chat;
mod error;

pub use error::LlmError;

pub const DEFAULT_MODEL: &str = "gemma3";
pub const DEFAULT_BASE_URL: &str = "https://ellm.nrp-nautilus.io/v1";

#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
}
