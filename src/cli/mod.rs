use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Address the HTTP API binds to
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:8000")]
    pub server_addr: String,

    /// Deployment environment. Static assets are only served in "production".
    #[arg(long, env = "ENVIRONMENT", default_value = "development")]
    pub environment: String,

    /// Directory holding the built frontend, mounted under /app in production
    #[arg(long, env = "STATIC_DIR", default_value = "static")]
    pub static_dir: String,

    /// Enable TLS for the HTTP API
    #[arg(long, env = "ENABLE_TLS", default_value_t = false)]
    pub enable_tls: bool,

    /// Path to the TLS certificate (PEM)
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Path to the TLS private key (PEM)
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    // --- Database Args ---
    /// SQLite connection string (e.g., sqlite://database.db)
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://database.db")]
    pub database_url: String,

    /// Do not insert the demo conversation into an empty database
    #[arg(long, env = "SKIP_SEED", default_value_t = false)]
    pub skip_seed: bool,

    // --- Chat LLM Provider Args ---
    /// Base URL of the OpenAI-compatible chat completion API
    #[arg(long, env = "CHAT_BASE_URL", default_value = "https://ellm.nrp-nautilus.io/v1")]
    pub chat_base_url: String,

    /// Model name sent with every completion request
    #[arg(long, env = "CHAT_MODEL", default_value = "gemma3")]
    pub chat_model: String,

    /// API key for the NRP endpoint. Takes precedence over OPENAI_API_KEY.
    #[arg(long, env = "NRP_API_KEY", hide_env_values = true)]
    pub nrp_api_key: Option<String>,

    /// Fallback API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,
}

impl Args {
    /// First non-empty credential, NRP before OpenAI.
    pub fn api_key(&self) -> Option<String> {
        [&self.nrp_api_key, &self.openai_api_key]
            .into_iter()
            .flatten()
            .find(|k| !k.is_empty())
            .cloned()
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["chat-relay"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn nrp_key_wins_over_openai_key() {
        let args = parse(&["--nrp-api-key", "nrp", "--openai-api-key", "oai"]);
        assert_eq!(args.api_key().as_deref(), Some("nrp"));
    }

    #[test]
    fn empty_nrp_key_falls_through() {
        let args = parse(&["--nrp-api-key", "", "--openai-api-key", "oai"]);
        assert_eq!(args.api_key().as_deref(), Some("oai"));
    }

    #[test]
    fn whitespace_key_is_kept() {
        let args = parse(&["--nrp-api-key", " ", "--openai-api-key", "oai"]);
        assert_eq!(args.api_key().as_deref(), Some(" "));
    }

    #[test]
    fn production_flag_is_exact_match() {
        assert!(parse(&["--environment", "production"]).is_production());
        assert!(!parse(&["--environment", "Production"]).is_production());
    }
}
