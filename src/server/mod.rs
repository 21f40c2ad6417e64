pub mod api;
pub mod error;

use crate::cli::Args;
use api::AppState;
use log::info;
use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Static assets are mounted only in production and only when the directory
/// exists.
pub fn static_dir(args: &Args) -> Option<PathBuf> {
    if !args.is_production() {
        return None;
    }
    let dir = PathBuf::from(&args.static_dir);
    if dir.is_dir() {
        Some(dir)
    } else {
        info!("Static directory {} not found, /app not mounted", dir.display());
        None
    }
}

pub struct Server {
    addr: String,
    state: AppState,
    args: Args,
}

impl Server {
    pub fn new(addr: String, state: AppState, args: Args) -> Self {
        Self { addr, state, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        let app = api::router(self.state.clone(), static_dir(&self.args));

        match (self.args.enable_tls, &self.args.tls_cert_path, &self.args.tls_key_path) {
            (true, Some(cert_path), Some(key_path)) => {
                info!(
                    "TLS enabled. Loading certificate from '{}' and key from '{}'",
                    cert_path,
                    key_path
                );
                let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                    cert_path,
                    key_path
                ).await?;

                info!("Starting HTTPS API server on: https://{}", addr);
                axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
            }
            (true, _, _) => {
                return Err("Both --tls-cert-path and --tls-key-path must be provided to enable TLS".into());
            }
            (false, _, _) => {
                let listener = tokio::net::TcpListener::bind(addr).await?;
                info!("Starting HTTP API server on: http://{}", addr);
                axum::serve(listener, app.into_make_service()).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(environment: &str, dir: &str) -> Args {
        Args::try_parse_from(["chat-relay", "--environment", environment, "--static-dir", dir]).unwrap()
    }

    #[test]
    fn assets_only_mounted_in_production() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();

        assert_eq!(static_dir(&args("production", path)), Some(dir.path().to_path_buf()));
        assert_eq!(static_dir(&args("development", path)), None);
    }

    #[test]
    fn missing_directory_is_not_mounted() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("dist");

        assert_eq!(static_dir(&args("production", missing.to_str().unwrap())), None);
    }
}
