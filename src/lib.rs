pub mod cli;
pub mod db;
pub mod llm;
pub mod models;
pub mod server;

use cli::Args;
use db::Database;
use llm::chat::new_client as new_chat_client;
use llm::LlmConfig;
use log::{ info, warn };
use server::api::AppState;
use server::Server;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let api_key = args.api_key();

    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Database URL: {}", args.database_url);
    info!("Chat Base URL: {}", args.chat_base_url);
    info!("Chat Model: {}", args.chat_model);
    info!("Environment: {}", args.environment);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("API Key Configured: {}", api_key.is_some());
    info!("-------------------------");

    if api_key.is_none() {
        warn!("NRP_API_KEY / OPENAI_API_KEY not set; user messages will fail until one is provided.");
    }

    let db = Database::connect(&args.database_url).await?;
    db.create_db_and_tables().await?;
    if args.skip_seed {
        info!("Seeding disabled");
    } else {
        db.seed_db().await?;
    }

    let chat_client = new_chat_client(
        &(LlmConfig {
            api_key,
            completion_model: Some(args.chat_model.clone()),
            base_url: Some(args.chat_base_url.clone()),
        })
    )?;

    let state = AppState::new(db, chat_client);
    let server = Server::new(args.server_addr.clone(), state, args);
    server.run().await?;

    Ok(())
}
