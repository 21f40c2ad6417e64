//! SQLite-backed persistence for conversations and their messages.
//!
//! Deleting a conversation removes its messages through the `ON DELETE
//! CASCADE` rule on `message.conversation_id`; nothing in the application
//! deletes messages directly.

mod error;
mod session;

pub use error::DbError;
pub use session::Session;

use chrono::Utc;
use log::{ debug, info };
use sqlx::sqlite::{ SqliteConnectOptions, SqlitePool, SqlitePoolOptions };
use std::str::FromStr;

const MAX_CONNECTIONS: u32 = 16;

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS conversation (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS message (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        conversation_id INTEGER NOT NULL
            REFERENCES conversation(id) ON DELETE CASCADE,
        content TEXT NOT NULL,
        role TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_message_conversation_created
        ON message (conversation_id, created_at, id)
    "#,
];

const SEED_TITLE: &str = "Welcome";
const SEED_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const SEED_GREETING: &str = "Hi! Send a message to start chatting.";

#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(database_url: &str) -> Result<Self, DbError> {
        debug!("Connecting to database: {}", database_url);
        let opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(opts)
            .await?;

        Ok(Self { pool })
    }

    /// A private in-memory database. Every connection to `:memory:` opens a
    /// fresh database, so the pool is pinned to one connection that never
    /// expires.
    pub async fn in_memory() -> Result<Self, DbError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;

        Ok(Self { pool })
    }

    /// Creates both tables if they are missing. Safe to call on every start.
    pub async fn create_db_and_tables(&self) -> Result<(), DbError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Inserts the demo conversation into an empty store. Returns whether
    /// anything was written.
    pub async fn seed_db(&self) -> Result<bool, DbError> {
        let mut tx = self.pool.begin().await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conversation")
            .fetch_one(&mut *tx)
            .await?;
        if existing > 0 {
            debug!("Database already holds {} conversation(s), skipping seed", existing);
            return Ok(false);
        }

        let now = Utc::now();
        let conversation_id: i64 = sqlx::query_scalar(
            "INSERT INTO conversation (title, created_at) VALUES (?, ?) RETURNING id"
        )
            .bind(SEED_TITLE)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        for (role, content) in [("system", SEED_SYSTEM_PROMPT), ("assistant", SEED_GREETING)] {
            sqlx::query(
                "INSERT INTO message (conversation_id, content, role, created_at) VALUES (?, ?, ?, ?)"
            )
                .bind(conversation_id)
                .bind(content)
                .bind(role)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!("Seeded database with demo conversation {}", conversation_id);
        Ok(true)
    }

    /// Checks out one connection for the lifetime of a request. It goes back
    /// to the pool when the `Session` is dropped.
    pub async fn get_session(&self) -> Result<Session, DbError> {
        let conn = self.pool.acquire().await?;
        Ok(Session::new(conn))
    }
}
