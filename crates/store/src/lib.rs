//! Conversation persistence: users and their message history.
//!
//! Two tables, `users` and `messages`, both append-only from the point of
//! view of the pipeline. History reads are scoped by phone number.

pub mod error;
pub mod sqlite;
pub mod store;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub use {
    error::{Result, StoreError},
    sqlite::SqliteConversationStore,
    store::{ConversationStore, DEFAULT_DISPLAY_NAME, DEFAULT_HISTORY_LIMIT, User},
};

/// Open a connection pool for the given sqlx URL.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect(url)
        .await?;
    Ok(pool)
}

/// Run database migrations for the store (creates `users` and `messages`).
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
