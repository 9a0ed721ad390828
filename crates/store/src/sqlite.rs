use std::time::{SystemTime, UNIX_EPOCH};

use {
    async_trait::async_trait,
    parley_common::{HistoryTurn, Role},
    sqlx::SqlitePool,
    tracing::{debug, warn},
};

use crate::{
    Result,
    store::{ConversationStore, DEFAULT_DISPLAY_NAME, User},
};

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    phone_number: String,
    display_name: String,
    created_at: i64,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            phone_number: r.phone_number,
            display_name: r.display_name,
            created_at: r.created_at,
        }
    }
}

/// SQLite-backed conversation store.
pub struct SqliteConversationStore {
    pool: SqlitePool,
}

impl SqliteConversationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Oldest user record for a phone number, if any.
    pub async fn find_user(&self, phone_number: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, phone_number, display_name, created_at
             FROM users
             WHERE phone_number = ?
             ORDER BY created_at ASC, rowid ASC
             LIMIT 1",
        )
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Number of user records for a phone number (more than one only after a
    /// first-contact race).
    pub async fn count_users(&self, phone_number: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE phone_number = ?")
            .bind(phone_number)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_user(&self, phone_number: &str, display_name: &str) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let display_name = if display_name.is_empty() {
            DEFAULT_DISPLAY_NAME
        } else {
            display_name
        };
        sqlx::query(
            "INSERT INTO users (id, phone_number, display_name, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(phone_number)
        .bind(display_name)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn resolve_or_create_user(
        &self,
        phone_number: &str,
        display_name: &str,
    ) -> Result<String> {
        if let Some(user) = self.find_user(phone_number).await? {
            return Ok(user.id);
        }
        let id = self.insert_user(phone_number, display_name).await?;
        debug!(phone_number, user_id = %id, "created user");
        Ok(id)
    }

    async fn append_message(
        &self,
        user_id: &str,
        phone_number: &str,
        content: &str,
        role: Role,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO messages (user_id, phone_number, content, role, timestamp)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(phone_number)
        .bind(content)
        .bind(role.as_str())
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent_messages(&self, phone_number: &str, limit: u32) -> Result<Vec<HistoryTurn>> {
        // Newest first so LIMIT keeps the latest rows; id breaks same-ms ties.
        let rows = sqlx::query_as::<_, (Option<String>, Option<String>)>(
            "SELECT role, content
             FROM messages
             WHERE phone_number = ?
               AND role IN ('user', 'assistant', 'incoming')
             ORDER BY timestamp DESC, id DESC
             LIMIT ?",
        )
        .bind(phone_number)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut turns: Vec<HistoryTurn> = rows
            .into_iter()
            .filter_map(|(role, content)| {
                let role = match role.as_deref().map(str::parse::<Role>) {
                    Some(Ok(role)) => role,
                    Some(Err(e)) => {
                        warn!(phone_number, error = %e, "skipping message with unknown role");
                        return None;
                    },
                    None => {
                        warn!(phone_number, "skipping message with missing role");
                        return None;
                    },
                };
                Some(HistoryTurn::new(role, content.unwrap_or_default()))
            })
            .collect();
        turns.reverse();
        Ok(turns)
    }
}
