use {
    async_trait::async_trait,
    parley_common::{HistoryTurn, Role},
};

use crate::Result;

/// Number of turns returned by a history read when the caller has no
/// preference.
pub const DEFAULT_HISTORY_LIMIT: u32 = 5;

/// Stored when a user is created without a display name.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// A WhatsApp sender, created lazily on first contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub phone_number: String,
    pub display_name: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

/// Persistence contract for users and their message history.
///
/// Implementations must be safe to share across concurrent webhook requests.
/// No per-user serialization is provided: two events for the same number may
/// interleave their writes.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Return the id of the user with this phone number, creating one if none
    /// exists. An empty `display_name` is stored as [`DEFAULT_DISPLAY_NAME`].
    ///
    /// The lookup and insert are not atomic. Two first-contact events racing
    /// for the same number can both insert; later calls then resolve to the
    /// oldest record.
    async fn resolve_or_create_user(&self, phone_number: &str, display_name: &str)
    -> Result<String>;

    /// Append one immutable message stamped with the current time.
    async fn append_message(
        &self,
        user_id: &str,
        phone_number: &str,
        content: &str,
        role: Role,
    ) -> Result<()>;

    /// The latest `limit` messages for a number, oldest first.
    async fn recent_messages(&self, phone_number: &str, limit: u32) -> Result<Vec<HistoryTurn>>;
}
