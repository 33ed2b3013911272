mod error;
mod memory;
pub mod model;
mod turso;

pub use error::StorageError;
pub use memory::MemoryCache;
pub use turso::TursoStore;

use async_trait::async_trait;

use model::{FaqEntry, FaqField, ModeratorStat, NewQuestion, Question, QuestionStats, Recipient, Role, UserRecord};

/// Keyed access to the role directory, the question queue and the FAQ corpus.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    // roles and users
    async fn find_role(&self, name: &str) -> Result<Option<Role>, StorageError>;
    async fn list_roles(&self) -> Result<Vec<Role>, StorageError>;
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, StorageError>;
    async fn upsert_user_role(&self, username: &str, role: &str) -> Result<(), StorageError>;
    async fn delete_user(&self, username: &str) -> Result<bool, StorageError>;
    /// Records the chat address only when none is stored yet.
    async fn set_user_chat(&self, username: &str, chat_id: i64) -> Result<(), StorageError>;
    async fn set_user_language(&self, username: &str, language: &str) -> Result<(), StorageError>;
    async fn save_user_context(&self, username: &str, context: &str) -> Result<(), StorageError>;
    /// `(username, role)` pairs, highest role level first.
    async fn list_users(&self) -> Result<Vec<(String, String)>, StorageError>;
    async fn broadcast_recipients(&self) -> Result<Vec<Recipient>, StorageError>;

    // questions
    async fn insert_question(&self, question: &NewQuestion) -> Result<i64, StorageError>;
    /// Reserves the oldest question that is unprocessed or whose reservation lease has lapsed.
    async fn reserve_next_question(
        &self,
        moderator: &str,
        now: i64,
        lease_secs: i64,
        excluded: &[i64],
    ) -> Result<Option<Question>, StorageError>;
    async fn release_question(&self, id: i64, moderator: &str) -> Result<(), StorageError>;
    async fn find_reserved_question(&self, id: i64, moderator: &str) -> Result<Option<Question>, StorageError>;
    async fn mark_answered(&self, id: i64, moderator: &str, now: i64) -> Result<bool, StorageError>;
    async fn reset_reservations(&self) -> Result<u64, StorageError>;
    async fn question_stats(&self, now: i64, lease_secs: i64) -> Result<QuestionStats, StorageError>;
    async fn count_questions(&self) -> Result<i64, StorageError>;
    /// Question texts, most recent first.
    async fn recent_questions(&self, limit: i64) -> Result<Vec<String>, StorageError>;
    async fn clear_questions(&self) -> Result<(), StorageError>;
    async fn moderator_stats(&self) -> Result<Vec<ModeratorStat>, StorageError>;

    // faq
    async fn insert_faq(&self, question: &str, answer: &str) -> Result<i64, StorageError>;
    async fn count_faq(&self) -> Result<i64, StorageError>;
    async fn faq_page(&self, page: i64, page_size: i64) -> Result<Vec<FaqEntry>, StorageError>;
    async fn find_faq(&self, id: i64) -> Result<Option<FaqEntry>, StorageError>;
    /// Increments the view counter and returns the updated entry in one statement.
    async fn view_faq(&self, id: i64) -> Result<Option<FaqEntry>, StorageError>;
    async fn update_faq(&self, id: i64, field: FaqField, value: &str) -> Result<bool, StorageError>;
    async fn delete_faq(&self, id: i64) -> Result<bool, StorageError>;
    async fn clear_faq(&self) -> Result<(), StorageError>;
}
