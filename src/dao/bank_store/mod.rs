pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::collections::HashSet;

use crate::dao::models::{QuestionEntity, QuestionPatch, ThemeEntity, ThemePatch};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Outcome of the atomic default-flag toggle on a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultToggle {
    /// The flag was written; `count` is the number of default themes afterwards.
    Applied {
        /// Default-theme count after the write.
        count: usize,
    },
    /// The cap was already reached; nothing was written.
    CapReached {
        /// Default-theme count observed at rejection time.
        count: usize,
    },
    /// The theme does not exist.
    NotFound,
}

/// Abstraction over the persistence layer for questions and themes.
///
/// `insert_question` enforces the global text-uniqueness invariant at write
/// time and fails with [`crate::dao::storage::StorageError::DuplicateText`]
/// on collision. `set_theme_default` performs its count-check and flag-write
/// as one atomic operation.
pub trait QuestionStore: Send + Sync {
    fn find_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;
    fn find_by_theme(
        &self,
        theme_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;
    fn find_by_text(
        &self,
        text: String,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;
    fn list_questions(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;
    fn insert_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn update_question(
        &self,
        id: Uuid,
        patch: QuestionPatch,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;
    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    fn list_themes(&self) -> BoxFuture<'static, StorageResult<Vec<ThemeEntity>>>;
    fn get_theme(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ThemeEntity>>>;
    fn insert_theme(&self, theme: ThemeEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn update_theme(
        &self,
        id: Uuid,
        patch: ThemePatch,
    ) -> BoxFuture<'static, StorageResult<Option<ThemeEntity>>>;
    fn delete_theme(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    fn set_theme_default(
        &self,
        id: Uuid,
        want_default: bool,
        cap: usize,
    ) -> BoxFuture<'static, StorageResult<DefaultToggle>>;
    fn count_default_themes(&self) -> BoxFuture<'static, StorageResult<usize>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Abstraction over the record of which questions a player has been served.
pub trait PlayHistoryStore: Send + Sync {
    /// IDs of every question already served to the player.
    fn played_set(&self, player_id: Uuid) -> BoxFuture<'static, StorageResult<HashSet<Uuid>>>;
    /// Append a play record. Re-recording the same pair is a no-op.
    fn record_played(
        &self,
        player_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<()>>;
}
