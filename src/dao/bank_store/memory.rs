//! In-process storage backend. Used for ephemeral deployments
//! (`STORE_BACKEND=memory`) and as the test substrate for the service layer.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use uuid::Uuid;

use crate::dao::{
    bank_store::{DefaultToggle, PlayHistoryStore, QuestionStore},
    models::{QuestionEntity, QuestionPatch, ThemeEntity, ThemePatch},
    storage::{StorageError, StorageResult},
};

/// Storage backend keeping the whole bank in process memory.
#[derive(Clone, Default)]
pub struct MemoryBankStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    bank: RwLock<Bank>,
    plays: DashMap<Uuid, HashSet<Uuid>>,
}

/// Questions and themes live under a single lock so that the text-uniqueness
/// check-and-insert and the default-count check-and-set are atomic.
#[derive(Default)]
struct Bank {
    questions: IndexMap<Uuid, QuestionEntity>,
    text_index: HashMap<String, Uuid>,
    themes: IndexMap<Uuid, ThemeEntity>,
}

impl MemoryBankStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn bank(&self) -> std::sync::RwLockReadGuard<'_, Bank> {
        self.inner.bank.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn bank_mut(&self) -> std::sync::RwLockWriteGuard<'_, Bank> {
        self.inner.bank.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Bank {
    fn insert_question(&mut self, question: QuestionEntity) -> StorageResult<()> {
        if self.text_index.contains_key(&question.text) {
            return Err(StorageError::duplicate_text(question.text));
        }
        self.text_index.insert(question.text.clone(), question.id);
        self.questions.insert(question.id, question);
        Ok(())
    }

    fn update_question(
        &mut self,
        id: Uuid,
        patch: QuestionPatch,
    ) -> StorageResult<Option<QuestionEntity>> {
        let Some(current) = self.questions.get(&id) else {
            return Ok(None);
        };

        // A text change must keep the uniqueness invariant, like the unique
        // index does on the MongoDB backend.
        if let Some(new_text) = patch.text.as_deref() {
            match self.text_index.get(new_text) {
                Some(owner) if *owner != id => {
                    return Err(StorageError::duplicate_text(new_text));
                }
                _ => {}
            }
        }

        let old_text = current.text.clone();
        let question = self.questions.get_mut(&id).expect("entry checked above");
        question.apply(patch);
        if question.text != old_text {
            self.text_index.remove(&old_text);
            self.text_index.insert(question.text.clone(), id);
        }
        Ok(Some(question.clone()))
    }

    fn set_theme_default(
        &mut self,
        id: Uuid,
        want_default: bool,
        cap: usize,
    ) -> StorageResult<DefaultToggle> {
        if !self.themes.contains_key(&id) {
            return Ok(DefaultToggle::NotFound);
        }

        let count = self.themes.values().filter(|theme| theme.is_default).count();
        let theme = self.themes.get_mut(&id).expect("entry checked above");

        if !want_default {
            let count = if theme.is_default { count - 1 } else { count };
            theme.is_default = false;
            return Ok(DefaultToggle::Applied { count });
        }

        if theme.is_default {
            return Ok(DefaultToggle::Applied { count });
        }
        if count >= cap {
            return Ok(DefaultToggle::CapReached { count });
        }
        theme.is_default = true;
        Ok(DefaultToggle::Applied { count: count + 1 })
    }
}

impl QuestionStore for MemoryBankStore {
    fn find_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.bank().questions.get(&id).cloned()) })
    }

    fn find_by_theme(
        &self,
        theme_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .bank()
                .questions
                .values()
                .filter(|question| question.theme_id == theme_id)
                .cloned()
                .collect())
        })
    }

    fn find_by_text(
        &self,
        text: String,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let bank = store.bank();
            Ok(bank
                .text_index
                .get(&text)
                .and_then(|id| bank.questions.get(id))
                .cloned())
        })
    }

    fn list_questions(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.bank().questions.values().cloned().collect()) })
    }

    fn insert_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.bank_mut().insert_question(question) })
    }

    fn update_question(
        &self,
        id: Uuid,
        patch: QuestionPatch,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.bank_mut().update_question(id, patch) })
    }

    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut bank = store.bank_mut();
            match bank.questions.shift_remove(&id) {
                Some(question) => {
                    bank.text_index.remove(&question.text);
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn list_themes(&self) -> BoxFuture<'static, StorageResult<Vec<ThemeEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.bank().themes.values().cloned().collect()) })
    }

    fn get_theme(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ThemeEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.bank().themes.get(&id).cloned()) })
    }

    fn insert_theme(&self, theme: ThemeEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.bank_mut().themes.insert(theme.id, theme);
            Ok(())
        })
    }

    fn update_theme(
        &self,
        id: Uuid,
        patch: ThemePatch,
    ) -> BoxFuture<'static, StorageResult<Option<ThemeEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut bank = store.bank_mut();
            let Some(theme) = bank.themes.get_mut(&id) else {
                return Ok(None);
            };
            theme.apply(patch);
            Ok(Some(theme.clone()))
        })
    }

    fn delete_theme(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.bank_mut().themes.shift_remove(&id).is_some()) })
    }

    fn set_theme_default(
        &self,
        id: Uuid,
        want_default: bool,
        cap: usize,
    ) -> BoxFuture<'static, StorageResult<DefaultToggle>> {
        let store = self.clone();
        Box::pin(async move { store.bank_mut().set_theme_default(id, want_default, cap) })
    }

    fn count_default_themes(&self) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store.bank().themes.values().filter(|theme| theme.is_default).count())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move { Ok(()) })
    }
}

impl PlayHistoryStore for MemoryBankStore {
    fn played_set(&self, player_id: Uuid) -> BoxFuture<'static, StorageResult<HashSet<Uuid>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .plays
                .get(&player_id)
                .map(|entry| entry.clone())
                .unwrap_or_default())
        })
    }

    fn record_played(
        &self,
        player_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.plays.entry(player_id).or_default().insert(question_id);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    fn question(theme_id: Uuid, text: &str) -> QuestionEntity {
        QuestionEntity {
            id: Uuid::new_v4(),
            theme_id,
            text: text.to_owned(),
            answers: [
                "a".to_owned(),
                "b".to_owned(),
                "c".to_owned(),
                "d".to_owned(),
            ],
            image: None,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    fn theme(name: &str) -> ThemeEntity {
        ThemeEntity {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            description: String::new(),
            is_public: true,
            is_default: false,
            company_name: None,
            company_sub_name: None,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_text() {
        let store = MemoryBankStore::new();
        let theme_id = Uuid::new_v4();

        store.insert_question(question(theme_id, "capital of France?")).await.unwrap();
        let err = store
            .insert_question(question(theme_id, "capital of France?"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::DuplicateText { .. }));
    }

    #[tokio::test]
    async fn update_rejects_text_collision_with_other_question() {
        let store = MemoryBankStore::new();
        let theme_id = Uuid::new_v4();

        store.insert_question(question(theme_id, "first")).await.unwrap();
        let second = question(theme_id, "second");
        let second_id = second.id;
        store.insert_question(second).await.unwrap();

        let patch = QuestionPatch {
            text: Some("first".to_owned()),
            ..Default::default()
        };
        let err = store.update_question(second_id, patch).await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateText { .. }));

        // Re-writing a question's own text is not a collision.
        let patch = QuestionPatch {
            text: Some("second".to_owned()),
            ..Default::default()
        };
        assert!(store.update_question(second_id, patch).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn default_toggle_enforces_cap_under_concurrency() {
        let store = MemoryBankStore::new();
        let mut theme_ids = Vec::new();
        for index in 0..15 {
            let theme = theme(&format!("theme {index}"));
            theme_ids.push(theme.id);
            store.insert_theme(theme).await.unwrap();
        }

        let mut handles = Vec::new();
        for id in theme_ids {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.set_theme_default(id, true, 10).await
            }));
        }

        let mut applied = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                DefaultToggle::Applied { .. } => applied += 1,
                DefaultToggle::CapReached { .. } => rejected += 1,
                DefaultToggle::NotFound => panic!("theme disappeared"),
            }
        }

        assert_eq!(applied, 10);
        assert_eq!(rejected, 5);
        assert_eq!(store.count_default_themes().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn unsetting_default_is_always_permitted() {
        let store = MemoryBankStore::new();
        let theme = theme("quiz");
        let id = theme.id;
        store.insert_theme(theme).await.unwrap();

        store.set_theme_default(id, true, 10).await.unwrap();
        let toggle = store.set_theme_default(id, false, 0).await.unwrap();
        assert_eq!(toggle, DefaultToggle::Applied { count: 0 });
    }

    #[tokio::test]
    async fn play_records_are_idempotent() {
        let store = MemoryBankStore::new();
        let player = Uuid::new_v4();
        let question_id = Uuid::new_v4();

        store.record_played(player, question_id).await.unwrap();
        store.record_played(player, question_id).await.unwrap();

        let played = store.played_set(player).await.unwrap();
        assert_eq!(played.len(), 1);
        assert!(played.contains(&question_id));
    }
}
