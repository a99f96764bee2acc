use std::{collections::HashSet, sync::Arc};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{DateTime, doc},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoPlayRecordDocument, MongoQuestionDocument, MongoThemeDocument, doc_id, uuid_as_binary,
    },
};
use crate::dao::{
    bank_store::{DefaultToggle, PlayHistoryStore, QuestionStore},
    models::{PlayRecordEntity, QuestionEntity, QuestionPatch, ThemeEntity, ThemePatch},
    storage::StorageResult,
};

const QUESTION_COLLECTION_NAME: &str = "questions";
const THEME_COLLECTION_NAME: &str = "themes";
const PLAY_COLLECTION_NAME: &str = "play_records";

#[derive(Clone)]
pub struct MongoBankStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
    /// Serializes the count-check and flag-write of the default-theme toggle.
    default_gate: Mutex<()>,
}

struct MongoState {
    client: Client,
    database: Database,
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref write)) if write.code == 11000
    )
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoBankStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
            default_gate: Mutex::new(()),
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        // The unique text index is what upholds the question-text invariant
        // under concurrent imports and single-question creation.
        let questions = database.collection::<MongoQuestionDocument>(QUESTION_COLLECTION_NAME);
        let text_index = mongodb::IndexModel::builder()
            .keys(doc! {"text": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("question_text_unique".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        questions
            .create_index(text_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: QUESTION_COLLECTION_NAME,
                index: "text",
                source,
            })?;

        let theme_index = mongodb::IndexModel::builder()
            .keys(doc! {"theme_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("question_theme_idx".to_owned()))
                    .build(),
            )
            .build();
        questions
            .create_index(theme_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: QUESTION_COLLECTION_NAME,
                index: "theme_id",
                source,
            })?;

        let plays = database.collection::<MongoPlayRecordDocument>(PLAY_COLLECTION_NAME);
        let play_index = mongodb::IndexModel::builder()
            .keys(doc! {"player_id": 1, "question_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("play_player_question_unique".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        plays
            .create_index(play_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: PLAY_COLLECTION_NAME,
                index: "player_id,question_id",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn question_collection(&self) -> Collection<MongoQuestionDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoQuestionDocument>(QUESTION_COLLECTION_NAME)
    }

    async fn theme_collection(&self) -> Collection<MongoThemeDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoThemeDocument>(THEME_COLLECTION_NAME)
    }

    async fn play_collection(&self) -> Collection<MongoPlayRecordDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoPlayRecordDocument>(PLAY_COLLECTION_NAME)
    }

    async fn find_question(&self, id: Uuid) -> MongoResult<Option<QuestionEntity>> {
        let collection = self.question_collection().await;
        let document = collection
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadQuestion { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn find_by_theme(&self, theme_id: Uuid) -> MongoResult<Vec<QuestionEntity>> {
        let collection = self.question_collection().await;
        let documents: Vec<MongoQuestionDocument> = collection
            .find(doc! {"theme_id": uuid_as_binary(theme_id)})
            .await
            .map_err(|source| MongoDaoError::ListQuestions { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListQuestions { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_by_text(&self, text: &str) -> MongoResult<Option<QuestionEntity>> {
        let collection = self.question_collection().await;
        let document = collection
            .find_one(doc! {"text": text})
            .await
            .map_err(|source| MongoDaoError::ListQuestions { source })?;
        Ok(document.map(Into::into))
    }

    async fn list_questions(&self) -> MongoResult<Vec<QuestionEntity>> {
        let collection = self.question_collection().await;
        let documents: Vec<MongoQuestionDocument> = collection
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::ListQuestions { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListQuestions { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn insert_question(&self, question: QuestionEntity) -> MongoResult<()> {
        let id = question.id;
        let text = question.text.clone();
        let document: MongoQuestionDocument = question.into();
        let collection = self.question_collection().await;
        collection.insert_one(&document).await.map_err(|source| {
            if is_duplicate_key(&source) {
                MongoDaoError::DuplicateText { text }
            } else {
                MongoDaoError::SaveQuestion { id, source }
            }
        })?;
        Ok(())
    }

    async fn update_question(
        &self,
        id: Uuid,
        patch: QuestionPatch,
    ) -> MongoResult<Option<QuestionEntity>> {
        let Some(mut question) = self.find_question(id).await? else {
            return Ok(None);
        };
        question.apply(patch);

        let text = question.text.clone();
        let document: MongoQuestionDocument = question.clone().into();
        let collection = self.question_collection().await;
        collection
            .replace_one(doc_id(id), &document)
            .await
            .map_err(|source| {
                if is_duplicate_key(&source) {
                    MongoDaoError::DuplicateText { text }
                } else {
                    MongoDaoError::SaveQuestion { id, source }
                }
            })?;
        Ok(Some(question))
    }

    async fn delete_question(&self, id: Uuid) -> MongoResult<bool> {
        let collection = self.question_collection().await;
        let result = collection
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteQuestion { id, source })?;
        Ok(result.deleted_count > 0)
    }

    async fn list_themes(&self) -> MongoResult<Vec<ThemeEntity>> {
        let collection = self.theme_collection().await;
        let documents: Vec<MongoThemeDocument> = collection
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::ListThemes { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListThemes { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn get_theme(&self, id: Uuid) -> MongoResult<Option<ThemeEntity>> {
        let collection = self.theme_collection().await;
        let document = collection
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadTheme { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn insert_theme(&self, theme: ThemeEntity) -> MongoResult<()> {
        let id = theme.id;
        let document: MongoThemeDocument = theme.into();
        let collection = self.theme_collection().await;
        collection
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveTheme { id, source })?;
        Ok(())
    }

    async fn update_theme(&self, id: Uuid, patch: ThemePatch) -> MongoResult<Option<ThemeEntity>> {
        let Some(mut theme) = self.get_theme(id).await? else {
            return Ok(None);
        };
        theme.apply(patch);

        let document: MongoThemeDocument = theme.clone().into();
        let collection = self.theme_collection().await;
        collection
            .replace_one(doc_id(id), &document)
            .await
            .map_err(|source| MongoDaoError::SaveTheme { id, source })?;
        Ok(Some(theme))
    }

    async fn delete_theme(&self, id: Uuid) -> MongoResult<bool> {
        let collection = self.theme_collection().await;
        let result = collection
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteTheme { id, source })?;
        Ok(result.deleted_count > 0)
    }

    async fn count_default_themes(&self) -> MongoResult<usize> {
        let collection = self.theme_collection().await;
        let count = collection
            .count_documents(doc! {"is_default": true})
            .await
            .map_err(|source| MongoDaoError::ListThemes { source })?;
        Ok(count as usize)
    }

    async fn set_theme_default(
        &self,
        id: Uuid,
        want_default: bool,
        cap: usize,
    ) -> MongoResult<DefaultToggle> {
        // Hold the gate across the count and the write so concurrent toggles
        // cannot both observe a below-cap count and overshoot.
        let _gate = self.inner.default_gate.lock().await;

        let Some(theme) = self.get_theme(id).await? else {
            return Ok(DefaultToggle::NotFound);
        };
        let count = self.count_default_themes().await?;

        if !want_default {
            self.write_default_flag(id, false).await?;
            let count = if theme.is_default { count - 1 } else { count };
            return Ok(DefaultToggle::Applied { count });
        }

        if theme.is_default {
            return Ok(DefaultToggle::Applied { count });
        }
        if count >= cap {
            return Ok(DefaultToggle::CapReached { count });
        }

        self.write_default_flag(id, true).await?;
        Ok(DefaultToggle::Applied { count: count + 1 })
    }

    async fn write_default_flag(&self, id: Uuid, value: bool) -> MongoResult<()> {
        let collection = self.theme_collection().await;
        collection
            .update_one(
                doc_id(id),
                doc! {"$set": {"is_default": value, "updated_at": DateTime::now()}},
            )
            .await
            .map_err(|source| MongoDaoError::ToggleDefault { id, source })?;
        Ok(())
    }

    async fn played_set(&self, player_id: Uuid) -> MongoResult<HashSet<Uuid>> {
        let collection = self.play_collection().await;
        let documents: Vec<MongoPlayRecordDocument> = collection
            .find(doc! {"player_id": uuid_as_binary(player_id)})
            .await
            .map_err(|source| MongoDaoError::LoadPlays { player_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadPlays { player_id, source })?;
        Ok(documents.into_iter().map(|record| record.question_id).collect())
    }

    async fn record_played(&self, record: PlayRecordEntity) -> MongoResult<()> {
        let player_id = record.player_id;
        let document: MongoPlayRecordDocument = record.into();
        let collection = self.play_collection().await;
        match collection.insert_one(&document).await {
            Ok(_) => Ok(()),
            // The unique (player_id, question_id) index makes re-recording a no-op.
            Err(source) if is_duplicate_key(&source) => Ok(()),
            Err(source) => Err(MongoDaoError::SavePlay { player_id, source }),
        }
    }
}

impl QuestionStore for MongoBankStore {
    fn find_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_question(id).await.map_err(Into::into) })
    }

    fn find_by_theme(
        &self,
        theme_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_by_theme(theme_id).await.map_err(Into::into) })
    }

    fn find_by_text(
        &self,
        text: String,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_by_text(&text).await.map_err(Into::into) })
    }

    fn list_questions(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_questions().await.map_err(Into::into) })
    }

    fn insert_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_question(question).await.map_err(Into::into) })
    }

    fn update_question(
        &self,
        id: Uuid,
        patch: QuestionPatch,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.update_question(id, patch).await.map_err(Into::into) })
    }

    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_question(id).await.map_err(Into::into) })
    }

    fn list_themes(&self) -> BoxFuture<'static, StorageResult<Vec<ThemeEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_themes().await.map_err(Into::into) })
    }

    fn get_theme(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ThemeEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.get_theme(id).await.map_err(Into::into) })
    }

    fn insert_theme(&self, theme: ThemeEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_theme(theme).await.map_err(Into::into) })
    }

    fn update_theme(
        &self,
        id: Uuid,
        patch: ThemePatch,
    ) -> BoxFuture<'static, StorageResult<Option<ThemeEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.update_theme(id, patch).await.map_err(Into::into) })
    }

    fn delete_theme(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_theme(id).await.map_err(Into::into) })
    }

    fn set_theme_default(
        &self,
        id: Uuid,
        want_default: bool,
        cap: usize,
    ) -> BoxFuture<'static, StorageResult<DefaultToggle>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .set_theme_default(id, want_default, cap)
                .await
                .map_err(Into::into)
        })
    }

    fn count_default_themes(&self) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move { store.count_default_themes().await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

impl PlayHistoryStore for MongoBankStore {
    fn played_set(&self, player_id: Uuid) -> BoxFuture<'static, StorageResult<HashSet<Uuid>>> {
        let store = self.clone();
        Box::pin(async move { store.played_set(player_id).await.map_err(Into::into) })
    }

    fn record_played(
        &self,
        player_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let record = PlayRecordEntity {
                player_id,
                question_id,
                played_at: std::time::SystemTime::now(),
            };
            store.record_played(record).await.map_err(Into::into)
        })
    }
}
