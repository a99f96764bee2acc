use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("question text already exists: `{text}`")]
    DuplicateText { text: String },
    #[error("failed to save question `{id}`")]
    SaveQuestion {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load question `{id}`")]
    LoadQuestion {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete question `{id}`")]
    DeleteQuestion {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list questions")]
    ListQuestions {
        #[source]
        source: MongoError,
    },
    #[error("failed to save theme `{id}`")]
    SaveTheme {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load theme `{id}`")]
    LoadTheme {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete theme `{id}`")]
    DeleteTheme {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list themes")]
    ListThemes {
        #[source]
        source: MongoError,
    },
    #[error("failed to toggle default flag on theme `{id}`")]
    ToggleDefault {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to record play for player `{player_id}`")]
    SavePlay {
        player_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load play history for player `{player_id}`")]
    LoadPlays {
        player_id: Uuid,
        #[source]
        source: MongoError,
    },
}
