use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{PlayRecordEntity, QuestionEntity, ThemeEntity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoQuestionDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    theme_id: Uuid,
    text: String,
    answers: [String; 4],
    image: Option<String>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<QuestionEntity> for MongoQuestionDocument {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            theme_id: value.theme_id,
            text: value.text,
            answers: value.answers,
            image: value.image,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoQuestionDocument> for QuestionEntity {
    fn from(value: MongoQuestionDocument) -> Self {
        Self {
            id: value.id,
            theme_id: value.theme_id,
            text: value.text,
            answers: value.answers,
            image: value.image,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThemeDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
    description: String,
    is_public: bool,
    #[serde(default)]
    is_default: bool,
    company_name: Option<String>,
    company_sub_name: Option<String>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<ThemeEntity> for MongoThemeDocument {
    fn from(value: ThemeEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            is_public: value.is_public,
            is_default: value.is_default,
            company_name: value.company_name,
            company_sub_name: value.company_sub_name,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoThemeDocument> for ThemeEntity {
    fn from(value: MongoThemeDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            is_public: value.is_public,
            is_default: value.is_default,
            company_name: value.company_name,
            company_sub_name: value.company_sub_name,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlayRecordDocument {
    pub player_id: Uuid,
    pub question_id: Uuid,
    played_at: DateTime,
}

impl From<PlayRecordEntity> for MongoPlayRecordDocument {
    fn from(value: PlayRecordEntity) -> Self {
        Self {
            player_id: value.player_id,
            question_id: value.question_id,
            played_at: DateTime::from_system_time(value.played_at),
        }
    }
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
