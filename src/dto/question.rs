//! DTO definitions for question CRUD and the "not played by" selection endpoint.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{QuestionEntity, QuestionPatch},
    dto::validation::validate_required_text,
};

/// Payload used to create a single question.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct QuestionInput {
    /// Theme the question belongs to.
    pub theme: Uuid,
    #[validate(custom(function = validate_required_text))]
    pub text: String,
    #[validate(custom(function = validate_required_text))]
    pub answer1: String,
    #[validate(custom(function = validate_required_text))]
    pub answer2: String,
    #[validate(custom(function = validate_required_text))]
    pub answer3: String,
    #[validate(custom(function = validate_required_text))]
    pub answer4: String,
    /// Optional illustration reference. Omitted rather than sent as null.
    #[serde(default)]
    pub image: Option<String>,
}

impl QuestionInput {
    /// Promote the validated payload to a fresh entity.
    pub fn into_entity(self) -> QuestionEntity {
        let now = SystemTime::now();
        QuestionEntity {
            id: Uuid::new_v4(),
            theme_id: self.theme,
            text: self.text.trim().to_owned(),
            answers: [self.answer1, self.answer2, self.answer3, self.answer4],
            image: self.image,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for an existing question. Absent fields are left untouched.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuestionRequest {
    #[serde(default)]
    pub theme: Option<Uuid>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub answer1: Option<String>,
    #[serde(default)]
    pub answer2: Option<String>,
    #[serde(default)]
    pub answer3: Option<String>,
    #[serde(default)]
    pub answer4: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl Validate for UpdateQuestionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for (field, value) in [
            ("text", &self.text),
            ("answer1", &self.answer1),
            ("answer2", &self.answer2),
            ("answer3", &self.answer3),
            ("answer4", &self.answer4),
        ] {
            if let Some(value) = value {
                if let Err(e) = validate_required_text(value) {
                    errors.add(field, e);
                }
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl UpdateQuestionRequest {
    /// Convert the request into a storage-level patch.
    ///
    /// The four answers travel together: a partial answer update would leave
    /// the choices out of step with each other, so all four are required as
    /// soon as one is present.
    pub fn into_patch(self) -> Result<QuestionPatch, ValidationErrors> {
        let answers = match (self.answer1, self.answer2, self.answer3, self.answer4) {
            (None, None, None, None) => None,
            (Some(a1), Some(a2), Some(a3), Some(a4)) => Some([a1, a2, a3, a4]),
            _ => {
                let mut errors = ValidationErrors::new();
                let mut err = validator::ValidationError::new("answer_set");
                err.message = Some("all four answers must be supplied together".into());
                errors.add("answer1", err);
                return Err(errors);
            }
        };

        Ok(QuestionPatch {
            theme_id: self.theme,
            text: self.text.map(|text| text.trim().to_owned()),
            answers,
            image: self.image,
        })
    }
}

/// Public projection of a question exposed to REST clients.
///
/// Answers are listed without any marking of which one is correct.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionSummary {
    pub id: Uuid,
    /// Theme the question belongs to.
    pub theme: Uuid,
    pub text: String,
    pub answer1: String,
    pub answer2: String,
    pub answer3: String,
    pub answer4: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<QuestionEntity> for QuestionSummary {
    fn from(entity: QuestionEntity) -> Self {
        let [answer1, answer2, answer3, answer4] = entity.answers;
        Self {
            id: entity.id,
            theme: entity.theme_id,
            text: entity.text,
            answer1,
            answer2,
            answer3,
            answer4,
            image: entity.image,
        }
    }
}

/// Query parameters accepted by the question listing endpoint.
///
/// `theme` scopes the listing; adding `npb` ("not played by") switches to the
/// unplayed-question selection, for which `limit` is required.
#[derive(Debug, Deserialize, IntoParams)]
pub struct QuestionListParams {
    /// Theme to scope the listing to.
    pub theme: Option<Uuid>,
    /// Player whose play history should be excluded.
    pub npb: Option<Uuid>,
    /// Maximum number of questions to return. Required with `npb`.
    pub limit: Option<usize>,
}
