use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Quiz question persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Stable identifier for the question.
    pub id: Uuid,
    /// Theme this question belongs to.
    pub theme_id: Uuid,
    /// Question wording. Unique across the whole question set.
    pub text: String,
    /// The four answer choices shown to players.
    pub answers: [String; 4],
    /// Optional reference to an illustration asset.
    pub image: Option<String>,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the question was updated.
    pub updated_at: SystemTime,
}

/// Partial update applied to a stored question. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct QuestionPatch {
    /// New owning theme.
    pub theme_id: Option<Uuid>,
    /// New question wording.
    pub text: Option<String>,
    /// Replacement answer set.
    pub answers: Option<[String; 4]>,
    /// Replacement image reference.
    pub image: Option<String>,
}

/// Theme grouping a set of questions, persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThemeEntity {
    /// Stable identifier for the theme.
    pub id: Uuid,
    /// Display name of the theme.
    pub name: String,
    /// Longer description shown in the backoffice.
    pub description: String,
    /// Whether the theme is visible to every company.
    pub is_public: bool,
    /// Whether the theme is offered as a default suggestion. Capped globally.
    pub is_default: bool,
    /// Owning company for private themes.
    pub company_name: Option<String>,
    /// Owning sub-entity for private themes.
    pub company_sub_name: Option<String>,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the theme was updated.
    pub updated_at: SystemTime,
}

/// Partial update applied to a stored theme. `None` fields are left untouched.
///
/// The `is_default` flag is deliberately absent: it only changes through
/// [`crate::dao::bank_store::QuestionStore::set_theme_default`].
#[derive(Debug, Clone, Default)]
pub struct ThemePatch {
    /// New display name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New visibility flag.
    pub is_public: Option<bool>,
    /// New owning company.
    pub company_name: Option<String>,
    /// New owning sub-entity.
    pub company_sub_name: Option<String>,
}

/// Record that a question has been served to a player. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayRecordEntity {
    /// Player the question was served to.
    pub player_id: Uuid,
    /// Question that was served.
    pub question_id: Uuid,
    /// When the question was served.
    pub played_at: SystemTime,
}

impl QuestionEntity {
    /// Apply a partial update, refreshing the `updated_at` timestamp.
    pub fn apply(&mut self, patch: QuestionPatch) {
        if let Some(theme_id) = patch.theme_id {
            self.theme_id = theme_id;
        }
        if let Some(text) = patch.text {
            self.text = text;
        }
        if let Some(answers) = patch.answers {
            self.answers = answers;
        }
        if let Some(image) = patch.image {
            self.image = Some(image);
        }
        self.updated_at = SystemTime::now();
    }
}

impl ThemeEntity {
    /// Apply a partial update, refreshing the `updated_at` timestamp.
    pub fn apply(&mut self, patch: ThemePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(is_public) = patch.is_public {
            self.is_public = is_public;
        }
        if let Some(company_name) = patch.company_name {
            self.company_name = Some(company_name);
        }
        if let Some(company_sub_name) = patch.company_sub_name {
            self.company_sub_name = Some(company_sub_name);
        }
        self.updated_at = SystemTime::now();
    }
}
