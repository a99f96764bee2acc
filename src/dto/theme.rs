//! DTO definitions for theme management, including the default-flag toggle.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::{ThemeEntity, ThemePatch},
    dto::{format_system_time, validation::validate_required_text},
};

/// Payload used to create a theme.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ThemeInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Public themes are visible to every company.
    pub is_public: bool,
    /// Owning company, required for private themes.
    #[serde(default)]
    pub company_name: Option<String>,
    /// Owning sub-entity, optional even for private themes.
    #[serde(default)]
    pub company_sub_name: Option<String>,
}

impl Validate for ThemeInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_required_text(&self.name) {
            errors.add("name", e);
        }

        // Private themes must name their owning company.
        if !self.is_public
            && self
                .company_name
                .as_deref()
                .is_none_or(|name| name.trim().is_empty())
        {
            let mut err = ValidationError::new("company_required");
            err.message = Some("private themes require a company name".into());
            errors.add("company_name", err);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl ThemeInput {
    /// Promote the validated payload to a fresh entity. New themes are never default.
    pub fn into_entity(self) -> ThemeEntity {
        let now = SystemTime::now();
        ThemeEntity {
            id: Uuid::new_v4(),
            name: self.name.trim().to_owned(),
            description: self.description,
            is_public: self.is_public,
            is_default: false,
            company_name: self.company_name,
            company_sub_name: self.company_sub_name,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for an existing theme. Absent fields are left untouched.
///
/// The default flag is not part of this request; it changes only through the
/// dedicated toggle endpoint so the global cap can be enforced.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateThemeRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub company_sub_name: Option<String>,
}

impl Validate for UpdateThemeRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(ref name) = self.name {
            if let Err(e) = validate_required_text(name) {
                errors.add("name", e);
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl UpdateThemeRequest {
    /// Convert the request into a storage-level patch.
    pub fn into_patch(self) -> ThemePatch {
        ThemePatch {
            name: self.name.map(|name| name.trim().to_owned()),
            description: self.description,
            is_public: self.is_public,
            company_name: self.company_name,
            company_sub_name: self.company_sub_name,
        }
    }
}

/// Public projection of a theme exposed to REST clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct ThemeSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_public: bool,
    pub is_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_sub_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ThemeEntity> for ThemeSummary {
    fn from(entity: ThemeEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            is_public: entity.is_public,
            is_default: entity.is_default,
            company_name: entity.company_name,
            company_sub_name: entity.company_sub_name,
            created_at: format_system_time(entity.created_at),
            updated_at: format_system_time(entity.updated_at),
        }
    }
}

/// Request to flip a theme's default flag.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetDefaultRequest {
    /// Desired value of the flag.
    pub is_default: bool,
}

/// Result of a default-flag toggle, returning the new global count.
#[derive(Debug, Serialize, ToSchema)]
pub struct SetDefaultResponse {
    pub id: Uuid,
    pub is_default: bool,
    /// Number of default themes after the toggle.
    pub default_count: usize,
}
