//! Business logic powering the theme routes, including the guarded
//! default-flag toggle.

use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::bank_store::DefaultToggle,
    dto::theme::{SetDefaultResponse, ThemeInput, ThemeSummary, UpdateThemeRequest},
    error::ServiceError,
    state::SharedState,
};

/// Global cap on the number of themes flagged as default suggestions.
pub const MAX_DEFAULT_THEMES: usize = 10;

/// Return every theme known to the bank.
pub async fn list_themes(state: &SharedState) -> Result<Vec<ThemeSummary>, ServiceError> {
    let store = state.require_question_store().await?;
    let themes = state.bounded(store.list_themes()).await?;
    Ok(themes.into_iter().map(Into::into).collect())
}

/// Return a single theme by its identifier.
pub async fn get_theme(state: &SharedState, id: Uuid) -> Result<ThemeSummary, ServiceError> {
    let store = state.require_question_store().await?;
    let theme = state
        .bounded(store.get_theme(id))
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("theme `{id}` not found")))?;
    Ok(theme.into())
}

/// Create a theme. New themes never start as default suggestions.
pub async fn create_theme(
    state: &SharedState,
    input: ThemeInput,
) -> Result<ThemeSummary, ServiceError> {
    input.validate()?;

    let store = state.require_question_store().await?;
    let entity = input.into_entity();
    let summary: ThemeSummary = entity.clone().into();
    state.bounded(store.insert_theme(entity)).await?;
    Ok(summary)
}

/// Apply a partial update to an existing theme.
pub async fn update_theme(
    state: &SharedState,
    id: Uuid,
    request: UpdateThemeRequest,
) -> Result<ThemeSummary, ServiceError> {
    request.validate()?;

    let store = state.require_question_store().await?;
    let updated = state
        .bounded(store.update_theme(id, request.into_patch()))
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("theme `{id}` not found")))?;
    Ok(updated.into())
}

/// Delete a theme by its identifier.
pub async fn delete_theme(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_question_store().await?;
    if !state.bounded(store.delete_theme(id)).await? {
        return Err(ServiceError::NotFound(format!("theme `{id}` not found")));
    }
    Ok(())
}

/// Flip a theme's default flag, holding the global cap.
///
/// The count-check and the flag-write happen as one atomic store operation, so
/// concurrent callers cannot push the count past [`MAX_DEFAULT_THEMES`]. A
/// rejected toggle leaves the flag untouched and reports the observed count.
pub async fn set_default(
    state: &SharedState,
    id: Uuid,
    want_default: bool,
) -> Result<SetDefaultResponse, ServiceError> {
    let store = state.require_question_store().await?;
    let toggle = state
        .bounded(store.set_theme_default(id, want_default, MAX_DEFAULT_THEMES))
        .await?;

    match toggle {
        DefaultToggle::Applied { count } => Ok(SetDefaultResponse {
            id,
            is_default: want_default,
            default_count: count,
        }),
        DefaultToggle::CapReached { count } => Err(ServiceError::LimitExceeded {
            count,
            max: MAX_DEFAULT_THEMES,
        }),
        DefaultToggle::NotFound => Err(ServiceError::NotFound(format!("theme `{id}` not found"))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::bank_store::memory::MemoryBankStore,
        state::AppState,
    };

    async fn state_with_store() -> crate::state::SharedState {
        let store = MemoryBankStore::new();
        let state = AppState::new(AppConfig::default(), None);
        state
            .install_stores(Arc::new(store.clone()), Arc::new(store))
            .await;
        state
    }

    fn theme_input(name: &str) -> ThemeInput {
        ThemeInput {
            name: name.to_owned(),
            description: "a theme".to_owned(),
            is_public: true,
            company_name: None,
            company_sub_name: None,
        }
    }

    #[tokio::test]
    async fn private_theme_requires_company_name() {
        let state = state_with_store().await;

        let mut input = theme_input("internal quiz");
        input.is_public = false;
        let err = create_theme(&state, input).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn eleventh_default_theme_is_rejected_and_flag_stays_unset() {
        let state = state_with_store().await;

        for index in 0..MAX_DEFAULT_THEMES {
            let theme = create_theme(&state, theme_input(&format!("theme {index}")))
                .await
                .unwrap();
            set_default(&state, theme.id, true).await.unwrap();
        }

        let eleventh = create_theme(&state, theme_input("one too many")).await.unwrap();
        let err = set_default(&state, eleventh.id, true).await.unwrap_err();

        match err {
            ServiceError::LimitExceeded { count, max } => {
                assert_eq!(count, 10);
                assert_eq!(max, 10);
            }
            other => panic!("expected LimitExceeded, got {other:?}"),
        }

        let theme = get_theme(&state, eleventh.id).await.unwrap();
        assert!(!theme.is_default);
    }

    #[tokio::test]
    async fn unsetting_is_permitted_at_the_cap() {
        let state = state_with_store().await;

        let mut last = None;
        for index in 0..MAX_DEFAULT_THEMES {
            let theme = create_theme(&state, theme_input(&format!("theme {index}")))
                .await
                .unwrap();
            set_default(&state, theme.id, true).await.unwrap();
            last = Some(theme.id);
        }

        let response = set_default(&state, last.unwrap(), false).await.unwrap();
        assert!(!response.is_default);
        assert_eq!(response.default_count, 9);

        // Freed slot can be taken again.
        let replacement = create_theme(&state, theme_input("replacement")).await.unwrap();
        let response = set_default(&state, replacement.id, true).await.unwrap();
        assert_eq!(response.default_count, 10);
    }

    #[tokio::test]
    async fn toggling_a_missing_theme_reports_not_found() {
        let state = state_with_store().await;
        let err = set_default(&state, Uuid::new_v4(), true).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
