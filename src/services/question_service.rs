//! Business logic powering the question CRUD routes. Creation runs the shared
//! question schema and defers duplicate-text arbitration to the store's
//! write-time uniqueness check.

use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::question::{QuestionInput, QuestionSummary, UpdateQuestionRequest},
    error::ServiceError,
    state::SharedState,
};

/// Return every question in the bank.
pub async fn list_questions(state: &SharedState) -> Result<Vec<QuestionSummary>, ServiceError> {
    let store = state.require_question_store().await?;
    let questions = state.bounded(store.list_questions()).await?;
    Ok(questions.into_iter().map(Into::into).collect())
}

/// Return the questions attached to a theme.
pub async fn questions_by_theme(
    state: &SharedState,
    theme_id: Uuid,
) -> Result<Vec<QuestionSummary>, ServiceError> {
    let store = state.require_question_store().await?;
    let questions = state.bounded(store.find_by_theme(theme_id)).await?;
    Ok(questions.into_iter().map(Into::into).collect())
}

/// Return a single question by its identifier.
pub async fn get_question(
    state: &SharedState,
    id: Uuid,
) -> Result<QuestionSummary, ServiceError> {
    let store = state.require_question_store().await?;
    let question = state
        .bounded(store.find_question(id))
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("question `{id}` not found")))?;
    Ok(question.into())
}

/// Create a single question after validating it against the shared schema.
pub async fn create_question(
    state: &SharedState,
    input: QuestionInput,
) -> Result<QuestionSummary, ServiceError> {
    input.validate()?;

    let store = state.require_question_store().await?;
    if state.bounded(store.get_theme(input.theme)).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "theme `{}` not found",
            input.theme
        )));
    }

    // Early duplicate check for a friendly conflict; the store's write-time
    // uniqueness constraint remains the arbiter under concurrency.
    let text = input.text.trim().to_owned();
    if let Some(existing) = state.bounded(store.find_by_text(text)).await? {
        return Err(ServiceError::DuplicateText(existing.text));
    }

    let entity = input.into_entity();
    let summary: QuestionSummary = entity.clone().into();
    state.bounded(store.insert_question(entity)).await?;
    Ok(summary)
}

/// Apply a partial update to an existing question.
pub async fn update_question(
    state: &SharedState,
    id: Uuid,
    request: UpdateQuestionRequest,
) -> Result<QuestionSummary, ServiceError> {
    request.validate()?;
    let patch = request.into_patch()?;

    let store = state.require_question_store().await?;
    let updated = state
        .bounded(store.update_question(id, patch))
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("question `{id}` not found")))?;
    Ok(updated.into())
}

/// Delete a question by its identifier.
pub async fn delete_question(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_question_store().await?;
    if !state.bounded(store.delete_question(id)).await? {
        return Err(ServiceError::NotFound(format!("question `{id}` not found")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::SystemTime;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            bank_store::{QuestionStore, memory::MemoryBankStore},
            models::ThemeEntity,
        },
        state::AppState,
    };

    async fn state_with_store() -> (crate::state::SharedState, MemoryBankStore) {
        let store = MemoryBankStore::new();
        let state = AppState::new(AppConfig::default(), None);
        state
            .install_stores(Arc::new(store.clone()), Arc::new(store.clone()))
            .await;
        (state, store)
    }

    async fn seed_theme(store: &MemoryBankStore) -> Uuid {
        let theme = ThemeEntity {
            id: Uuid::new_v4(),
            name: "history".to_owned(),
            description: String::new(),
            is_public: true,
            is_default: false,
            company_name: None,
            company_sub_name: None,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        };
        let id = theme.id;
        store.insert_theme(theme).await.unwrap();
        id
    }

    fn input(theme: Uuid, text: &str) -> QuestionInput {
        QuestionInput {
            theme,
            text: text.to_owned(),
            answer1: "a".to_owned(),
            answer2: "b".to_owned(),
            answer3: "c".to_owned(),
            answer4: "d".to_owned(),
            image: None,
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_text_as_conflict() {
        let (state, store) = state_with_store().await;
        let theme = seed_theme(&store).await;

        create_question(&state, input(theme, "unique wording")).await.unwrap();
        let err = create_question(&state, input(theme, "unique wording"))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::DuplicateText(_)));
    }

    #[tokio::test]
    async fn create_rejects_blank_required_fields() {
        let (state, store) = state_with_store().await;
        let theme = seed_theme(&store).await;

        let mut blank = input(theme, "valid text");
        blank.answer3 = "  ".to_owned();
        let err = create_question(&state, blank).await.unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn create_requires_an_existing_theme() {
        let (state, _store) = state_with_store().await;

        let err = create_question(&state, input(Uuid::new_v4(), "orphan"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_questions() {
        let (state, _store) = state_with_store().await;
        let missing = Uuid::new_v4();

        let request = UpdateQuestionRequest {
            theme: None,
            text: Some("new text".to_owned()),
            answer1: None,
            answer2: None,
            answer3: None,
            answer4: None,
            image: None,
        };
        let err = update_question(&state, missing, request).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = delete_question(&state, missing).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
