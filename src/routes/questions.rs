use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    middleware,
    routing::{get, post},
};
use axum_valid::Valid;
use rand::{SeedableRng, rngs::StdRng};
use uuid::Uuid;

use crate::{
    dto::{
        import::ImportOutcome,
        question::{QuestionInput, QuestionListParams, QuestionSummary, UpdateQuestionRequest},
    },
    error::AppError,
    services::{import_service, question_service, selection_service},
    state::SharedState,
};

/// Question bank endpoints: listing, selection, CRUD, and bulk import.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/questions", get(list_questions).post(create_question))
        .route("/questions/import", post(import_questions))
        .route(
            "/questions/{id}",
            get(get_question).put(update_question).delete(delete_question),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            super::require_admin_for_writes,
        ))
}

/// List questions, by theme, or select unplayed ones for a player.
///
/// With `theme` and `npb` the endpoint switches to the "not played by"
/// selection and a positive `limit` becomes mandatory.
#[utoipa::path(
    get,
    path = "/questions",
    tag = "questions",
    params(QuestionListParams),
    responses(
        (status = 200, description = "Matching questions", body = [QuestionSummary]),
        (status = 400, description = "Selection requested without a limit")
    )
)]
pub async fn list_questions(
    State(state): State<SharedState>,
    Query(params): Query<QuestionListParams>,
) -> Result<Json<Vec<QuestionSummary>>, AppError> {
    if let Some(theme) = params.theme {
        if let Some(player) = params.npb {
            let mut rng = StdRng::from_os_rng();
            let selected =
                selection_service::select_unplayed(&state, player, theme, params.limit, &mut rng)
                    .await?;
            return Ok(Json(selected));
        }
        return Ok(Json(
            question_service::questions_by_theme(&state, theme).await?,
        ));
    }

    Ok(Json(question_service::list_questions(&state).await?))
}

/// Retrieve a question by its ID.
#[utoipa::path(
    get,
    path = "/questions/{id}",
    tag = "questions",
    params(("id" = Uuid, Path, description = "Identifier of the question to retrieve")),
    responses((status = 200, description = "Question", body = QuestionSummary))
)]
pub async fn get_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuestionSummary>, AppError> {
    Ok(Json(question_service::get_question(&state, id).await?))
}

/// Create a single question.
#[utoipa::path(
    post,
    path = "/questions",
    tag = "questions",
    params(("X-Admin-Token" = String, Header, description = "Admin token")),
    request_body = QuestionInput,
    responses(
        (status = 200, description = "Question created", body = QuestionSummary),
        (status = 409, description = "A question with the same text already exists")
    )
)]
pub async fn create_question(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<QuestionInput>>,
) -> Result<Json<QuestionSummary>, AppError> {
    Ok(Json(question_service::create_question(&state, payload).await?))
}

/// Apply a partial update to a question.
#[utoipa::path(
    put,
    path = "/questions/{id}",
    tag = "questions",
    params(("X-Admin-Token" = String, Header, description = "Admin token"),
    ("id" = Uuid, Path, description = "Identifier of the question to update")),
    request_body = UpdateQuestionRequest,
    responses((status = 200, description = "Question updated", body = QuestionSummary))
)]
pub async fn update_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<UpdateQuestionRequest>>,
) -> Result<Json<QuestionSummary>, AppError> {
    Ok(Json(
        question_service::update_question(&state, id, payload).await?,
    ))
}

/// Delete a question by its identifier.
#[utoipa::path(
    delete,
    path = "/questions/{id}",
    tag = "questions",
    params(("X-Admin-Token" = String, Header, description = "Admin token"),
    ("id" = Uuid, Path, description = "Identifier of the question to delete")),
    responses((status = 204, description = "Question deleted"))
)]
pub async fn delete_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    question_service::delete_question(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Bulk-import questions from an uploaded spreadsheet.
///
/// The body carries the raw CSV/XLSX bytes; the content type decides the
/// parser. Row-level problems never fail the request: they are reported in
/// the returned outcome.
#[utoipa::path(
    post,
    path = "/questions/import",
    tag = "questions",
    params(("X-Admin-Token" = String, Header, description = "Admin token")),
    request_body = Vec<u8>,
    responses(
        (status = 200, description = "Per-row import outcome", body = ImportOutcome),
        (status = 400, description = "Not a recognized spreadsheet upload")
    )
)]
pub async fn import_questions(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ImportOutcome>, AppError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let rows = import_service::parse_rows(content_type, &body)?;
    Ok(Json(import_service::import_batch(&state, rows).await?))
}
