use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use uuid::Uuid;

use crate::{
    dto::player::{RecordPlayRequest, RecordPlayResponse},
    error::AppError,
    services::play_service,
    state::SharedState,
};

/// Quiz-session endpoints feeding the play history.
pub fn router() -> Router<SharedState> {
    Router::new().route("/players/{id}/plays", post(record_play))
}

/// Record that a question has been served to a player.
#[utoipa::path(
    post,
    path = "/players/{id}/plays",
    tag = "players",
    params(("id" = Uuid, Path, description = "Identifier of the player")),
    request_body = RecordPlayRequest,
    responses((status = 200, description = "Play recorded", body = RecordPlayResponse))
)]
pub async fn record_play(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordPlayRequest>,
) -> Result<Json<RecordPlayResponse>, AppError> {
    Ok(Json(
        play_service::record_play(&state, id, payload.question_id).await?,
    ))
}
