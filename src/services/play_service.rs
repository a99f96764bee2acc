//! Quiz-session helper recording that a question has been served to a player.

use uuid::Uuid;

use crate::{dto::player::RecordPlayResponse, error::ServiceError, state::SharedState};

/// Append a play record for the given player and question.
///
/// Recording the same pair twice is a no-op, so the session flow can safely
/// retry. The record only ever feeds the "not played by" selection; it is
/// never surfaced directly.
pub async fn record_play(
    state: &SharedState,
    player_id: Uuid,
    question_id: Uuid,
) -> Result<RecordPlayResponse, ServiceError> {
    let questions = state.require_question_store().await?;
    if state
        .bounded(questions.find_question(question_id))
        .await?
        .is_none()
    {
        return Err(ServiceError::NotFound(format!(
            "question `{question_id}` not found"
        )));
    }

    let plays = state.require_play_history().await?;
    state.bounded(plays.record_played(player_id, question_id)).await?;

    Ok(RecordPlayResponse {
        player_id,
        question_id,
    })
}
