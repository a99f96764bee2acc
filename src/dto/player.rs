//! DTO definitions for the quiz-session play recording endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Request to record that a question was served to a player.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordPlayRequest {
    /// Question that was served.
    pub question_id: Uuid,
}

/// Acknowledgement returned once a play has been recorded.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordPlayResponse {
    pub player_id: Uuid,
    pub question_id: Uuid,
}
