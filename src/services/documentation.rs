use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the quiz question bank.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::questions::list_questions,
        crate::routes::questions::get_question,
        crate::routes::questions::create_question,
        crate::routes::questions::update_question,
        crate::routes::questions::delete_question,
        crate::routes::questions::import_questions,
        crate::routes::themes::list_themes,
        crate::routes::themes::get_theme,
        crate::routes::themes::create_theme,
        crate::routes::themes::update_theme,
        crate::routes::themes::delete_theme,
        crate::routes::themes::set_default,
        crate::routes::players::record_play,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::question::QuestionInput,
            crate::dto::question::UpdateQuestionRequest,
            crate::dto::question::QuestionSummary,
            crate::dto::theme::ThemeInput,
            crate::dto::theme::UpdateThemeRequest,
            crate::dto::theme::ThemeSummary,
            crate::dto::theme::SetDefaultRequest,
            crate::dto::theme::SetDefaultResponse,
            crate::dto::import::ImportOutcome,
            crate::dto::import::ImportFailure,
            crate::dto::import::RejectReason,
            crate::dto::player::RecordPlayRequest,
            crate::dto::player::RecordPlayResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "questions", description = "Question bank management and selection"),
        (name = "themes", description = "Theme management and default suggestions"),
        (name = "players", description = "Quiz-session play recording"),
    )
)]
pub struct ApiDoc;
