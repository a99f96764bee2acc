use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::theme::{
        SetDefaultRequest, SetDefaultResponse, ThemeInput, ThemeSummary, UpdateThemeRequest,
    },
    error::AppError,
    services::theme_service,
    state::SharedState,
};

/// Theme management endpoints, including the default-flag toggle.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/themes", get(list_themes).post(create_theme))
        .route(
            "/themes/{id}",
            get(get_theme).put(update_theme).delete(delete_theme),
        )
        .route("/themes/{id}/default", put(set_default))
        .route_layer(middleware::from_fn_with_state(
            state,
            super::require_admin_for_writes,
        ))
}

/// Retrieve all themes known to the bank.
#[utoipa::path(
    get,
    path = "/themes",
    tag = "themes",
    responses((status = 200, description = "List available themes", body = [ThemeSummary]))
)]
pub async fn list_themes(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ThemeSummary>>, AppError> {
    Ok(Json(theme_service::list_themes(&state).await?))
}

/// Retrieve a theme by its ID.
#[utoipa::path(
    get,
    path = "/themes/{id}",
    tag = "themes",
    params(("id" = Uuid, Path, description = "Identifier of the theme to retrieve")),
    responses((status = 200, description = "Theme", body = ThemeSummary))
)]
pub async fn get_theme(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ThemeSummary>, AppError> {
    Ok(Json(theme_service::get_theme(&state, id).await?))
}

/// Create a theme.
#[utoipa::path(
    post,
    path = "/themes",
    tag = "themes",
    params(("X-Admin-Token" = String, Header, description = "Admin token")),
    request_body = ThemeInput,
    responses((status = 200, description = "Theme created", body = ThemeSummary))
)]
pub async fn create_theme(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<ThemeInput>>,
) -> Result<Json<ThemeSummary>, AppError> {
    Ok(Json(theme_service::create_theme(&state, payload).await?))
}

/// Apply a partial update to a theme.
#[utoipa::path(
    put,
    path = "/themes/{id}",
    tag = "themes",
    params(("X-Admin-Token" = String, Header, description = "Admin token"),
    ("id" = Uuid, Path, description = "Identifier of the theme to update")),
    request_body = UpdateThemeRequest,
    responses((status = 200, description = "Theme updated", body = ThemeSummary))
)]
pub async fn update_theme(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<UpdateThemeRequest>>,
) -> Result<Json<ThemeSummary>, AppError> {
    Ok(Json(theme_service::update_theme(&state, id, payload).await?))
}

/// Delete a theme by its identifier.
#[utoipa::path(
    delete,
    path = "/themes/{id}",
    tag = "themes",
    params(("X-Admin-Token" = String, Header, description = "Admin token"),
    ("id" = Uuid, Path, description = "Identifier of the theme to delete")),
    responses((status = 204, description = "Theme deleted"))
)]
pub async fn delete_theme(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    theme_service::delete_theme(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Flip a theme's default flag, honoring the global cap.
#[utoipa::path(
    put,
    path = "/themes/{id}/default",
    tag = "themes",
    params(("X-Admin-Token" = String, Header, description = "Admin token"),
    ("id" = Uuid, Path, description = "Identifier of the theme to toggle")),
    request_body = SetDefaultRequest,
    responses(
        (status = 200, description = "Flag updated", body = SetDefaultResponse),
        (status = 409, description = "Default-theme cap already reached")
    )
)]
pub async fn set_default(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetDefaultRequest>,
) -> Result<Json<SetDefaultResponse>, AppError> {
    Ok(Json(
        theme_service::set_default(&state, id, payload.is_default).await?,
    ))
}
