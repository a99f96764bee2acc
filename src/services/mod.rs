/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Bulk spreadsheet import and per-row reconciliation.
pub mod import_service;
/// Play recording for the quiz-session flow.
pub mod play_service;
/// Question CRUD operations.
pub mod question_service;
/// The "not played by" question selection.
pub mod selection_service;
/// Storage connection supervision and degraded-mode handling.
pub mod storage_supervisor;
/// Theme CRUD operations and the default-flag guard.
pub mod theme_service;
