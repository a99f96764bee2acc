//! Bulk question import: parses an uploaded spreadsheet into rows, validates
//! and deduplicates each row against the question store, and reports partial
//! success per row.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        import::{ImportOutcome, ImportRow, RejectReason},
        question::QuestionInput,
    },
    error::ServiceError,
    state::SharedState,
};

/// Columns recognized in the sheet header, in their canonical order.
const COLUMNS: [&str; 7] = [
    "theme", "text", "answer1", "answer2", "answer3", "answer4", "image",
];

/// Parse uploaded spreadsheet bytes into import rows.
///
/// The artifact kind is taken from the upload's content type: anything
/// containing `csv` is read as CSV, anything containing `sheet` as a workbook
/// (XLSX/ODS). Other kinds are rejected before any row is examined.
pub fn parse_rows(content_type: &str, bytes: &[u8]) -> Result<Vec<ImportRow>, ServiceError> {
    if content_type.contains("csv") {
        parse_csv(bytes)
    } else if content_type.contains("sheet") {
        parse_workbook(bytes)
    } else {
        Err(ServiceError::InvalidArgument(
            "file must be a CSV or spreadsheet upload".into(),
        ))
    }
}

fn parse_csv(bytes: &[u8]) -> Result<Vec<ImportRow>, ServiceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: ImportRow = record.map_err(|err| {
            ServiceError::InvalidArgument(format!("unreadable CSV row: {err}"))
        })?;
        rows.push(row);
    }
    Ok(rows)
}

fn parse_workbook(bytes: &[u8]) -> Result<Vec<ImportRow>, ServiceError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor).map_err(|err| {
        ServiceError::InvalidArgument(format!("unreadable spreadsheet: {err}"))
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ServiceError::InvalidArgument("spreadsheet has no sheets".into()))?
        .map_err(|err| ServiceError::InvalidArgument(format!("unreadable sheet: {err}")))?;

    let mut sheet_rows = range.rows();
    let Some(header) = sheet_rows.next() else {
        return Ok(Vec::new());
    };

    // Map cell positions to recognized columns by header name.
    let mut columns: HashMap<usize, &'static str> = HashMap::new();
    for (index, cell) in header.iter().enumerate() {
        let name = cell.to_string().trim().to_lowercase();
        if let Some(column) = COLUMNS.iter().find(|column| **column == name) {
            columns.insert(index, *column);
        }
    }
    if columns.is_empty() {
        return Err(ServiceError::InvalidArgument(
            "sheet header names no recognized columns".into(),
        ));
    }

    let mut rows = Vec::new();
    for sheet_row in sheet_rows {
        let mut row = ImportRow::default();
        for (index, cell) in sheet_row.iter().enumerate() {
            let Some(column) = columns.get(&index) else {
                continue;
            };
            let value = cell_text(cell);
            match *column {
                "theme" => row.theme = value,
                "text" => row.text = value,
                "answer1" => row.answer1 = value,
                "answer2" => row.answer2 = value,
                "answer3" => row.answer3 = value,
                "answer4" => row.answer4 = value,
                "image" => row.image = value,
                _ => unreachable!("column names come from COLUMNS"),
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        other => {
            let text = other.to_string();
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
    }
}

/// Reconcile a parsed batch against the question store.
///
/// Rows are processed in order and succeed or fail independently: a rejected
/// row never aborts the batch, and rows committed before a storage outage stay
/// committed. The store's write-time uniqueness check arbitrates duplicates,
/// both against existing questions and between rows of the same batch.
pub async fn import_batch(
    state: &SharedState,
    rows: Vec<ImportRow>,
) -> Result<ImportOutcome, ServiceError> {
    let max_rows = state.config().max_import_rows();
    if rows.len() > max_rows {
        return Err(ServiceError::InvalidArgument(format!(
            "import batch of {} rows exceeds the limit of {max_rows}",
            rows.len()
        )));
    }

    let store = state.require_question_store().await?;

    let themes = state.bounded(store.list_themes()).await?;
    let theme_ids: HashSet<Uuid> = themes.iter().map(|theme| theme.id).collect();
    let theme_names: HashMap<String, Uuid> = themes
        .iter()
        .map(|theme| (theme.name.trim().to_lowercase(), theme.id))
        .collect();

    let mut outcome = ImportOutcome::new();
    for (index, row) in rows.into_iter().enumerate() {
        let row_number = index + 1;

        let draft = match validate_row(row, &theme_ids, &theme_names) {
            Ok(draft) => draft,
            Err(fields) => {
                outcome.reject(row_number, RejectReason::ValidationFailed, fields);
                continue;
            }
        };

        match state.bounded(store.insert_question(draft.into_entity())).await {
            Ok(()) => outcome.accept(),
            Err(ServiceError::DuplicateText(text)) => {
                outcome.reject(row_number, RejectReason::DuplicateText, text);
            }
            Err(err) => return Err(err),
        }
    }

    debug!(
        total = outcome.total_rows,
        succeeded = outcome.succeeded,
        rejected = outcome.rejected,
        "import batch reconciled"
    );
    Ok(outcome)
}

/// Validate one row against the single-question creation schema.
///
/// Returns the creation payload, or the offending field names joined in
/// canonical column order.
fn validate_row(
    row: ImportRow,
    theme_ids: &HashSet<Uuid>,
    theme_names: &HashMap<String, Uuid>,
) -> Result<QuestionInput, String> {
    let theme = row
        .theme
        .as_deref()
        .and_then(|reference| resolve_theme(reference, theme_ids, theme_names));

    let input = QuestionInput {
        theme: theme.unwrap_or(Uuid::nil()),
        text: row.text.unwrap_or_default(),
        answer1: row.answer1.unwrap_or_default(),
        answer2: row.answer2.unwrap_or_default(),
        answer3: row.answer3.unwrap_or_default(),
        answer4: row.answer4.unwrap_or_default(),
        image: row.image,
    };

    let mut failed: Vec<&str> = Vec::new();
    if theme.is_none() {
        failed.push("theme");
    }
    if let Err(errors) = input.validate() {
        let fields = errors.field_errors();
        for column in COLUMNS {
            if fields.contains_key(column) {
                failed.push(column);
            }
        }
    }

    if failed.is_empty() {
        Ok(input)
    } else {
        Err(failed.join(", "))
    }
}

/// Resolve a raw theme reference, accepting a theme id or a theme name.
fn resolve_theme(
    reference: &str,
    theme_ids: &HashSet<Uuid>,
    theme_names: &HashMap<String, Uuid>,
) -> Option<Uuid> {
    let reference = reference.trim();
    if let Ok(id) = Uuid::parse_str(reference) {
        return theme_ids.contains(&id).then_some(id);
    }
    theme_names.get(&reference.to_lowercase()).copied()
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

    async fn seed_theme(store: &MemoryBankStore, name: &str) -> Uuid {
        let theme = ThemeEntity {
            id: Uuid::new_v4(),
            name: name.to_owned(),
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

    fn row(theme: &str, text: &str) -> ImportRow {
        ImportRow {
            theme: Some(theme.to_owned()),
            text: Some(text.to_owned()),
            answer1: Some("a".to_owned()),
            answer2: Some("b".to_owned()),
            answer3: Some("c".to_owned()),
            answer4: Some("d".to_owned()),
            image: None,
        }
    }

    #[tokio::test]
    async fn rejects_only_the_invalid_row_and_commits_the_rest() {
        let (state, store) = state_with_store().await;
        seed_theme(&store, "history").await;

        let mut blank_text = row("history", "");
        blank_text.text = None;
        let rows = vec![
            row("history", "first question"),
            blank_text,
            row("history", "third question"),
        ];

        let outcome = import_batch(&state, rows).await.unwrap();

        assert_eq!(outcome.total_rows, 3);
        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.rejected, 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].row, 2);
        assert_eq!(outcome.failures[0].reason, RejectReason::ValidationFailed);
        assert_eq!(outcome.failures[0].detail, "text");

        assert_eq!(store.list_questions().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn reimporting_the_same_batch_rejects_every_row_as_duplicate() {
        let (state, store) = state_with_store().await;
        seed_theme(&store, "history").await;

        let rows = vec![row("history", "alpha"), row("history", "beta")];

        let first = import_batch(&state, rows.clone()).await.unwrap();
        assert_eq!(first.succeeded, 2);

        let second = import_batch(&state, rows).await.unwrap();
        assert_eq!(second.succeeded, 0);
        assert_eq!(second.rejected, 2);
        assert!(second
            .failures
            .iter()
            .all(|failure| failure.reason == RejectReason::DuplicateText));

        // No duplicate questions were created.
        assert_eq!(store.list_questions().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn intra_batch_duplicates_commit_only_once() {
        let (state, store) = state_with_store().await;
        seed_theme(&store, "history").await;

        let rows = vec![row("history", "same text"), row("history", "same text")];
        let outcome = import_batch(&state, rows).await.unwrap();

        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.rejected, 1);
        assert_eq!(outcome.failures[0].row, 2);
        assert_eq!(outcome.failures[0].reason, RejectReason::DuplicateText);
        assert_eq!(store.list_questions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unresolved_theme_reference_fails_validation() {
        let (state, store) = state_with_store().await;
        seed_theme(&store, "history").await;

        let rows = vec![row("no such theme", "orphan question")];
        let outcome = import_batch(&state, rows).await.unwrap();

        assert_eq!(outcome.rejected, 1);
        assert_eq!(outcome.failures[0].reason, RejectReason::ValidationFailed);
        assert_eq!(outcome.failures[0].detail, "theme");
    }

    #[tokio::test]
    async fn missing_fields_are_reported_in_column_order() {
        let (state, store) = state_with_store().await;
        seed_theme(&store, "history").await;

        let mut broken = row("history", "incomplete");
        broken.answer2 = None;
        broken.answer4 = Some("  ".to_owned());

        let outcome = import_batch(&state, vec![broken]).await.unwrap();
        assert_eq!(outcome.failures[0].detail, "answer2, answer4");
    }

    #[tokio::test]
    async fn counts_always_reconcile() {
        let (state, store) = state_with_store().await;
        let theme_id = seed_theme(&store, "history").await;

        let rows = vec![
            row(&theme_id.to_string(), "by id"),
            row("history", "by name"),
            row("HISTORY", "name lookup ignores case"),
            ImportRow::default(),
            row("history", "by id"),
        ];

        let outcome = import_batch(&state, rows).await.unwrap();
        assert_eq!(outcome.total_rows, 5);
        assert_eq!(outcome.succeeded + outcome.rejected, outcome.total_rows);
        assert_eq!(outcome.succeeded, 3);
    }

    #[tokio::test]
    async fn oversized_batches_are_rejected_up_front() {
        let (state, store) = state_with_store().await;
        seed_theme(&store, "history").await;

        let rows: Vec<ImportRow> = (0..AppConfig::default().max_import_rows() + 1)
            .map(|index| row("history", &format!("question {index}")))
            .collect();

        let err = import_batch(&state, rows).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
        assert!(store.list_questions().await.unwrap().is_empty());
    }

    #[test]
    fn parses_csv_with_headers() {
        let csv = "theme,text,answer1,answer2,answer3,answer4,image\n\
                   history,What year?,1914,1915,1916,1917,\n\
                   history,Which king?,Henry,Louis,Philip,Charles,kings.png\n";

        let rows = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text.as_deref(), Some("What year?"));
        assert_eq!(rows[0].image, None);
        assert_eq!(rows[1].image.as_deref(), Some("kings.png"));
    }

    #[test]
    fn unrecognized_content_type_is_rejected() {
        let err = parse_rows("image/png", b"not a sheet").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }

    #[test]
    fn csv_content_type_variants_are_accepted() {
        let csv = "theme,text,answer1,answer2,answer3,answer4\n";
        assert!(parse_rows("text/csv", csv.as_bytes()).is_ok());
        assert!(parse_rows("application/csv; charset=utf-8", csv.as_bytes()).is_ok());
    }
}
