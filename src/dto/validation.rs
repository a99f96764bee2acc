//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a required text field is present and not blank.
///
/// Whitespace-only values are rejected so a spreadsheet cell holding a single
/// space does not slip past the required-field check.
pub fn validate_required_text(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required_text");
        err.message = Some("field must not be blank".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required_text_valid() {
        assert!(validate_required_text("What year did it happen?").is_ok());
        assert!(validate_required_text("42").is_ok());
        assert!(validate_required_text(" padded ").is_ok());
    }

    #[test]
    fn test_validate_required_text_blank() {
        assert!(validate_required_text("").is_err());
        assert!(validate_required_text(" ").is_err());
        assert!(validate_required_text("\t\n").is_err());
    }
}
