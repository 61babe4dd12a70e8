//! Custom validation functions shared by the configuration sections.

use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

static DESTINATION_NAME: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.\-]{0,127}$").ok());

static EQUALITY_TERM: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^\s*[A-Za-z_][A-Za-z0-9_]*\s*=\s*('[^']*'|-?[0-9]+)\s*$").ok()
});

/// Topic and queue names: letters, digits, `_`, `.` and `-`, not starting
/// with a separator.
pub fn validate_destination(name: &str) -> Result<(), ValidationError> {
    let re = DESTINATION_NAME
        .as_ref()
        .ok_or_else(|| ValidationError::new("invalid_regex"))?;
    if re.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_destination"))
    }
}

/// Selectors are `KEY = 'text'` or `KEY = 123` terms joined by `AND`.
pub fn validate_selector(selector: &str) -> Result<(), ValidationError> {
    let re = EQUALITY_TERM
        .as_ref()
        .ok_or_else(|| ValidationError::new("invalid_regex"))?;
    if selector.trim().is_empty() {
        return Ok(());
    }
    if selector.split(" AND ").all(|term| re.is_match(term)) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_selector"))
    }
}
