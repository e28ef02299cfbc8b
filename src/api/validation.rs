//! Validation for untrusted query-string and path parameters.

use super::ApiError;
use crate::constants::limits;
use crate::models::{NoteStatus, Role};

/// Pages are 1-based; zero or missing falls back to the first page.
pub fn validate_page(page: Option<u64>) -> u64 {
    match page {
        Some(p) if p >= 1 => p,
        _ => 1,
    }
}

/// Clamp the page size into `1..=MAX_PAGE_SIZE`.
pub fn validate_limit(limit: Option<u64>) -> u64 {
    match limit {
        Some(l) if l >= 1 => l.min(limits::MAX_PAGE_SIZE),
        _ => limits::DEFAULT_PAGE_SIZE,
    }
}

pub fn parse_role(raw: &str) -> Result<Role, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation(format!("Unknown role: {raw}")))
}

pub fn parse_status(raw: &str) -> Result<NoteStatus, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation(format!("Unknown status: {raw}")))
}

pub fn non_empty(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults_and_floors() {
        assert_eq!(validate_page(None), 1);
        assert_eq!(validate_page(Some(0)), 1);
        assert_eq!(validate_page(Some(7)), 7);
    }

    #[test]
    fn test_limit_defaults_and_caps() {
        assert_eq!(validate_limit(None), limits::DEFAULT_PAGE_SIZE);
        assert_eq!(validate_limit(Some(0)), limits::DEFAULT_PAGE_SIZE);
        assert_eq!(validate_limit(Some(25)), 25);
        assert_eq!(validate_limit(Some(100_000)), limits::MAX_PAGE_SIZE);
    }

    #[test]
    fn test_parse_role_rejects_unknown() {
        assert!(parse_role("manager").is_ok());
        assert!(parse_role("root").is_err());
    }

    #[test]
    fn test_parse_status_accepts_both_separators() {
        assert!(parse_status("in-progress").is_ok());
        assert!(parse_status("in_progress").is_ok());
        assert!(parse_status("done").is_err());
    }

    #[test]
    fn test_non_empty_rejects_whitespace() {
        assert!(non_empty("x", "title").is_ok());
        assert!(non_empty("   ", "title").is_err());
    }
}
