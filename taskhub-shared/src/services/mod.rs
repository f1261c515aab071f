/// Registry operations
///
/// Each operation takes the acting user's id, performs the resource lookup and
/// authorization check, and then mutates inside a transaction where more than
/// one row changes. Task mutations append to the history ledger in the same
/// transaction.
///
/// - `accounts`: registration, verification, login, profile, account deletion
/// - `projects`: project lifecycle and membership
/// - `tasks`: task lifecycle, assignment and listing

pub mod accounts;
pub mod projects;
pub mod tasks;

use crate::error::{CoreError, CoreResult};

/// Trims a required text field, rejecting blank input
pub(crate) fn required_text(field: &str, value: &str) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Like [`required_text`] for optional patch fields
pub(crate) fn optional_text(field: &str, value: Option<String>) -> CoreResult<Option<String>> {
    value.map(|v| required_text(field, &v)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("name", "  P1 ").unwrap(), "P1");
        assert!(matches!(
            required_text("name", "   "),
            Err(CoreError::Validation(msg)) if msg == "name is required"
        ));
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text("name", None).unwrap(), None);
        assert_eq!(
            optional_text("name", Some(" x ".to_string())).unwrap(),
            Some("x".to_string())
        );
        assert!(optional_text("name", Some(String::new())).is_err());
    }
}
