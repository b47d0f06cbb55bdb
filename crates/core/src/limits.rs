//! Field length limits
//!
//! Limits mirror the column widths of the record store. They are checked
//! in characters before any mutation is staged; violations return
//! `InvalidInput` and the mutation has no effect.

use crate::error::{LibrisError, LibrisResult};

/// Maximum characters in an author's first or last name
pub const MAX_NAME_CHARS: usize = 100;

/// Maximum characters in a book title
pub const MAX_TITLE_CHARS: usize = 200;

/// Validate an author name field
pub fn validate_name(field: &'static str, value: &str) -> LibrisResult<()> {
    validate_text(field, value, MAX_NAME_CHARS)
}

/// Validate a book title
pub fn validate_title(value: &str) -> LibrisResult<()> {
    validate_text("title", value, MAX_TITLE_CHARS)
}

fn validate_text(field: &'static str, value: &str, max_chars: usize) -> LibrisResult<()> {
    if value.trim().is_empty() {
        return Err(LibrisError::invalid_input(field, "must not be blank"));
    }
    let chars = value.chars().count();
    if chars > max_chars {
        return Err(LibrisError::invalid_input(
            field,
            format!("{} characters exceeds limit of {}", chars, max_chars),
        ));
    }
    Ok(())
}
