//! Input validation for caller-supplied strings (themes, record ids).

/// Longest theme label accepted, in characters.
pub const MAX_THEME_CHARS: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Theme cannot be empty")]
    EmptyTheme,

    #[error("Theme is too long (maximum {max} characters)")]
    ThemeTooLong { max: usize },

    #[error("Invalid record id: {reason}")]
    InvalidId { reason: String },
}

/// Trim a theme label and strip control characters.
pub fn sanitize_theme(raw: &str) -> Result<String, InputError> {
    let cleaned: String = raw.chars().filter(|c| !c.is_control()).collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return Err(InputError::EmptyTheme);
    }
    if trimmed.chars().count() > MAX_THEME_CHARS {
        return Err(InputError::ThemeTooLong {
            max: MAX_THEME_CHARS,
        });
    }
    Ok(trimmed.to_string())
}

/// Validate a dungeon or game id (must be valid UUID format)
pub fn validate_record_id(id: &str) -> Result<String, InputError> {
    let trimmed = id.trim();
    if uuid::Uuid::parse_str(trimmed).is_err() {
        return Err(InputError::InvalidId {
            reason: format!("'{}' is not a UUID", crate::logutil::escape_log(trimmed)),
        });
    }
    Ok(trimmed.to_ascii_lowercase())
}
