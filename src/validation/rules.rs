//! Common validation rules shared across request payloads.

use validator::ValidationError;

/// Rejects values that are empty once surrounding whitespace is trimmed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required_field_blank"));
    }
    Ok(())
}

/// Validates username format.
///
/// Requirements:
/// - Only alphanumeric characters and underscores
/// - 1-50 characters in length
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let username = username.trim();
    if username.is_empty() || username.len() > 50 {
        return Err(ValidationError::new("username_invalid_length"));
    }

    if !username.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(ValidationError::new("username_invalid_characters"));
    }

    Ok(())
}

/// Minimum length guardrail for new passwords.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.trim().is_empty() {
        return Err(ValidationError::new("required_field_blank"));
    }
    if password.len() < 8 {
        return Err(ValidationError::new("password_too_short"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_rejected_after_trimming() {
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank(" Jane ").is_ok());
    }

    #[test]
    fn username_rejects_special_chars() {
        assert!(validate_username("user@name").is_err());
        assert!(validate_username("").is_err());
        assert!(validate_username("valid_user123").is_ok());
    }

    #[test]
    fn password_rejects_short_or_blank() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("        ").is_err());
        assert!(validate_password("p@ss1234").is_ok());
    }
}
