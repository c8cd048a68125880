//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

const MAX_EMAIL_LENGTH: usize = 100;
const MAX_NAME_LENGTH: usize = 50;

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.trim().is_empty() {
        return Err("Email is required".to_string());
    }

    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(format!(
            "Email must be at most {} characters long",
            MAX_EMAIL_LENGTH
        ));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email.trim()) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate display name
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(format!(
            "Name must be at most {} characters long",
            MAX_NAME_LENGTH
        ));
    }

    Ok(())
}

/// Validate password submitted over HTTP
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    let length = password.chars().count();

    if length < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if length > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err("Password must contain at least one letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("test@londonappdev.com").is_ok());
        assert!(validate_email("test@LONDONAPPDEV.COM").is_ok());
        assert_eq!(validate_email(""), Err("Email is required".to_string()));
        assert_eq!(
            validate_email("not-an-email"),
            Err("Invalid email format".to_string())
        );

        let long = format!("{}@example.com", "a".repeat(95));
        assert!(validate_email(&long).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("").is_ok());
        assert!(validate_name("Jane Doe").is_ok());
        assert!(validate_name(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Testpass123").is_ok());
        assert!(validate_password("short1").is_err());
        assert!(validate_password("onlyletters").is_err());
        assert!(validate_password("12345678").is_err());
        assert!(validate_password(&format!("a1{}", "x".repeat(127))).is_err());
    }

    #[test]
    fn test_validate_password_counts_characters() {
        // 5 characters, 8 bytes
        assert!(validate_password("ééé1a").is_err());
        assert!(validate_password("ééééééé1").is_ok());
        assert!(validate_password(&format!("1{}", "é".repeat(127))).is_ok());
        assert!(validate_password(&format!("1{}", "é".repeat(128))).is_err());
    }
}
