//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Minimum accepted password length
pub const PASSWORD_MIN_LENGTH: usize = 5;

/// Normalize an email address by lowercasing its domain part
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < PASSWORD_MIN_LENGTH {
        return Err(format!(
            "Password must be at least {PASSWORD_MIN_LENGTH} characters long"
        ));
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    Ok(())
}

/// Validate a tag, ingredient, or recipe name
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name must not be blank".to_string());
    }

    if name.len() > 255 {
        return Err("Name must be at most 255 characters long".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_email_domain_to_lowercase() {
        assert_eq!(normalize_email("test@TEST.COM"), "test@test.com");
        assert_eq!(normalize_email("Mixed@Example.Org"), "Mixed@example.org");
        assert_eq!(normalize_email("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn accepts_valid_emails() {
        assert!(validate_email("test@test.com").is_ok());
        assert!(validate_email("a.b+c@sub.example.org").is_ok());
    }

    #[test]
    fn rejects_invalid_emails() {
        assert!(validate_email("").is_err());
        assert!(validate_email("one").is_err());
        assert!(validate_email("missing@domain").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn enforces_password_minimum_length() {
        assert!(validate_password("pw").is_err());
        assert!(validate_password("1234").is_err());
        assert!(validate_password("pass1").is_ok());
        assert!(validate_password("pass123").is_ok());
    }

    #[test]
    fn rejects_blank_names() {
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name("Vegan").is_ok());
    }
}
