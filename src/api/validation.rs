//! Input validation for API requests.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating email addresses (pragmatic, not fully RFC 5322)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"
    ).unwrap();
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email is too long".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email address".to_string());
    }

    Ok(())
}

/// Validate a password for registration or profile update
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() > 512 {
        return Err("Password is too long".to_string());
    }

    Ok(())
}

/// Validate an event date (RFC 3339 timestamp)
pub fn validate_event_date(date: &str) -> Result<(), String> {
    if date.is_empty() {
        return Err("Date is required".to_string());
    }

    chrono::DateTime::parse_from_rfc3339(date)
        .map(|_| ())
        .map_err(|_| "Invalid date format, expected RFC 3339".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("first.last+tag@sub.campus.edu").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email("@campus.edu").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("pw").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password(&"x".repeat(513)).is_err());
    }

    #[test]
    fn test_validate_event_date() {
        assert!(validate_event_date("2026-03-14T10:00:00Z").is_ok());
        assert!(validate_event_date("2026-03-14T10:00:00+02:00").is_ok());
        assert!(validate_event_date("").is_err());
        assert!(validate_event_date("next tuesday").is_err());
        assert!(validate_event_date("2026-03-14").is_err());
    }
}
