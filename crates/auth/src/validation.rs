//! Registration input rules.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("valid username pattern"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("valid email pattern"));

pub fn validate_username(username: &str) -> Option<String> {
    let username = username.trim();
    if username.chars().count() < MIN_USERNAME_LEN {
        return Some(format!("Username must be at least {MIN_USERNAME_LEN} characters long"));
    }
    if !USERNAME_RE.is_match(username) {
        return Some("Username may only contain letters, digits, '_', '.' and '-'".to_string());
    }
    None
}

pub fn validate_email(email: &str) -> Option<String> {
    if EMAIL_RE.is_match(email.trim()) {
        None
    } else {
        Some("Invalid email address".to_string())
    }
}

pub fn validate_password(password: &str) -> Option<String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        Some(format!("Password must be at least {MIN_PASSWORD_LEN} characters long"))
    } else {
        None
    }
}

/// Every problem with a registration form, in field order.
pub fn validate_registration(username: &str, email: &str, password: &str) -> Vec<String> {
    [
        validate_username(username),
        validate_email(email),
        validate_password(password),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_well_formed_registration() {
        assert!(validate_registration("ayse_k", "ayse@example.com", "secret1").is_empty());
    }

    #[test]
    fn collects_every_failure() {
        let errors = validate_registration("ab", "not-an-email", "123");
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("Username"));
        assert!(errors[2].contains("Password"));
    }

    #[test]
    fn rejects_usernames_with_spaces() {
        assert!(validate_username("john doe").is_some());
        assert!(validate_username("john.doe-1").is_none());
    }

    #[test]
    fn email_requires_domain_suffix() {
        assert!(validate_email("a@b").is_some());
        assert!(validate_email("a@b.io").is_none());
    }
}
