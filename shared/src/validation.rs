//! Pure credential validation: email format and the password strength rubric.
//!
//! Stateless by design so the rules are unit-testable without a running core.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::AuthFlow;

/// RFC-lite: enough to catch typos, not a full RFC 5322 parser.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
        .expect("email pattern is a valid regex")
});

pub const STRENGTH_MIN_LENGTH: usize = 8;

const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
}

#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Five-point rubric: length >= 8, uppercase, lowercase, digit, special
/// character. Scores 0-2 are weak, 3-4 medium, 5 strong.
#[must_use]
pub fn password_strength(password: &str) -> PasswordStrength {
    let mut score = 0;
    if password.chars().count() >= STRENGTH_MIN_LENGTH {
        score += 1;
    }
    if password.chars().any(|c| c.is_ascii_uppercase()) {
        score += 1;
    }
    if password.chars().any(|c| c.is_ascii_lowercase()) {
        score += 1;
    }
    if password.chars().any(|c| c.is_ascii_digit()) {
        score += 1;
    }
    if password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        score += 1;
    }

    match score {
        0..=2 => PasswordStrength::Weak,
        3..=4 => PasswordStrength::Medium,
        _ => PasswordStrength::Strong,
    }
}

/// Submit-eligibility for the auth form.
///
/// Login only needs both fields present; sign-up additionally requires a
/// well-formed email, a matching confirmation and a non-weak password.
#[must_use]
pub fn credentials_valid(
    flow: AuthFlow,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> bool {
    match flow {
        AuthFlow::Login => !email.is_empty() && !password.is_empty(),
        AuthFlow::SignUp => {
            !email.is_empty()
                && !password.is_empty()
                && !confirm_password.is_empty()
                && is_valid_email(email)
                && password == confirm_password
                && password_strength(password) != PasswordStrength::Weak
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.domain.co"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("bad@@x"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("user@domain"));
        assert!(!is_valid_email("user@domain.c"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("user@example.com extra"));
    }

    #[test]
    fn all_five_criteria_score_strong() {
        assert_eq!(password_strength("Ab1!aaaa"), PasswordStrength::Strong);
    }

    #[test]
    fn long_lowercase_only_is_weak() {
        // Length and lowercase: two points.
        assert_eq!(password_strength("abcdefgh"), PasswordStrength::Weak);
    }

    #[test]
    fn missing_one_criterion_is_medium() {
        // No special character: four points.
        assert_eq!(password_strength("Abcdef12"), PasswordStrength::Medium);
        // Short but otherwise varied: four points.
        assert_eq!(password_strength("Ab1!abc"), PasswordStrength::Medium);
    }

    #[test]
    fn empty_password_is_weak() {
        assert_eq!(password_strength(""), PasswordStrength::Weak);
    }

    #[test]
    fn login_needs_both_fields() {
        assert!(credentials_valid(AuthFlow::Login, "a@b.co", "pw", ""));
        assert!(!credentials_valid(AuthFlow::Login, "", "pw", ""));
        assert!(!credentials_valid(AuthFlow::Login, "a@b.co", "", ""));
    }

    #[test]
    fn login_does_not_check_email_format() {
        // The original form only gates login on presence; the provider is the
        // authority on whether the account exists.
        assert!(credentials_valid(AuthFlow::Login, "not-an-email", "pw", ""));
    }

    #[test]
    fn sign_up_requires_the_full_rubric() {
        let strong = "Ab1!aaaa";
        assert!(credentials_valid(AuthFlow::SignUp, "a@b.co", strong, strong));
        // Mismatched confirmation.
        assert!(!credentials_valid(AuthFlow::SignUp, "a@b.co", strong, "Ab1!aaab"));
        // Weak password.
        assert!(!credentials_valid(
            AuthFlow::SignUp,
            "a@b.co",
            "abcdefgh",
            "abcdefgh"
        ));
        // Bad email.
        assert!(!credentials_valid(AuthFlow::SignUp, "bad@@x", strong, strong));
        // Missing confirmation.
        assert!(!credentials_valid(AuthFlow::SignUp, "a@b.co", strong, ""));
    }

    proptest! {
        #[test]
        fn login_validity_is_exactly_field_presence(email in ".{0,24}", password in ".{0,24}") {
            prop_assert_eq!(
                credentials_valid(AuthFlow::Login, &email, &password, ""),
                !email.is_empty() && !password.is_empty()
            );
        }

        #[test]
        fn sign_up_validity_implies_match_and_strength(
            email in "[A-Za-z0-9]{1,8}@[a-z]{1,8}\\.[a-z]{2,4}",
            password in ".{0,24}",
            confirm in ".{0,24}",
        ) {
            if credentials_valid(AuthFlow::SignUp, &email, &password, &confirm) {
                prop_assert_eq!(&password, &confirm);
                prop_assert_ne!(password_strength(&password), PasswordStrength::Weak);
            }
        }

        #[test]
        fn strength_never_panics(password in ".{0,64}") {
            let _ = password_strength(&password);
        }
    }
}
