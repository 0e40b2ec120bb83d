//! Property tests for input validation and pagination

use proptest::prelude::*;
use shared::{
    is_valid_digest, normalize_content_type, sanitize_file_name, validate_username,
    CreateUserInput, Pagination, MAX_CONTENT_TYPE_LEN, MAX_PER_PAGE,
};
use validator::Validate;

// ============================================================================
// Property Test Strategies
// ============================================================================

fn username_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_.-]{1,32}"
}

fn email_strategy() -> impl Strategy<Value = String> {
    "[a-z]{3,10}@[a-z]{3,8}\\.(com|org|net|edu)"
}

fn password_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9!@#$%]{6,40}"
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// Well-formed registrations always validate
    #[test]
    fn test_valid_registration(
        username in username_strategy(),
        email in email_strategy(),
        password in password_strategy(),
    ) {
        let input = CreateUserInput { username, email, password };
        prop_assert!(input.validate().is_ok());
    }

    /// Any character outside the username charset is rejected
    #[test]
    fn test_username_rejects_foreign_chars(
        prefix in "[a-z]{0,8}",
        bad in "[ /@!#\u{e9}\u{4e2d}]",
        suffix in "[a-z]{0,8}",
    ) {
        let username = format!("{}{}{}", prefix, bad, suffix);
        prop_assert!(validate_username(&username).is_err());
    }

    /// Sanitized names never carry path separators, quotes or control chars
    #[test]
    fn test_sanitized_file_name_is_plain(name in any::<String>()) {
        let clean = sanitize_file_name(&name);
        prop_assert!(!clean.is_empty());
        prop_assert!(clean.chars().count() <= 256);
        prop_assert!(!clean.contains(['/', '\\', '"']));
        prop_assert!(!clean.chars().any(char::is_control));
        prop_assert!(clean != "." && clean != "..");
    }

    /// Stored content types always fit the column and are kept when they do
    #[test]
    fn test_content_type_fits_column(content_type in proptest::option::of(any::<String>())) {
        let stored = normalize_content_type(content_type.as_deref());
        prop_assert!(!stored.is_empty());
        prop_assert!(stored.len() <= MAX_CONTENT_TYPE_LEN);
        if let Some(ct) = content_type.as_deref().map(str::trim) {
            let usable = !ct.is_empty()
                && ct.len() <= MAX_CONTENT_TYPE_LEN
                && ct.chars().all(|c| c.is_ascii_graphic() || c == ' ');
            if usable {
                prop_assert_eq!(stored, ct);
            }
        }
    }

    /// Digests are exactly 64 lowercase hex characters
    #[test]
    fn test_digest_format(digest in "[0-9a-f]{64}", other in "[0-9a-zA-Z]{0,70}") {
        prop_assert!(is_valid_digest(&digest));
        let other_is_digest = other.len() == 64
            && other.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        prop_assert_eq!(is_valid_digest(&other), other_is_digest);
    }

    /// Requested pages are clamped into range and offsets never go negative
    #[test]
    fn test_pagination_clamped(page in proptest::option::of(any::<u32>()), per_page in proptest::option::of(any::<u32>())) {
        let pagination = Pagination::from_query(page, per_page);
        prop_assert!(pagination.page >= 1);
        prop_assert!((1..=MAX_PER_PAGE).contains(&pagination.per_page));
        prop_assert!(pagination.offset() >= 0);
        prop_assert_eq!(
            pagination.offset(),
            i64::from(pagination.page - 1) * i64::from(pagination.per_page)
        );
    }
}
