//! Validation utilities for the Academia backend

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

/// Longest content type stored for a paper file
pub const MAX_CONTENT_TYPE_LEN: usize = 128;

/// Content type used when the client sends none or an unusable one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// ============================================================================
// Field Validations
// ============================================================================

/// Usernames are ASCII letters, digits, `_`, `.` and `-`
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let valid = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if valid {
        Ok(())
    } else {
        let mut error = ValidationError::new("username_charset");
        error.message = Some("Username may only contain letters, digits, '_', '.' and '-'".into());
        Err(error)
    }
}

/// A stored-file digest is 64 lowercase hex characters (SHA-256)
pub fn is_valid_digest(digest: &str) -> bool {
    digest.len() == 64
        && digest
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

/// Strip any path components from a client-supplied file name
pub fn sanitize_file_name(name: &str) -> String {
    let base: String = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect();
    let base = base.trim();
    if base.is_empty() || base == "." || base == ".." {
        "paper".to_string()
    } else {
        base.chars().take(256).collect()
    }
}

/// Content type to store for an uploaded file. Missing, overlong or
/// non-printable values fall back to [`DEFAULT_CONTENT_TYPE`].
pub fn normalize_content_type(content_type: Option<&str>) -> String {
    match content_type.map(str::trim) {
        Some(ct)
            if !ct.is_empty()
                && ct.len() <= MAX_CONTENT_TYPE_LEN
                && ct.chars().all(|c| c.is_ascii_graphic() || c == ' ') =>
        {
            ct.to_string()
        }
        _ => DEFAULT_CONTENT_TYPE.to_string(),
    }
}

/// Deserialize a field where absent, `null` and a value are all distinct.
/// Use with `#[serde(default, deserialize_with = "double_option")]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ============================================================================
// Error Reporting
// ============================================================================

/// Flatten validator errors into `{field: [message, ...]}`.
/// Nested structs are reported with dotted field paths.
pub fn field_errors(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    let mut out = BTreeMap::new();
    collect_errors(errors, None, &mut out);
    out
}

fn collect_errors(
    errors: &ValidationErrors,
    prefix: Option<&str>,
    out: &mut BTreeMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(p) => format!("{}.{}", p, field),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                out.entry(path)
                    .or_default()
                    .extend(list.iter().map(describe));
            }
            ValidationErrorsKind::Struct(inner) => collect_errors(inner, Some(&path), out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_errors(inner, Some(&format!("{}[{}]", path, index)), out);
                }
            }
        }
    }
}

fn describe(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }
    match error.code.as_ref() {
        "length" => {
            let min = error.params.get("min").map(|v| v.to_string());
            let max = error.params.get("max").map(|v| v.to_string());
            match (min, max) {
                (Some(min), Some(max)) => format!("Length must be between {} and {}", min, max),
                (Some(min), None) => format!("Length must be at least {}", min),
                (None, Some(max)) => format!("Length must be at most {}", max),
                (None, None) => "Invalid length".to_string(),
            }
        }
        "email" => "Invalid email address".to_string(),
        "required" => "Missing data for required field".to_string(),
        code => format!("Invalid value ({})", code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_username_charset() {
        assert!(validate_username("test_user").is_ok());
        assert!(validate_username("a.b-c_9").is_ok());
        assert!(validate_username("with space").is_err());
        assert!(validate_username("ünïcode").is_err());
    }

    #[test]
    fn test_digest_format() {
        assert!(is_valid_digest(&"a".repeat(64)));
        assert!(is_valid_digest(
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        ));
        assert!(!is_valid_digest(&"A".repeat(64)));
        assert!(!is_valid_digest(&"a".repeat(63)));
        assert!(!is_valid_digest("../../etc/passwd"));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("paper.pdf"), "paper.pdf");
        assert_eq!(sanitize_file_name("/tmp/x/paper.pdf"), "paper.pdf");
        assert_eq!(sanitize_file_name("C:\\docs\\paper.pdf"), "paper.pdf");
        assert_eq!(sanitize_file_name("a\"b.pdf"), "ab.pdf");
        assert_eq!(sanitize_file_name("a\r\nb.pdf"), "ab.pdf");
        assert_eq!(sanitize_file_name(".."), "paper");
        assert_eq!(sanitize_file_name(""), "paper");
    }

    #[test]
    fn test_content_type_fallback() {
        assert_eq!(normalize_content_type(Some("application/pdf")), "application/pdf");
        assert_eq!(
            normalize_content_type(Some("text/plain; charset=utf-8")),
            "text/plain; charset=utf-8"
        );
        assert_eq!(normalize_content_type(None), DEFAULT_CONTENT_TYPE);
        assert_eq!(normalize_content_type(Some("  ")), DEFAULT_CONTENT_TYPE);

        let long = format!("application/x-custom; {}", "p=v; ".repeat(40));
        assert!(long.len() > MAX_CONTENT_TYPE_LEN);
        assert_eq!(normalize_content_type(Some(&long)), DEFAULT_CONTENT_TYPE);

        let exact = format!("application/{}", "x".repeat(MAX_CONTENT_TYPE_LEN - 12));
        assert_eq!(exact.len(), MAX_CONTENT_TYPE_LEN);
        assert_eq!(normalize_content_type(Some(&exact)), exact);
    }

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 2, max = 4))]
        name: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_field_errors_messages() {
        let sample = Sample {
            name: "x".to_string(),
            email: "bad".to_string(),
        };
        let errors = field_errors(&sample.validate().unwrap_err());
        assert_eq!(errors["name"], vec!["Length must be between 2 and 4"]);
        assert_eq!(errors["email"], vec!["Invalid email address"]);
    }
}
