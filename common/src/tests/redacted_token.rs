use crate::RedactedToken;

/// **VALUE**: Ensures a bearer token never leaks through `{:?}` or `{}`.
///
/// **WHY THIS MATTERS**: The clients log request descriptors and errors at debug level.
/// A token showing up in the log file is a credential leak.
///
/// **BUG THIS CATCHES**: Would catch a derived `Debug` replacing the manual impl.
#[test]
fn given_token_when_formatted_then_value_is_redacted() {
    // GIVEN: A token with a recognizable value
    let token = RedactedToken::new("super-secret-access-token");

    // WHEN: Formatting with Debug and Display
    let debug = format!("{token:?}");
    let display = format!("{token}");

    // THEN: Neither exposes the value
    assert!(!debug.contains("super-secret"));
    assert!(!display.contains("super-secret"));
    assert_eq!(token.len(), "super-secret-access-token".len());
}

#[test]
fn given_token_when_bearer_called_then_builds_authorization_value() {
    let token = RedactedToken::new("abc123");

    assert_eq!(token.bearer(), "Bearer abc123");
    assert_eq!(token.expose(), "abc123");
}

#[test]
fn given_token_when_serialized_then_refuses() {
    let token = RedactedToken::new("abc123");

    let result = serde_json::to_string(&token);

    assert!(result.is_err(), "Serialization must be refused");
}

#[test]
fn given_whitespace_token_when_checked_then_is_empty() {
    assert!(RedactedToken::new("   ").is_empty());
    assert!(!RedactedToken::new("x").is_empty());
}
