use crate::HttpStatusCode;

#[test]
fn given_status_codes_when_categorized_then_ranges_are_exclusive() {
    assert!(HttpStatusCode(200).is_success());
    assert!(HttpStatusCode(204).is_success());
    assert!(HttpStatusCode(302).is_redirection());
    assert!(!HttpStatusCode(302).is_success());
    assert!(!HttpStatusCode(401).is_success());
    assert!(!HttpStatusCode(401).is_redirection());
    assert!(HttpStatusCode(401).is_unauthorized());
    assert!(!HttpStatusCode(403).is_unauthorized());
}
