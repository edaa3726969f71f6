use super::*;

#[test]
fn test_empty_allow_list_allows_all() {
    assert!(check_allowed_sender("anyone", &[]));
}

#[test]
fn test_wildcard_allows_all() {
    let list = vec!["*".to_string()];
    assert!(check_allowed_sender("anyone", &list));
    assert!(check_allowed_sender("other_user", &list));
}

#[test]
fn test_exact_match_allowed() {
    let list = vec!["A1B2".to_string(), "C3D4".to_string()];
    assert!(check_allowed_sender("A1B2", &list));
    assert!(check_allowed_sender("C3D4", &list));
}

#[test]
fn test_non_matching_sender_rejected() {
    let list = vec!["A1B2".to_string()];
    assert!(!check_allowed_sender("E5F6", &list));
}

#[test]
fn test_openids_are_case_sensitive() {
    let list = vec!["A1B2".to_string()];
    assert!(!check_allowed_sender("a1b2", &list));
}

#[test]
fn test_no_substring_match() {
    let list = vec!["alice".to_string()];
    assert!(!check_allowed_sender("alice123", &list));
    assert!(!check_allowed_sender("xalice", &list));
}

#[test]
fn test_whitespace_in_allow_list_ignored() {
    let list = vec![" u1 ".to_string()];
    assert!(check_allowed_sender("u1", &list));
}

#[test]
fn test_normalize_strips_control_chars() {
    assert_eq!(normalize_sender_id("u\u{0}1\n"), "u1");
    assert_eq!(normalize_sender_id("  u1  "), "u1");
}
