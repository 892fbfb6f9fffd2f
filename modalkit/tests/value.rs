//! Tests for the truthiness policy.

use modalkit::ModalValue;

#[test]
fn test_bool_truthiness() {
    assert!(true.is_open());
    assert!(!false.is_open());
}

#[test]
fn test_none_is_closed() {
    assert!(!None::<String>.is_open());
    assert!(!None::<bool>.is_open());
}

#[test]
fn test_any_payload_is_open() {
    assert!(Some("").is_open());
    assert!(Some(false).is_open());
    assert!(Some(42).is_open());
}

#[test]
fn test_closed_values() {
    assert!(!<bool as ModalValue>::closed());
    assert_eq!(Option::<i32>::closed(), None);
}
