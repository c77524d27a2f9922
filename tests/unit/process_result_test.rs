//! Tests for drain run counters

use subscription_notify::core::{Counter, ProcessResult};

#[test]
fn test_total_is_sum_regardless_of_order() {
    let mut a = ProcessResult::new();
    a.add_success();
    a.add_fail();
    a.add_skip();
    a.add_fail();

    let mut b = ProcessResult::new();
    b.add_fail();
    b.add_fail();
    b.add_skip();
    b.add_success();

    assert_eq!(a.total(), 4);
    assert_eq!(a.total(), b.total());
    assert_eq!(a.total(), a.success() + a.fail() + a.skipped());
}

#[test]
fn test_modify_value_allows_negative() {
    let mut result = ProcessResult::new();
    result.add_fail();
    result.modify_value(Counter::Fail, -2);
    result.modify_value(Counter::Success, 5);
    assert_eq!(result.fail(), -1);
    assert_eq!(result.success(), 5);
    assert_eq!(result.total(), 4);
}

#[test]
fn test_exceptions_are_ordered() {
    let mut result = ProcessResult::new();
    result.add_exception("first");
    result.add_exception(String::from("second"));
    assert_eq!(result.exceptions(), ["first".to_string(), "second".to_string()]);
}

#[test]
fn test_serializes_for_reporting() {
    let mut result = ProcessResult::new();
    result.add_success();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["success"], 1);
    assert_eq!(json["skipped"], 0);
}
