use super::*;
use proptest::prelude::*;
use std::cmp::Ordering;

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1.0e9..1.0e9f64).prop_map(Value::Float),
        "[a-z]{0,6}".prop_map(Value::Text),
    ]
}

#[test]
fn null_is_unknown_in_comparisons() {
    assert_eq!(sql_eq(&Value::Null, &Value::Null), None);
    assert_eq!(sql_cmp(&Value::Int(1), &Value::Null), None);
    assert!(group_eq(&Value::Null, &Value::Null));
}

#[test]
fn integers_and_floats_compare_numerically() {
    assert_eq!(sql_cmp(&Value::Int(2), &Value::Float(2.5)), Some(Ordering::Less));
    assert_eq!(sql_eq(&Value::Int(3), &Value::Float(3.0)), Some(true));
}

#[test]
fn enum_values_compare_as_text() {
    let admin = Value::Enum("ADMIN".to_string());

    assert_eq!(sql_eq(&admin, &Value::from("ADMIN")), Some(true));
    assert_eq!(admin.as_text(), Some("ADMIN"));
    assert_eq!(admin.expr_type(), ExprType::Text);
}

#[test]
fn incomparable_families_are_unknown() {
    assert_eq!(sql_cmp(&Value::from("10"), &Value::Int(10)), None);
    assert!(!group_eq(&Value::from("10"), &Value::Int(10)));
}

#[test]
fn conversions_widen_and_map_none_to_null() {
    assert_eq!(Value::from(7_u8), Value::Int(7));
    assert_eq!(Value::from(Some("x")), Value::Text("x".to_string()));
    assert_eq!(Value::from(None::<i32>), Value::Null);
    assert_eq!(Value::Int(4).as_f64(), Some(4.0));
}

#[test]
fn to_text_renders_scalars() {
    assert_eq!(Value::Int(10).to_text().as_deref(), Some("10"));
    assert_eq!(Value::Bool(true).to_text().as_deref(), Some("true"));
    assert_eq!(Value::Null.to_text(), None);
    assert_eq!(Value::Null.to_string(), "NULL");
}

proptest! {
    #[test]
    fn sort_cmp_is_antisymmetric(a in arb_value(), b in arb_value(), nulls_first in any::<bool>()) {
        prop_assert_eq!(sort_cmp(&a, &b, nulls_first), sort_cmp(&b, &a, nulls_first).reverse());
    }

    #[test]
    fn nulls_land_at_the_requested_end(v in arb_value()) {
        prop_assume!(!v.is_null());
        prop_assert_eq!(sort_cmp(&Value::Null, &v, true), Ordering::Less);
        prop_assert_eq!(sort_cmp(&Value::Null, &v, false), Ordering::Greater);
    }

    #[test]
    fn group_eq_is_reflexive(v in arb_value()) {
        prop_assert!(group_eq(&v, &v));
    }
}
