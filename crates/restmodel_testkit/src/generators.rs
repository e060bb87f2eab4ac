//! Property-based test generators using proptest.

use proptest::prelude::*;
use restmodel_core::Attributes;
use serde_json::Value;

/// Strategy for attribute names. Never produces the default `ID` key.
pub fn attribute_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,11}").expect("Invalid regex")
}

/// Strategy for flat JSON attribute values.
pub fn attribute_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        prop::string::string_regex("[ -~]{0,16}")
            .expect("Invalid regex")
            .prop_map(Value::from),
    ]
}

/// Strategy for attribute bags with up to `max_len` entries.
pub fn attributes_strategy(max_len: usize) -> impl Strategy<Value = Attributes> {
    prop::collection::vec(
        (attribute_name_strategy(), attribute_value_strategy()),
        0..=max_len,
    )
    .prop_map(|pairs| pairs.into_iter().collect())
}

/// Strategy for query-string parameter values, including reserved characters.
pub fn query_value_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 &=?/%+#é]{0,12}").expect("Invalid regex")
}
