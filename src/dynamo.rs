//! Helpers for reading and writing raw DynamoDB attribute maps.
//!
//! Scans hand back `HashMap<String, AttributeValue>`; the typed records in `model` are
//! built from these with missing strings defaulting to empty.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;

pub type Item = HashMap<String, AttributeValue>;

pub fn string_attr(item: &Item, key: &str) -> String {
    opt_string_attr(item, key).unwrap_or_default()
}

pub fn opt_string_attr(item: &Item, key: &str) -> Option<String> {
    match item.get(key) {
        Some(AttributeValue::S(value)) => Some(value.clone()),
        _ => None,
    }
}

/// First non-empty string among `keys`; older tables used different attribute names.
pub fn first_string_attr(item: &Item, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| opt_string_attr(item, key))
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

pub fn number_attr(item: &Item, key: &str) -> Option<f64> {
    match item.get(key) {
        Some(AttributeValue::N(value)) => value.parse().ok(),
        _ => None,
    }
}

/// Maps an `{L: [{M: {...}}, ...]}` attribute; entries that are not maps are skipped.
pub fn map_list<T>(attr: Option<&AttributeValue>, parse: impl Fn(&Item) -> T) -> Vec<T> {
    match attr {
        Some(AttributeValue::L(entries)) => entries
            .iter()
            .filter_map(|entry| match entry {
                AttributeValue::M(map) => Some(parse(map)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

pub fn s(value: impl Into<String>) -> AttributeValue {
    AttributeValue::S(value.into())
}

pub fn n(value: impl ToString) -> AttributeValue {
    AttributeValue::N(value.to_string())
}

pub fn opt_n(value: Option<f64>) -> AttributeValue {
    match value {
        Some(v) => n(v),
        None => AttributeValue::Null(true),
    }
}

pub fn list_of_maps(items: Vec<Item>) -> AttributeValue {
    AttributeValue::L(items.into_iter().map(AttributeValue::M).collect())
}

/// Builds an item from `(name, value)` pairs.
pub fn item<const N: usize>(pairs: [(&str, AttributeValue); N]) -> Item {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
