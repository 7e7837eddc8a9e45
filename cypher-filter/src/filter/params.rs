//! Query parameters
//!
//! Typed literal values bound to `$name` placeholders, the map that collects
//! them, and the per-compile counter that hands out placeholder names.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;

/// A literal bound to a placeholder.
///
/// Whole numbers become [`ParamValue::Int`] so the store treats them as
/// 64-bit integers rather than floats.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<ParamValue>),
    Map(BTreeMap<String, ParamValue>),
}

impl ParamValue {
    /// Read a value as a number, accepting numeric strings such as `"21"`.
    ///
    /// Returns `None` for anything that does not denote a finite number.
    pub fn numeric(value: &Value) -> Option<Self> {
        match value {
            Value::Number(_) => Some(Self::from(value)),
            Value::String(s) => {
                let s = s.trim();
                if let Ok(i) = s.parse::<i64>() {
                    Some(Self::Int(i))
                } else {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(Self::from_f64)
                }
            }
            _ => None,
        }
    }

    fn from_f64(f: f64) -> Self {
        // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
        if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
            Self::Int(f as i64)
        } else {
            Self::Float(f)
        }
    }
}

impl From<&Value> for ParamValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Null, Self::from_f64),
            },
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from).collect()),
            Value::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<u64> for ParamValue {
    fn from(u: u64) -> Self {
        i64::try_from(u).map_or(Self::Float(u as f64), Self::Int)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

/// Placeholder name to bound value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParamMap {
    values: BTreeMap<String, ParamValue>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Merge another map into this one (other takes precedence on equal names)
    pub fn extend(&mut self, other: ParamMap) {
        self.values.extend(other.values);
    }
}

impl<S: Into<String>> FromIterator<(S, ParamValue)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (S, ParamValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Hands out placeholder names for one top-level compile.
///
/// Each field gets its own 1-based counter (`name1`, `name2`, ...). Names
/// already issued are never handed out again, so a field literally called
/// `name1` cannot collide with the eleventh `name` placeholder.
///
/// Create a fresh counter per compile; reusing one shifts every suffix.
#[derive(Debug, Default)]
pub struct NameCounter {
    counts: HashMap<String, u32>,
    issued: HashSet<String>,
}

impl NameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unused placeholder name for `field`
    pub fn next(&mut self, field: &str) -> String {
        let base = placeholder_base(field);
        let count = self.counts.entry(field.to_string()).or_insert(0);
        loop {
            *count += 1;
            let name = format!("{}{}", base, count);
            if self.issued.insert(name.clone()) {
                return name;
            }
        }
    }

    /// How many names have been issued for `field`
    pub fn count(&self, field: &str) -> u32 {
        self.counts.get(field).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}

/// Field name reduced to characters valid in a Cypher parameter name
fn placeholder_base(field: &str) -> String {
    let base: String = field
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if base.is_empty() {
        "param".to_string()
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_counter_suffixes_per_field() {
        let mut counter = NameCounter::new();
        assert_eq!(counter.next("name"), "name1");
        assert_eq!(counter.next("age"), "age1");
        assert_eq!(counter.next("name"), "name2");
        assert_eq!(counter.count("name"), 2);
        assert_eq!(counter.count("id"), 0);
    }

    #[test]
    fn test_counter_avoids_suffix_collisions() {
        let mut counter = NameCounter::new();
        assert_eq!(counter.next("a1"), "a11");
        for _ in 0..10 {
            counter.next("a");
        }
        // a11 is already taken by the field "a1"
        assert_eq!(counter.next("a"), "a12");
    }

    #[test]
    fn test_counter_sanitizes_field_names() {
        let mut counter = NameCounter::new();
        assert_eq!(counter.next("address.city"), "address_city1");
        assert_eq!(counter.next("address_city"), "address_city2");
        assert_eq!(counter.next(""), "param1");
    }

    #[test]
    fn test_whole_numbers_are_tagged_int() {
        assert_eq!(ParamValue::from(&json!(21)), ParamValue::Int(21));
        assert_eq!(ParamValue::from(&json!(21.0)), ParamValue::Int(21));
        assert_eq!(ParamValue::from(&json!(2.5)), ParamValue::Float(2.5));
        assert_eq!(
            ParamValue::from(&json!([1, "a"])),
            ParamValue::List(vec![ParamValue::Int(1), ParamValue::from("a")])
        );
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(ParamValue::numeric(&json!("42")), Some(ParamValue::Int(42)));
        assert_eq!(
            ParamValue::numeric(&json!(" 1.5 ")),
            Some(ParamValue::Float(1.5))
        );
        assert_eq!(ParamValue::numeric(&json!(7)), Some(ParamValue::Int(7)));
        assert_eq!(ParamValue::numeric(&json!("abc")), None);
        assert_eq!(ParamValue::numeric(&json!(true)), None);
        assert_eq!(ParamValue::numeric(&json!(null)), None);
    }

    #[test]
    fn test_param_map_serializes_as_object() {
        let params: ParamMap = [
            ("name1", ParamValue::from("Test")),
            ("id1", ParamValue::Int(1)),
            ("flag1", ParamValue::Bool(true)),
        ]
        .into_iter()
        .collect();
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value, json!({"name1": "Test", "id1": 1, "flag1": true}));
    }

    #[test]
    fn test_param_map_extend_and_lookup() {
        let mut left = ParamMap::new();
        left.insert("a1", ParamValue::Int(1));
        let mut right = ParamMap::new();
        right.insert("b1", ParamValue::from("x"));
        left.extend(right);

        assert_eq!(left.len(), 2);
        assert!(left.contains("b1"));
        assert_eq!(left.get("a1"), Some(&ParamValue::Int(1)));
        assert_eq!(left.names().collect::<Vec<_>>(), vec!["a1", "b1"]);
    }
}
