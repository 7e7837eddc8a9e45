//! Filter type definitions
//!
//! The typed model of a filter: a [`Where`] tree of leaf comparisons and
//! AND/OR groups, plus ordering, paging and field projection.
//!
//! A where object is decoded from JSON in key order (`serde_json` is built
//! with `preserve_order`), which decides how placeholders are numbered.

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::error::FilterError;

/// Comparison applied by a leaf condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Inq,
    Nin,
    Like,
    Nlike,
    /// Any operator key outside the supported set
    Unsupported(String),
}

impl Operator {
    pub fn parse(key: &str) -> Self {
        match key {
            "eq" => Self::Eq,
            "neq" => Self::Neq,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "inq" => Self::Inq,
            "nin" => Self::Nin,
            "like" => Self::Like,
            "nlike" => Self::Nlike,
            other => Self::Unsupported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Inq => "inq",
            Self::Nin => "nin",
            Self::Like => "like",
            Self::Nlike => "nlike",
            Self::Unsupported(name) => name,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field comparison.
///
/// `value: None` and `Some(Value::Null)` both mean "is null".
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub field: String,
    pub operator: Operator,
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// `and: [...]` / `or: [...]`; each child is a where object of its own
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub combinator: Combinator,
    pub children: Vec<Where>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Leaf(Leaf),
    Group(Group),
}

/// A where object: conditions in input order, implicitly AND-ed
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct Where {
    pub conditions: Vec<Condition>,
}

impl Where {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// `field = value`
    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.leaf(field, Operator::Eq, value)
    }

    /// `field IS NULL`
    pub fn is_null(mut self, field: &str) -> Self {
        self.conditions.push(Condition::Leaf(Leaf {
            field: field.to_string(),
            operator: Operator::Eq,
            value: None,
        }));
        self
    }

    pub fn leaf(mut self, field: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Leaf(Leaf {
            field: field.to_string(),
            operator,
            value: Some(value.into()),
        }));
        self
    }

    pub fn and(self, children: impl IntoIterator<Item = Where>) -> Self {
        self.group(Combinator::And, children)
    }

    pub fn or(self, children: impl IntoIterator<Item = Where>) -> Self {
        self.group(Combinator::Or, children)
    }

    /// A where object holds at most one group per combinator, so repeated calls append
    fn group(mut self, combinator: Combinator, children: impl IntoIterator<Item = Where>) -> Self {
        let existing = self.conditions.iter_mut().find_map(|condition| match condition {
            Condition::Group(group) if group.combinator == combinator => Some(group),
            _ => None,
        });
        if let Some(group) = existing {
            group.children.extend(children);
            return self;
        }
        self.conditions.push(Condition::Group(Group {
            combinator,
            children: children.into_iter().collect(),
        }));
        self
    }

    fn from_object(map: &Map<String, Value>) -> Result<Self, FilterError> {
        let mut conditions = Vec::with_capacity(map.len());
        for (key, value) in map {
            let condition = match key.as_str() {
                "and" => Condition::Group(Self::parse_group(Combinator::And, key, value)?),
                "or" => Condition::Group(Self::parse_group(Combinator::Or, key, value)?),
                field => Condition::Leaf(Self::parse_leaf(field, value)),
            };
            conditions.push(condition);
        }
        Ok(Self { conditions })
    }

    fn parse_group(
        combinator: Combinator,
        key: &str,
        value: &Value,
    ) -> Result<Group, FilterError> {
        let Value::Array(items) = value else {
            return Err(FilterError::invalid(format!(
                "'{}' expects an array of where objects",
                key
            )));
        };
        let children = items
            .iter()
            .map(|item| match item {
                Value::Object(map) => Self::from_object(map),
                _ => Err(FilterError::invalid(format!(
                    "'{}' entries must be objects, got {}",
                    key, item
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Group {
            combinator,
            children,
        })
    }

    /// `{field: scalar}` is equality; `{field: {op: value}}` uses the first key as operator
    fn parse_leaf(field: &str, value: &Value) -> Leaf {
        let (operator, value) = match value {
            Value::Object(ops) => {
                if ops.len() > 1 {
                    tracing::debug!(
                        field,
                        ignored = ops.len() - 1,
                        "Only the first operator of a condition is used"
                    );
                }
                match ops.iter().next() {
                    Some((op, operand)) => (Operator::parse(op), Some(operand.clone())),
                    None => (Operator::Unsupported(String::new()), None),
                }
            }
            other => (Operator::Eq, Some(other.clone())),
        };
        Leaf {
            field: field.to_string(),
            operator,
            value,
        }
    }
}

impl TryFrom<Value> for Where {
    type Error = FilterError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(map) => Self::from_object(&map),
            other => Err(FilterError::invalid(format!(
                "where must be an object, got {}",
                other
            ))),
        }
    }
}

/// The full query description
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Filter {
    #[serde(rename = "where", default)]
    pub where_: Option<Where>,
    /// Raw `"field DIRECTION"` entries, passed through verbatim
    #[serde(default, deserialize_with = "de::order")]
    pub order: Vec<String>,
    #[serde(default)]
    pub skip: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
    /// Projected field names, in input order
    #[serde(default, deserialize_with = "de::fields")]
    pub fields: Vec<String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_where(mut self, where_: Where) -> Self {
        self.where_ = Some(where_);
        self
    }

    pub fn order_by(mut self, entry: &str) -> Self {
        self.order.push(entry.to_string());
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn field(mut self, name: &str) -> Self {
        self.fields.push(name.to_string());
        self
    }
}

/// Lenient decoders for the loosely typed parts of a filter
mod de {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// `"name ASC"` or `["name ASC", "id DESC"]`
    pub fn order<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Vec::new()),
            Value::String(entry) => Ok(vec![entry]),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(entry) => Ok(entry),
                    other => Err(D::Error::custom(format!(
                        "order entries must be strings, got {}",
                        other
                    ))),
                })
                .collect(),
            other => Err(D::Error::custom(format!(
                "order must be a string or an array of strings, got {}",
                other
            ))),
        }
    }

    /// `{"age": true, "name": true}` (truthy keys kept) or `["age", "name"]`
    pub fn fields<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Vec::new()),
            Value::Object(map) => Ok(map
                .into_iter()
                .filter(|(_, selected)| is_truthy(selected))
                .map(|(name, _)| name)
                .collect()),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(name) => Ok(name),
                    other => Err(D::Error::custom(format!(
                        "fields entries must be strings, got {}",
                        other
                    ))),
                })
                .collect(),
            other => Err(D::Error::custom(format!(
                "fields must be an object or an array, got {}",
                other
            ))),
        }
    }

    fn is_truthy(value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }
}
