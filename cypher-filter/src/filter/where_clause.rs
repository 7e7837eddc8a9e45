//! Where clause compilation
//!
//! Turns a [`Where`] tree into Cypher boolean text with `$name` placeholders
//! and the matching [`ParamMap`]. One [`NameCounter`] is shared by the whole
//! recursion so placeholder names never repeat within a compile.

use serde_json::Value;

use super::error::FilterError;
use super::params::{NameCounter, ParamMap, ParamValue};
use super::types::{Combinator, Condition, Group, Leaf, Operator, Where};
use crate::utils::string::quote_identifier;

/// Clause text plus the parameters its placeholders refer to
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledClause {
    pub text: String,
    pub params: ParamMap,
}

impl CompiledClause {
    pub fn new(text: impl Into<String>, params: ParamMap) -> Self {
        Self {
            text: text.into(),
            params,
        }
    }

    /// Text-only clause with no bound parameters
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, ParamMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Placeholder names bound by this clause
    pub fn bound_names(&self) -> Vec<&str> {
        self.params.names().collect()
    }
}

/// Compiles where trees against a node alias.
///
/// Lenient by default: a malformed leaf is dropped with a warning and the
/// rest of the tree still compiles. With `strict` set the same leaf fails
/// the whole compile instead.
#[derive(Debug, Clone, Copy)]
pub struct WhereCompiler<'a> {
    alias: &'a str,
    strict: bool,
}

/// Compiled group children, each with the joiner that precedes it
#[derive(Default)]
struct GroupParts {
    parts: Vec<(&'static str, String)>,
}

impl GroupParts {
    fn push(&mut self, joiner: &'static str, text: String) {
        self.parts.push((joiner, text));
    }

    /// `(a AND b)`, or `None` when every child compiled to nothing
    fn render(self) -> Option<String> {
        let mut out = String::new();
        for (joiner, text) in self.parts {
            if !out.is_empty() {
                out.push(' ');
                out.push_str(joiner);
                out.push(' ');
            }
            out.push_str(&text);
        }
        (!out.is_empty()).then(|| format!("({})", out))
    }
}

impl<'a> WhereCompiler<'a> {
    pub fn new(alias: &'a str) -> Self {
        Self {
            alias,
            strict: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Compile without the `WHERE` keyword.
    ///
    /// Leaf predicates come first (AND-joined), then the AND group after
    /// ` AND `, then the OR group after ` OR `. Placeholders are numbered in
    /// input order, so text order and numbering can differ.
    pub fn compile(
        &self,
        where_: &Where,
        counter: &mut NameCounter,
    ) -> Result<CompiledClause, FilterError> {
        let mut params = ParamMap::new();
        let mut predicates: Vec<String> = Vec::new();
        let mut and_parts = GroupParts::default();
        let mut or_parts = GroupParts::default();

        for condition in &where_.conditions {
            match condition {
                Condition::Leaf(leaf) => {
                    if let Some(compiled) = self.leaf_or_skip(leaf, counter)? {
                        params.extend(compiled.params);
                        predicates.push(compiled.text);
                    }
                }
                Condition::Group(group) => {
                    let parts = match group.combinator {
                        Combinator::And => &mut and_parts,
                        Combinator::Or => &mut or_parts,
                    };
                    self.compile_group(group, counter, parts, &mut params)?;
                }
            }
        }

        let mut text = predicates.join(" AND ");
        for (combinator, parts) in [(Combinator::And, and_parts), (Combinator::Or, or_parts)] {
            if let Some(group_text) = parts.render() {
                if !text.is_empty() {
                    text.push(' ');
                    text.push_str(combinator.keyword());
                    text.push(' ');
                }
                text.push_str(&group_text);
            }
        }

        Ok(CompiledClause::new(text, params))
    }

    /// Compile group children in order with the shared counter.
    ///
    /// AND children join with `AND`. OR children after the first join with
    /// `XOR` whenever the group has more than one child, so `or: [a, b]`
    /// matches exactly one branch, not either. Existing callers depend on
    /// this output; see DESIGN.md before changing it.
    fn compile_group(
        &self,
        group: &Group,
        counter: &mut NameCounter,
        parts: &mut GroupParts,
        params: &mut ParamMap,
    ) -> Result<(), FilterError> {
        let sibling_count = group.children.len();
        for (index, child) in group.children.iter().enumerate() {
            let compiled = self.compile(child, counter)?;
            params.extend(compiled.params);
            if compiled.text.is_empty() {
                continue;
            }
            let joiner = match group.combinator {
                Combinator::Or if index > 0 && sibling_count > 1 => "XOR",
                combinator => combinator.keyword(),
            };
            parts.push(joiner, compiled.text);
        }
        Ok(())
    }

    fn leaf_or_skip(
        &self,
        leaf: &Leaf,
        counter: &mut NameCounter,
    ) -> Result<Option<CompiledClause>, FilterError> {
        match self.compile_leaf(leaf, counter) {
            Ok(compiled) => Ok(Some(compiled)),
            Err(e) if !self.strict && e.is_malformed_condition() => {
                tracing::warn!(
                    field = %leaf.field,
                    operator = %leaf.operator,
                    error = %e,
                    "Dropping malformed where condition"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Compile one comparison.
    ///
    /// Validation happens before the counter is touched, so a dropped leaf
    /// never consumes a placeholder suffix.
    pub fn compile_leaf(
        &self,
        leaf: &Leaf,
        counter: &mut NameCounter,
    ) -> Result<CompiledClause, FilterError> {
        let field = leaf.field.as_str();
        let op = &leaf.operator;
        let prop = format!("{}.{}", self.alias, quote_identifier(field));
        let value = leaf.value.as_ref().filter(|v| !v.is_null());

        let (template, bound) = match (op, value) {
            (Operator::Eq, None) => return Ok(CompiledClause::text(format!("{} IS NULL", prop))),
            (Operator::Neq, None) => {
                return Ok(CompiledClause::text(format!("{} IS NOT NULL", prop)));
            }
            (Operator::Unsupported(name), _) => {
                return Err(FilterError::unsupported_operator(field, name));
            }
            // null only means something for eq and neq
            (_, None) => return Err(FilterError::expected_scalar(field, op.as_str())),
            (Operator::Eq, Some(v)) => (Template::Infix("="), scalar(field, op, v)?),
            (Operator::Neq, Some(v)) => (Template::Infix("<>"), scalar(field, op, v)?),
            (Operator::Gt, Some(v)) => (Template::Infix(">"), number(field, op, v)?),
            (Operator::Gte, Some(v)) => (Template::Infix(">="), number(field, op, v)?),
            (Operator::Lt, Some(v)) => (Template::Infix("<"), number(field, op, v)?),
            (Operator::Lte, Some(v)) => (Template::Infix("<="), number(field, op, v)?),
            (Operator::Inq, Some(v)) => (Template::Prefixed("", "IN"), list(field, op, v)?),
            (Operator::Nin, Some(v)) => (Template::Prefixed("NOT ", "IN"), list(field, op, v)?),
            (Operator::Like, Some(v)) => {
                (Template::Prefixed("", "CONTAINS"), scalar(field, op, v)?)
            }
            (Operator::Nlike, Some(v)) => {
                (Template::Prefixed("NOT ", "CONTAINS"), scalar(field, op, v)?)
            }
        };

        let name = counter.next(field);
        let text = match template {
            Template::Infix(symbol) => format!("{} {} ${}", prop, symbol, name),
            Template::Prefixed(negation, keyword) => {
                format!("{}{} {} ${}", negation, prop, keyword, name)
            }
        };
        let mut params = ParamMap::new();
        params.insert(name, bound);
        Ok(CompiledClause::new(text, params))
    }
}

enum Template {
    /// `n.field <symbol> $p`
    Infix(&'static str),
    /// `[NOT ]n.field <keyword> $p`
    Prefixed(&'static str, &'static str),
}

fn scalar(field: &str, op: &Operator, value: &Value) -> Result<ParamValue, FilterError> {
    match value {
        Value::Array(_) | Value::Object(_) => Err(FilterError::expected_scalar(field, op.as_str())),
        other => Ok(ParamValue::from(other)),
    }
}

fn number(field: &str, op: &Operator, value: &Value) -> Result<ParamValue, FilterError> {
    ParamValue::numeric(value).ok_or_else(|| FilterError::not_numeric(field, op.as_str(), value))
}

fn list(field: &str, op: &Operator, value: &Value) -> Result<ParamValue, FilterError> {
    match value {
        Value::Array(_) => Ok(ParamValue::from(value)),
        _ => Err(FilterError::expected_list(field, op.as_str())),
    }
}
