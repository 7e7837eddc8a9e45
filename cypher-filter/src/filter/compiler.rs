//! Filter compilation
//!
//! Compiles a whole [`Filter`]: the where clause (via [`WhereCompiler`]),
//! `ORDER BY`, `SKIP`, `LIMIT` and the `RETURN` projection. Each fragment is
//! independent of the others.

use super::error::FilterError;
use super::params::{NameCounter, ParamMap, ParamValue};
use super::types::{Filter, Where};
use super::where_clause::{CompiledClause, WhereCompiler};
use crate::utils::string::quote_identifier;

/// Default variable the matched node is bound to
pub const DEFAULT_NODE_ALIAS: &str = "n";

/// Compiler behaviour switches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Variable the matched node is bound to (`n` in `MATCH (n:User)`)
    pub node_alias: String,
    /// Fail on malformed conditions instead of dropping them
    pub strict: bool,
    /// Emit `SKIP`/`LIMIT` for an explicit zero instead of treating it as absent
    pub explicit_zero_paging: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            node_alias: DEFAULT_NODE_ALIAS.to_string(),
            strict: false,
            explicit_zero_paging: false,
        }
    }
}

/// Every fragment of a compiled filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledFilter {
    /// `WHERE ...`, or empty
    pub where_clause: CompiledClause,
    /// `ORDER BY ...`, or empty
    pub order_clause: CompiledClause,
    /// `SKIP $skip`, or empty
    pub skip_clause: CompiledClause,
    /// `LIMIT $limit`, or empty
    pub limit_clause: CompiledClause,
    /// `n.a, n.b`, or empty when every field should be returned
    pub projection: String,
}

impl CompiledFilter {
    /// Order, skip and limit joined with single spaces, empty ones left out
    pub fn tail(&self) -> String {
        [&self.order_clause, &self.skip_clause, &self.limit_clause]
            .into_iter()
            .filter(|clause| !clause.is_empty())
            .map(|clause| clause.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// All parameters of all fragments
    pub fn params(&self) -> ParamMap {
        let mut params = self.where_clause.params.clone();
        for clause in [&self.order_clause, &self.skip_clause, &self.limit_clause] {
            params.extend(clause.params.clone());
        }
        params
    }
}

/// Compiles filters with a fixed set of options.
///
/// Holds no mutable state; every call builds its own [`NameCounter`], so one
/// compiler can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct FilterCompiler {
    options: CompileOptions,
}

impl FilterCompiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn compile(&self, filter: &Filter) -> Result<CompiledFilter, FilterError> {
        let compiled = CompiledFilter {
            where_clause: self.compile_where(filter.where_.as_ref())?,
            order_clause: self.compile_order(&filter.order)?,
            skip_clause: self.compile_paging("SKIP", "skip", filter.skip),
            limit_clause: self.compile_paging("LIMIT", "limit", filter.limit),
            projection: self.compile_projection(&filter.fields),
        };

        tracing::trace!(
            where_clause = %compiled.where_clause.text,
            tail = %compiled.tail(),
            projection = %compiled.projection,
            "Compiled filter"
        );

        Ok(compiled)
    }

    /// Compile a top-level where object, prefixed with `WHERE ` unless empty
    pub fn compile_where(&self, where_: Option<&Where>) -> Result<CompiledClause, FilterError> {
        let Some(where_) = where_ else {
            return Ok(CompiledClause::default());
        };

        let mut counter = NameCounter::new();
        let compiled = WhereCompiler::new(&self.options.node_alias)
            .strict(self.options.strict)
            .compile(where_, &mut counter)?;

        if compiled.is_empty() {
            return Ok(compiled);
        }
        Ok(CompiledClause::new(
            format!("WHERE {}", compiled.text),
            compiled.params,
        ))
    }

    /// `ORDER BY n.name ASC, n.id DESC`.
    ///
    /// Each entry is a field name, optionally followed by `ASC` or `DESC` in
    /// any case. The field is quoted like a where key; anything else after it
    /// makes the entry malformed.
    pub fn compile_order(&self, order: &[String]) -> Result<CompiledClause, FilterError> {
        let mut entries = Vec::with_capacity(order.len());
        for entry in order {
            match self.order_entry(entry) {
                Ok(compiled) => entries.push(compiled),
                Err(e) if !self.options.strict => {
                    tracing::warn!(entry = %entry, error = %e, "Dropping malformed order entry");
                }
                Err(e) => return Err(e),
            }
        }
        if entries.is_empty() {
            return Ok(CompiledClause::default());
        }
        Ok(CompiledClause::text(format!(
            "ORDER BY {}",
            entries.join(", ")
        )))
    }

    fn order_entry(&self, entry: &str) -> Result<String, FilterError> {
        let trimmed = entry.trim();
        let (field, direction) = match trimmed.split_once(char::is_whitespace) {
            Some((field, direction)) => (field, direction.trim()),
            None => (trimmed, ""),
        };
        let known_direction = ["ASC", "DESC"]
            .iter()
            .any(|known| direction.eq_ignore_ascii_case(known));
        if field.is_empty() || !(direction.is_empty() || known_direction) {
            return Err(FilterError::invalid_order(entry));
        }

        let prop = format!("{}.{}", self.options.node_alias, quote_identifier(field));
        if direction.is_empty() {
            Ok(prop)
        } else {
            Ok(format!("{} {}", prop, direction))
        }
    }

    /// `SKIP $skip` / `LIMIT $limit`.
    ///
    /// Zero counts as absent unless `explicit_zero_paging` is set.
    fn compile_paging(&self, keyword: &str, name: &str, value: Option<u64>) -> CompiledClause {
        match value {
            Some(0) if !self.options.explicit_zero_paging => CompiledClause::default(),
            Some(value) => {
                let mut params = ParamMap::new();
                params.insert(name, ParamValue::from(value));
                CompiledClause::new(format!("{} ${}", keyword, name), params)
            }
            None => CompiledClause::default(),
        }
    }

    /// `n.age, n.name`; names that are not plain identifiers are backtick-quoted
    pub fn compile_projection(&self, fields: &[String]) -> String {
        fields
            .iter()
            .map(|field| format!("{}.{}", self.options.node_alias, quote_identifier(field)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter(value: serde_json::Value) -> Filter {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn order_skip_limit() {
        let compiled = FilterCompiler::default()
            .compile(&filter(json!({
                "limit": 1,
                "skip": 1,
                "order": ["name ASC", "id DESC"]
            })))
            .unwrap();

        assert_eq!(
            compiled.tail(),
            "ORDER BY n.name ASC, n.id DESC SKIP $skip LIMIT $limit"
        );
        assert_eq!(compiled.skip_clause.params.get("skip"), Some(&ParamValue::Int(1)));
        assert_eq!(compiled.limit_clause.params.get("limit"), Some(&ParamValue::Int(1)));
        assert!(compiled.order_clause.params.is_empty());
    }

    #[test]
    fn projection_keeps_field_order() {
        let compiled = FilterCompiler::default()
            .compile(&filter(json!({"fields": {"age": true, "name": true}})))
            .unwrap();
        assert_eq!(compiled.projection, "n.age, n.name");
    }

    #[test]
    fn projection_empty_when_nothing_selected() {
        let compiled = FilterCompiler::default()
            .compile(&filter(json!({"fields": {"age": false}})))
            .unwrap();
        assert_eq!(compiled.projection, "");
    }

    #[test]
    fn where_clause_gets_single_prefix() {
        let compiled = FilterCompiler::default()
            .compile(&filter(json!({
                "where": {
                    "name": "Test",
                    "age": null,
                    "or": [{"name": {"inq": ["Test"]}}, {"id": {"gte": 1}}],
                    "and": [{"name": {"like": "T"}}, {"age": {"lte": 21}}]
                }
            })))
            .unwrap();

        assert_eq!(
            compiled.where_clause.text,
            "WHERE n.name = $name1 AND n.age IS NULL AND (n.name CONTAINS $name3 AND n.age <= $age1) OR (n.name IN $name2 XOR n.id >= $id1)"
        );
        assert_eq!(compiled.where_clause.text.matches("WHERE").count(), 1);
        assert_eq!(
            compiled.where_clause.bound_names(),
            vec!["age1", "id1", "name1", "name2", "name3"]
        );
    }

    #[test]
    fn empty_filter_compiles_to_empty_fragments() {
        let compiled = FilterCompiler::default().compile(&Filter::new()).unwrap();
        assert_eq!(compiled, CompiledFilter::default());
        assert_eq!(compiled.tail(), "");
        assert!(compiled.params().is_empty());
    }

    #[test]
    fn empty_where_object_has_no_prefix() {
        let compiled = FilterCompiler::default()
            .compile(&filter(json!({"where": {}})))
            .unwrap();
        assert!(compiled.where_clause.is_empty());
    }

    #[test]
    fn zero_skip_and_limit_are_absent_by_default() {
        let compiled = FilterCompiler::default()
            .compile(&Filter::new().skip(0).limit(0))
            .unwrap();
        assert_eq!(compiled.tail(), "");
        assert!(compiled.params().is_empty());
    }

    #[test]
    fn explicit_zero_paging_emits_zero() {
        let compiler = FilterCompiler::new(CompileOptions {
            explicit_zero_paging: true,
            ..CompileOptions::default()
        });
        let compiled = compiler.compile(&Filter::new().skip(0).limit(10)).unwrap();
        assert_eq!(compiled.tail(), "SKIP $skip LIMIT $limit");
        assert_eq!(compiled.params().get("skip"), Some(&ParamValue::Int(0)));
        assert_eq!(compiled.params().get("limit"), Some(&ParamValue::Int(10)));
    }

    #[test]
    fn params_merges_all_fragments() {
        let compiled = FilterCompiler::default()
            .compile(
                &Filter::new()
                    .with_where(Where::new().eq("name", "a"))
                    .skip(5)
                    .limit(10),
            )
            .unwrap();
        let params = compiled.params();
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["limit", "name1", "skip"]);
    }

    #[test]
    fn compiles_are_idempotent() {
        let input = filter(json!({
            "where": {"age": {"gte": 1}, "or": [{"age": {"lt": 5}}, {"name": "x"}]},
            "order": "age DESC",
            "limit": 3
        }));
        let compiler = FilterCompiler::default();
        let first = compiler.compile(&input).unwrap();
        let second = compiler.compile(&input).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn fragments_do_not_depend_on_each_other() {
        let compiler = FilterCompiler::default();
        let full = compiler
            .compile(&filter(json!({
                "where": {"skip": 1, "limit": 2},
                "order": ["name ASC"],
                "skip": 3,
                "limit": 4,
                "fields": ["name"]
            })))
            .unwrap();

        assert_eq!(
            full.order_clause,
            compiler.compile_order(&["name ASC".to_string()]).unwrap()
        );
        assert_eq!(full.projection, compiler.compile_projection(&["name".to_string()]));
        assert_eq!(
            full.where_clause.text,
            "WHERE n.skip = $skip1 AND n.limit = $limit1"
        );
        assert_eq!(full.params().len(), 4);
    }

    #[test]
    fn node_alias_applies_everywhere() {
        let compiler = FilterCompiler::new(CompileOptions {
            node_alias: "u".to_string(),
            ..CompileOptions::default()
        });
        let compiled = compiler
            .compile(
                &Filter::new()
                    .with_where(Where::new().eq("id", 1))
                    .order_by("id ASC")
                    .field("id"),
            )
            .unwrap();
        assert_eq!(compiled.where_clause.text, "WHERE u.id = $id1");
        assert_eq!(compiled.order_clause.text, "ORDER BY u.id ASC");
        assert_eq!(compiled.projection, "u.id");
    }

    #[test]
    fn strict_option_reaches_where_compiler() {
        let compiler = FilterCompiler::new(CompileOptions {
            strict: true,
            ..CompileOptions::default()
        });
        let result = compiler.compile(&filter(json!({"where": {"id": {"inq": 1}}})));
        assert!(matches!(result, Err(FilterError::ExpectedList { .. })));
    }

    #[test]
    fn compiler_is_shareable_across_threads() {
        let compiler = std::sync::Arc::new(FilterCompiler::default());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let compiler = compiler.clone();
                std::thread::spawn(move || {
                    compiler
                        .compile(&Filter::new().with_where(Where::new().eq("id", i)))
                        .unwrap()
                        .where_clause
                        .text
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "WHERE n.id = $id1");
        }
    }

    #[test]
    fn projection_and_order_quote_field_names() {
        let compiled = FilterCompiler::default()
            .compile(&filter(json!({
                "order": ["`odd` desc", "id ASC"],
                "fields": {"x DETACH": true, "id": true}
            })))
            .unwrap();
        assert_eq!(compiled.projection, "n.`x DETACH`, n.id");
        assert_eq!(
            compiled.order_clause.text,
            "ORDER BY n.```odd``` desc, n.id ASC"
        );
    }

    #[test]
    fn malformed_order_entries_are_dropped_or_rejected() {
        let input = filter(json!({
            "order": ["name ASC DETACH DELETE n", "", "created at", "id DESC"]
        }));

        let compiled = FilterCompiler::default().compile(&input).unwrap();
        assert_eq!(compiled.order_clause.text, "ORDER BY n.id DESC");

        let strict = FilterCompiler::new(CompileOptions {
            strict: true,
            ..CompileOptions::default()
        });
        assert!(matches!(
            strict.compile(&input),
            Err(FilterError::InvalidOrder { ref entry }) if entry == "name ASC DETACH DELETE n"
        ));
    }

    #[test]
    fn all_dropped_order_entries_leave_no_clause() {
        let compiled = FilterCompiler::default()
            .compile(&filter(json!({"order": "name sideways"})))
            .unwrap();
        assert!(compiled.order_clause.is_empty());
        assert_eq!(compiled.tail(), "");
    }
}
