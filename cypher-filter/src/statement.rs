//! Read statement assembly
//!
//! Builds the complete Cypher read queries a connector issues from compiled
//! filter fragments:
//!
//! ```text
//! MATCH (n:Label) <where> RETURN <projection|n> <order> <skip> <limit>
//! MATCH (n:Label) <where> RETURN count(n) AS count
//! ```
//!
//! Executing them is the driver's job.

use serde::Serialize;

use crate::filter::{CompileOptions, Filter, FilterCompiler, FilterError, ParamMap, Where};
use crate::utils::string::{quote_identifier, upper_first};

/// A query ready for a driver's parameterized `run`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    #[serde(rename = "query")]
    pub text: String,
    pub params: ParamMap,
}

/// Builds read statements for a model with one compiler configuration
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    compiler: FilterCompiler,
}

impl QueryBuilder {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            compiler: FilterCompiler::new(options),
        }
    }

    /// Label for a model name: first character upper-cased, quoted if needed
    pub fn label(model: &str) -> String {
        quote_identifier(&upper_first(model))
    }

    /// `MATCH ... RETURN ...` honouring every part of the filter
    pub fn find(&self, model: &str, filter: &Filter) -> Result<Statement, FilterError> {
        let compiled = self.compiler.compile(filter)?;
        let alias = &self.compiler.options().node_alias;
        let projection = if compiled.projection.is_empty() {
            alias.as_str()
        } else {
            compiled.projection.as_str()
        };

        let text = join_parts(&[
            &self.match_clause(model),
            &compiled.where_clause.text,
            &format!("RETURN {}", projection),
            &compiled.tail(),
        ]);

        tracing::debug!(model, query = %text, "Built find statement");
        Ok(Statement {
            text,
            params: compiled.params(),
        })
    }

    /// `MATCH ... RETURN count(n) AS count`
    pub fn count(&self, model: &str, where_: Option<&Where>) -> Result<Statement, FilterError> {
        let where_clause = self.compiler.compile_where(where_)?;
        let alias = &self.compiler.options().node_alias;

        let text = join_parts(&[
            &self.match_clause(model),
            &where_clause.text,
            &format!("RETURN count({}) AS count", alias),
        ]);

        tracing::debug!(model, query = %text, "Built count statement");
        Ok(Statement {
            text,
            params: where_clause.params,
        })
    }

    fn match_clause(&self, model: &str) -> String {
        format!(
            "MATCH ({}:{})",
            self.compiler.options().node_alias,
            Self::label(model)
        )
    }
}

/// Join non-empty parts with single spaces
fn join_parts(parts: &[&String]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .map(|part| part.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{ParamValue, parse_filter, parse_where};

    #[test]
    fn find_without_filter_returns_whole_node() {
        let statement = QueryBuilder::default().find("user", &Filter::new()).unwrap();
        assert_eq!(statement.text, "MATCH (n:User) RETURN n");
        assert!(statement.params.is_empty());
    }

    #[test]
    fn find_with_full_filter() {
        let filter = parse_filter(
            r#"{
                "where": {"name": "Test", "age": {"gte": 21}},
                "fields": {"name": true, "age": true},
                "order": ["age DESC"],
                "skip": 20,
                "limit": 10
            }"#,
        )
        .unwrap();
        let statement = QueryBuilder::default().find("person", &filter).unwrap();

        assert_eq!(
            statement.text,
            "MATCH (n:Person) WHERE n.name = $name1 AND n.age >= $age1 RETURN n.name, n.age ORDER BY n.age DESC SKIP $skip LIMIT $limit"
        );
        assert_eq!(statement.params.len(), 4);
        assert_eq!(statement.params.get("skip"), Some(&ParamValue::Int(20)));
        assert_eq!(statement.params.get("limit"), Some(&ParamValue::Int(10)));
        assert_eq!(statement.params.get("age1"), Some(&ParamValue::Int(21)));
    }

    #[test]
    fn count_with_where() {
        let where_ = parse_where(r#"{"id": {"inq": [1, 2]}}"#).unwrap();
        let statement = QueryBuilder::default().count("order", Some(&where_)).unwrap();
        assert_eq!(
            statement.text,
            "MATCH (n:Order) WHERE n.id IN $id1 RETURN count(n) AS count"
        );
        assert_eq!(
            statement.params.get("id1"),
            Some(&ParamValue::List(vec![ParamValue::Int(1), ParamValue::Int(2)]))
        );
    }

    #[test]
    fn count_without_where() {
        let statement = QueryBuilder::default().count("order", None).unwrap();
        assert_eq!(statement.text, "MATCH (n:Order) RETURN count(n) AS count");
    }

    #[test]
    fn label_is_quoted_when_needed() {
        assert_eq!(QueryBuilder::label("blogPost"), "BlogPost");
        assert_eq!(QueryBuilder::label("blog post"), "`Blog post`");
    }

    #[test]
    fn custom_alias_flows_through_statement() {
        let builder = QueryBuilder::new(CompileOptions {
            node_alias: "u".to_string(),
            ..CompileOptions::default()
        });
        let statement = builder
            .find("user", &Filter::new().with_where(Where::new().eq("id", 1)))
            .unwrap();
        assert_eq!(statement.text, "MATCH (u:User) WHERE u.id = $id1 RETURN u");
    }

    #[test]
    fn statement_serializes_for_output() {
        let statement = QueryBuilder::default()
            .count("user", Some(&Where::new().eq("name", "a")))
            .unwrap();
        let value = serde_json::to_value(&statement).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "query": "MATCH (n:User) WHERE n.name = $name1 RETURN count(n) AS count",
                "params": {"name1": "a"}
            })
        );
    }

    #[test]
    fn find_keeps_hostile_field_names_inside_properties() {
        let filter = parse_filter(
            r#"{
                "where": {"id = 1 OR true WITH n DETACH DELETE n RETURN n //": 5},
                "fields": {"x DETACH": true}
            }"#,
        )
        .unwrap();
        let statement = QueryBuilder::default().find("user", &filter).unwrap();

        assert_eq!(
            statement.text,
            "MATCH (n:User) WHERE n.`id = 1 OR true WITH n DETACH DELETE n RETURN n //` = \
             $id___1_OR_true_WITH_n_DETACH_DELETE_n_RETURN_n___1 RETURN n.`x DETACH`"
        );
        assert_eq!(statement.params.len(), 1);
    }
}
