//! Cypher filter compiler
//!
//! Compiles declarative filters (field comparisons, AND/OR groups, ordering,
//! paging, projection) into parameterized Cypher fragments plus the values
//! bound to their placeholders.
//!
//! ## Usage
//!
//! ```
//! use cypher_filter::filter::{parse_filter, FilterCompiler};
//!
//! let filter = parse_filter(r#"{"where": {"age": {"gte": 21}}, "limit": 10}"#).unwrap();
//! let compiled = FilterCompiler::default().compile(&filter).unwrap();
//! assert_eq!(compiled.where_clause.text, "WHERE n.age >= $age1");
//! assert_eq!(compiled.tail(), "LIMIT $limit");
//! ```

mod compiler;
mod error;
mod params;
mod parser;
mod types;
mod where_clause;

pub use compiler::{CompileOptions, CompiledFilter, DEFAULT_NODE_ALIAS, FilterCompiler};
pub use error::FilterError;
pub use params::{NameCounter, ParamMap, ParamValue};
pub use parser::{MAX_FILTER_JSON_SIZE, parse_filter, parse_where};
pub use types::{Combinator, Condition, Filter, Group, Leaf, Operator, Where};
pub use where_clause::{CompiledClause, WhereCompiler};
