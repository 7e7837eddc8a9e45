//! Filter error type
//!
//! Covers both decoding filter JSON and strict-mode compilation failures.

use thiserror::Error;

/// Errors produced while decoding or compiling a filter
#[derive(Error, Debug)]
pub enum FilterError {
    /// Filter JSON exceeded the accepted input size
    #[error("Filter JSON exceeds maximum size of {max} bytes")]
    TooLarge { max: usize },

    /// Filter text was not valid JSON, or did not match the filter shape
    #[error("Invalid filter JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Structurally invalid filter (e.g. `or` holding something other than an array)
    #[error("Invalid filter: {0}")]
    Invalid(String),

    /// Operator key not in the supported set
    #[error("Unsupported operator '{operator}' on field '{field}'")]
    UnsupportedOperator { field: String, operator: String },

    /// `inq` / `nin` given something other than an array
    #[error("Operator '{operator}' on field '{field}' expects an array value")]
    ExpectedList { field: String, operator: String },

    /// Scalar operator given an array, object or unusable null
    #[error("Operator '{operator}' on field '{field}' expects a scalar value")]
    ExpectedScalar { field: String, operator: String },

    /// `order` entry that is not `<field>` or `<field> ASC|DESC`
    #[error("Invalid order entry '{entry}': expected '<field> [ASC|DESC]'")]
    InvalidOrder { entry: String },

    /// Range comparison whose value cannot be read as a number
    #[error("Operator '{operator}' on field '{field}' expects a numeric value, got {value}")]
    NotNumeric {
        field: String,
        operator: String,
        value: String,
    },
}

impl FilterError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid(reason.into())
    }

    pub fn unsupported_operator(field: &str, operator: &str) -> Self {
        Self::UnsupportedOperator {
            field: field.to_string(),
            operator: operator.to_string(),
        }
    }

    pub fn expected_list(field: &str, operator: &str) -> Self {
        Self::ExpectedList {
            field: field.to_string(),
            operator: operator.to_string(),
        }
    }

    pub fn expected_scalar(field: &str, operator: &str) -> Self {
        Self::ExpectedScalar {
            field: field.to_string(),
            operator: operator.to_string(),
        }
    }

    pub fn not_numeric(field: &str, operator: &str, value: &serde_json::Value) -> Self {
        Self::NotNumeric {
            field: field.to_string(),
            operator: operator.to_string(),
            value: value.to_string(),
        }
    }

    pub fn invalid_order(entry: &str) -> Self {
        Self::InvalidOrder {
            entry: entry.to_string(),
        }
    }

    /// Whether this error describes a single malformed condition.
    ///
    /// These are the cases lenient compilation drops with a warning instead of failing.
    pub fn is_malformed_condition(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedOperator { .. }
                | Self::ExpectedList { .. }
                | Self::ExpectedScalar { .. }
                | Self::NotNumeric { .. }
                | Self::InvalidOrder { .. }
        )
    }
}
