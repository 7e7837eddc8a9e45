//! Filter parsing
//!
//! Parses JSON filter and where definitions into typed structs.

use super::error::FilterError;
use super::types::{Filter, Where};

/// Maximum size of filter JSON in bytes (64KB)
pub const MAX_FILTER_JSON_SIZE: usize = 64 * 1024;

/// Parse a full filter (`where`, `order`, `skip`, `limit`, `fields`)
pub fn parse_filter(json_str: &str) -> Result<Filter, FilterError> {
    check_size(json_str)?;
    let filter: Filter = serde_json::from_str(json_str)?;
    tracing::trace!(filter = ?filter, "Parsed filter");
    Ok(filter)
}

/// Parse a bare where object, as used by count queries
pub fn parse_where(json_str: &str) -> Result<Where, FilterError> {
    check_size(json_str)?;
    let where_: Where = serde_json::from_str(json_str)?;
    tracing::trace!(where_ = ?where_, "Parsed where");
    Ok(where_)
}

fn check_size(json_str: &str) -> Result<(), FilterError> {
    if json_str.len() > MAX_FILTER_JSON_SIZE {
        return Err(FilterError::TooLarge {
            max: MAX_FILTER_JSON_SIZE,
        });
    }
    Ok(())
}
