// =============================================================================
// Application Identity
// =============================================================================

/// Application name (binary name, paths and identifiers)
pub const APP_NAME: &str = "cypher-filter";

/// Crate name as it appears in tracing targets
pub const APP_TARGET: &str = "cypher_filter";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".cypher-filter";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "cypher-filter.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "CYPHER_FILTER_CONFIG";

// =============================================================================
// Environment Variables - Logging
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "CYPHER_FILTER_LOG";

// =============================================================================
// Environment Variables - Compiler
// =============================================================================

/// Environment variable for the matched node variable
pub const ENV_NODE_ALIAS: &str = "CYPHER_FILTER_NODE_ALIAS";

/// Environment variable to reject malformed conditions instead of dropping them
pub const ENV_STRICT: &str = "CYPHER_FILTER_STRICT";

/// Environment variable to emit SKIP/LIMIT for an explicit zero
pub const ENV_EXPLICIT_ZERO_PAGING: &str = "CYPHER_FILTER_EXPLICIT_ZERO_PAGING";
