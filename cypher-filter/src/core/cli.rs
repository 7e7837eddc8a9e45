use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    APP_NAME, ENV_CONFIG, ENV_EXPLICIT_ZERO_PAGING, ENV_NODE_ALIAS, ENV_STRICT,
};

#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(version, about = "Compile declarative filters into parameterized Cypher", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Variable the matched node is bound to
    #[arg(long, global = true, env = ENV_NODE_ALIAS)]
    pub node_alias: Option<String>,

    /// Fail on malformed conditions instead of dropping them
    #[arg(long, global = true, env = ENV_STRICT)]
    pub strict: Option<bool>,

    /// Emit SKIP/LIMIT for an explicit zero instead of omitting them
    #[arg(long, global = true, env = ENV_EXPLICIT_ZERO_PAGING)]
    pub explicit_zero_paging: Option<bool>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Print the find query (MATCH ... RETURN ...) for a model and filter
    Find {
        /// Model name; its first letter is upper-cased to form the label
        #[arg(long, short = 'm')]
        model: String,

        /// Filter JSON (where, order, skip, limit, fields)
        #[arg(long, conflicts_with = "filter_file")]
        filter: Option<String>,

        /// Read the filter JSON from a file
        #[arg(long, short = 'f')]
        filter_file: Option<PathBuf>,
    },
    /// Print the count query (MATCH ... RETURN count(n)) for a model and where object
    Count {
        /// Model name; its first letter is upper-cased to form the label
        #[arg(long, short = 'm')]
        model: String,

        /// Where JSON
        #[arg(long = "where", id = "where_json", conflicts_with = "where_file")]
        where_json: Option<String>,

        /// Read the where JSON from a file
        #[arg(long, short = 'f')]
        where_file: Option<PathBuf>,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub node_alias: Option<String>,
    pub strict: Option<bool>,
    pub explicit_zero_paging: Option<bool>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        node_alias: cli.node_alias,
        strict: cli.strict,
        explicit_zero_paging: cli.explicit_zero_paging,
    };
    (config, cli.command)
}
