//! Core application

use anyhow::{Context, Result};

use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_TARGET, ENV_LOG};
use crate::filter::{Filter, Where, parse_filter, parse_where};
use crate::statement::{QueryBuilder, Statement};
use crate::utils::file::read_json_file;

pub struct CoreApp {
    pub config: AppConfig,
    pub builder: QueryBuilder,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(&cli_config)?;
        let statement = app.execute(command)?;

        let output =
            serde_json::to_string_pretty(&statement).context("Failed to serialize statement")?;
        println!("{}", output);
        Ok(())
    }

    pub fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let builder = QueryBuilder::new(config.compiler.clone());
        Ok(Self { config, builder })
    }

    /// Build the statement a command asks for
    pub fn execute(&self, command: Commands) -> Result<Statement> {
        match command {
            Commands::Find {
                model,
                filter,
                filter_file,
            } => {
                let filter = match read_input(filter, filter_file)? {
                    Some(json) => parse_filter(&json).context("Failed to parse filter")?,
                    None => Filter::default(),
                };
                self.builder
                    .find(&model, &filter)
                    .context("Failed to compile filter")
            }
            Commands::Count {
                model,
                where_json,
                where_file,
            } => {
                let where_: Option<Where> = read_input(where_json, where_file)?
                    .map(|json| parse_where(&json))
                    .transpose()
                    .context("Failed to parse where")?;
                self.builder
                    .count(&model, where_.as_ref())
                    .context("Failed to compile where")
            }
        }
    }

    fn init_logging() {
        let default_filter = format!("warn,{}=warn", APP_TARGET);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        // stdout carries the statement JSON
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}

/// Inline JSON wins; otherwise read the file, if any
fn read_input(
    inline: Option<String>,
    file: Option<std::path::PathBuf>,
) -> Result<Option<String>> {
    match (inline, file) {
        (Some(json), _) => Ok(Some(json)),
        (None, Some(path)) => read_json_file(&path).map(Some),
        (None, None) => Ok(None),
    }
}
