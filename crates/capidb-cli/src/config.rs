//! Configuration file handling

use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::args::{OutputFormat, SchemaArgs};

pub const CONFIG_FILE_NAME: &str = "capidb.toml";

/// A declaration file to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaFile {
    pub path: PathBuf,
    /// Found under `schema_dir` rather than named directly; such files are
    /// skipped unless they carry the table declaration version
    pub discovered: bool,
}

impl SchemaFile {
    pub fn named(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            discovered: false,
        }
    }
}

/// Configuration for capidb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Declaration file paths
    #[serde(default)]
    pub schema: Vec<String>,

    /// Directory searched for `*.json` and `*.toml` declarations
    pub schema_dir: Option<String>,

    /// SQL dialect (currently only "postgresql" is supported)
    #[serde(default)]
    pub dialect: Option<String>,

    /// Output format (human, json)
    #[serde(default)]
    pub format: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).into_diagnostic()?;
        let config: Config = toml::from_str(&contents).into_diagnostic()?;
        Ok(config)
    }

    /// Try to find and load capidb.toml in current directory or parent directories
    pub fn find_and_load() -> Result<Option<Self>> {
        let mut current_dir = std::env::current_dir().into_diagnostic()?;

        loop {
            let config_path = current_dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                tracing::debug!(path = %config_path.display(), "Using configuration");
                return Ok(Some(Self::from_file(&config_path)?));
            }

            if !current_dir.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Load the configuration named by `--config`, or the nearest one
    pub fn resolve(args: &SchemaArgs) -> Result<Self> {
        let config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::find_and_load()?.unwrap_or_default(),
        };
        Ok(config.merge_with_args(args))
    }

    /// Merge CLI arguments into configuration
    /// CLI arguments take precedence over config file values
    pub fn merge_with_args(mut self, args: &SchemaArgs) -> Self {
        if !args.schema.is_empty() {
            self.schema = args.schema.iter().map(|p| p.display().to_string()).collect();
        }

        if let Some(dir) = &args.schema_dir {
            self.schema_dir = Some(dir.display().to_string());
        }

        if let Some(dialect) = &args.dialect {
            self.dialect = Some(dialect.clone());
        }

        if let Some(fmt) = args.format {
            self.format = Some(format!("{:?}", fmt).to_lowercase());
        }

        self
    }

    pub fn output_format(&self) -> OutputFormat {
        match self.format.as_deref() {
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Human,
        }
    }

    /// Declaration files named directly plus those found under `schema_dir`
    pub fn schema_files(&self) -> Result<Vec<SchemaFile>> {
        let mut files: Vec<SchemaFile> = self.schema.iter().map(SchemaFile::named).collect();

        if let Some(dir) = &self.schema_dir {
            for extension in ["json", "toml"] {
                let pattern = format!("{}/**/*.{}", dir, extension);
                for path in glob::glob(&pattern).into_diagnostic()?.flatten() {
                    files.push(SchemaFile {
                        path,
                        discovered: true,
                    });
                }
            }
        }

        Ok(files)
    }
}
