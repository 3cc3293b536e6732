//! SRO Configuration Management
//!
//! Handles configuration from environment variables and TOML config files
//! with the documented extraction defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Per-sentence extraction settings
    pub extraction: ExtractionConfig,

    /// Whole-collection refinement settings
    pub postprocess: PostProcessConfig,

    /// Export settings
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(terms) = std::env::var("SRO_DOMAIN_TERMS") {
            config.extraction.domain_terms = terms
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(value) = std::env::var("SRO_SUBJECT_THRESHOLD") {
            config.postprocess.subject_threshold = parse_var("SRO_SUBJECT_THRESHOLD", value)?;
        }
        if let Ok(value) = std::env::var("SRO_OBJECT_THRESHOLD") {
            config.postprocess.object_threshold = parse_var("SRO_OBJECT_THRESHOLD", value)?;
        }
        if let Ok(value) = std::env::var("SRO_MERGE_SUBJECTS") {
            config.postprocess.merge_subjects = parse_var("SRO_MERGE_SUBJECTS", value)?;
        }

        if let Ok(format) = std::env::var("SRO_OUTPUT_FORMAT") {
            config.output.format = format.parse()?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|message| ConfigError::ParseError { path, message })
    }

    fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;
        let defaults = Self::default();

        // Only override if env values differ from defaults
        if !env_config.extraction.domain_terms.is_empty() {
            self.extraction.domain_terms = env_config.extraction.domain_terms;
        }
        if env_config.postprocess.subject_threshold != defaults.postprocess.subject_threshold {
            self.postprocess.subject_threshold = env_config.postprocess.subject_threshold;
        }
        if env_config.postprocess.object_threshold != defaults.postprocess.object_threshold {
            self.postprocess.object_threshold = env_config.postprocess.object_threshold;
        }
        if env_config.postprocess.merge_subjects != defaults.postprocess.merge_subjects {
            self.postprocess.merge_subjects = env_config.postprocess.merge_subjects;
        }
        if env_config.output.format != defaults.output.format {
            self.output.format = env_config.output.format;
        }
        if env_config.logging.level != defaults.logging.level {
            self.logging.level = env_config.logging.level;
        }

        Ok(self)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Per-sentence extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Domain terms the annotation adapter does not recognize as entities
    pub domain_terms: Vec<String>,

    /// Collapse overlapping entity spans into single tokens before searching
    pub retokenize: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            domain_terms: Vec::new(),
            retokenize: true,
        }
    }
}

/// Post-processing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcessConfig {
    /// Fold extended subjects into their lexicographic predecessor
    pub merge_subjects: bool,

    /// Minimum occurrences for a subject to survive
    pub subject_threshold: usize,

    /// Minimum occurrences for an object to survive
    pub object_threshold: usize,

    /// Drop rows whose subject equals their object
    pub prune_self_loops: bool,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self {
            merge_subjects: true,
            subject_threshold: 2,
            object_threshold: 2,
            prune_self_loops: true,
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Supported triplet export formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    Jsonl,
}

impl std::str::FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::Jsonl),
            _ => Err(ConfigError::InvalidValue {
                key: "SRO_OUTPUT_FORMAT".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
            Self::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
