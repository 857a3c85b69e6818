use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::relational::{JoinType, ParameterStyle};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// A string that names none of an option's variants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("expected one of {expected}, got '{value}'")]
pub struct UnknownOption {
    pub expected: &'static str,
    pub value: String,
}

/// Engine configuration with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of hex digits of the path hash kept in join aliases
    #[validate(range(
        min = 4,
        max = 64,
        message = "Alias hash length must be between 4 and 64"
    ))]
    pub alias_hash_length: usize,

    /// Join type used for every association join
    pub default_join_type: JoinType,

    /// Placeholder syntax of compiled parameters
    pub parameter_style: ParameterStyle,

    /// Upper bound on value rows produced for one object during in-memory evaluation
    #[validate(range(
        min = 1,
        max = 1_000_000,
        message = "Max value rows must be between 1 and 1000000"
    ))]
    pub max_value_rows: usize,

    /// Alias of the root entity in compiled queries
    #[validate(custom(function = "validate_root_alias"))]
    pub root_alias: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            alias_hash_length: 8,
            default_join_type: JoinType::Left,
            parameter_style: ParameterStyle::Positional,
            max_value_rows: 10_000,
            root_alias: "t".to_string(),
        }
    }
}

impl EngineConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            alias_hash_length: parse_env_var("PATHQUERY_ALIAS_HASH_LENGTH", "8")?,
            default_join_type: parse_env_var("PATHQUERY_JOIN_TYPE", "left")?,
            parameter_style: parse_env_var("PATHQUERY_PARAMETER_STYLE", "positional")?,
            max_value_rows: parse_env_var("PATHQUERY_MAX_VALUE_ROWS", "10000")?,
            root_alias: env::var("PATHQUERY_ROOT_ALIAS").unwrap_or_else(|_| "t".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file; missing keys take their defaults
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply command line overrides and re-validate
    pub fn merge(&mut self, overrides: ConfigOverrides) -> Result<(), ConfigError> {
        if let Some(length) = overrides.alias_hash_length {
            self.alias_hash_length = length;
        }
        if let Some(join_type) = overrides.default_join_type {
            self.default_join_type = join_type;
        }
        if let Some(style) = overrides.parameter_style {
            self.parameter_style = style;
        }
        if let Some(rows) = overrides.max_value_rows {
            self.max_value_rows = rows;
        }
        if let Some(alias) = overrides.root_alias {
            self.root_alias = alias;
        }
        self.validate()?;
        Ok(())
    }
}

/// Optional overrides (parsed from command line arguments)
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub alias_hash_length: Option<usize>,
    pub default_join_type: Option<JoinType>,
    pub parameter_style: Option<ParameterStyle>,
    pub max_value_rows: Option<usize>,
    pub root_alias: Option<String>,
}

fn validate_root_alias(alias: &str) -> Result<(), ValidationError> {
    let mut chars = alias.chars();
    let valid = match chars.next() {
        Some(first) => {
            first.is_ascii_alphabetic() && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        let mut error = ValidationError::new("root_alias");
        error.message = Some("Root alias must be an identifier starting with a letter".into());
        Err(error)
    }
}

impl FromStr for JoinType {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(JoinType::Left),
            "inner" => Ok(JoinType::Inner),
            _ => Err(UnknownOption {
                expected: "left, inner",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for ParameterStyle {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "positional" => Ok(ParameterStyle::Positional),
            "named" => Ok(ParameterStyle::Named),
            _ => Err(UnknownOption {
                expected: "positional, named",
                value: s.to_string(),
            }),
        }
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
