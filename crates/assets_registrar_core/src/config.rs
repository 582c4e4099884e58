use std::fmt;
use std::str::FromStr;

pub const DOMAIN_ID_VAR: &str = "DZ_DOMAIN_ID";
pub const PROJECT_ID_VAR: &str = "DZ_PROJECT_ID";
pub const STATE_STORE_TABLE_ARN_VAR: &str = "DZ_STATE_STORE_TABLE_ARN";
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";
pub const TRACER_DISABLED_VAR: &str = "TRACER_DISABLED";

/// Service name attached to every log line.
pub const SERVICE_NAME: &str = "dz_assets_registrar";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{variable} does not name a table: '{value}'")]
    UnresolvableTable { variable: &'static str, value: String },
    #[error("{variable} has unsupported log level '{value}'")]
    InvalidLogLevel { variable: &'static str, value: String },
    #[error("{variable} must be a boolean, got '{value}'")]
    InvalidBoolean { variable: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_directive())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    // Accepts both the Rust names and the ones common in Lambda configuration
    // (`WARNING`, `CRITICAL`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Ok(Self::Trace),
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" | "CRITICAL" | "FATAL" => Ok(Self::Error),
            _ => Err(value.to_string()),
        }
    }
}

/// A state store table reference: the configured value and the table name
/// resolved from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReference {
    pub reference: String,
    pub table_name: String,
}

impl TableReference {
    /// Resolves `arn:aws:dynamodb:<region>:<account>:table/<name>` (or a bare
    /// table name) to the table name.
    pub fn parse(reference: &str) -> Option<Self> {
        let reference = reference.trim();
        let table_name = reference.rsplit('/').next()?.trim();
        if table_name.is_empty() || table_name.contains(':') {
            return None;
        }

        Some(Self {
            reference: reference.to_string(),
            table_name: table_name.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub domain_id: String,
    pub project_id: String,
    pub state_store_table: TableReference,
    pub log_level: LogLevel,
    pub tracer_disabled: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let domain_id = required(&lookup, DOMAIN_ID_VAR)?;
        let project_id = required(&lookup, PROJECT_ID_VAR)?;

        let table_arn = required(&lookup, STATE_STORE_TABLE_ARN_VAR)?;
        let state_store_table =
            TableReference::parse(&table_arn).ok_or_else(|| ConfigError::UnresolvableTable {
                variable: STATE_STORE_TABLE_ARN_VAR,
                value: table_arn.clone(),
            })?;

        let (log_level, tracer_disabled) = observability_from_lookup(&lookup)?;

        Ok(Self {
            domain_id,
            project_id,
            state_store_table,
            log_level,
            tracer_disabled,
        })
    }
}

/// Reads only the logging settings, so telemetry can be installed before the
/// rest of the configuration is validated.
pub fn observability_from_lookup(
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<(LogLevel, bool), ConfigError> {
    let log_level = match non_blank(lookup(LOG_LEVEL_VAR)) {
        Some(value) => value
            .parse::<LogLevel>()
            .map_err(|value| ConfigError::InvalidLogLevel {
                variable: LOG_LEVEL_VAR,
                value,
            })?,
        None => LogLevel::default(),
    };

    let tracer_disabled = match non_blank(lookup(TRACER_DISABLED_VAR)) {
        Some(value) => parse_bool(TRACER_DISABLED_VAR, &value)?,
        None => false,
    };

    Ok((log_level, tracer_disabled))
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    variable: &'static str,
) -> Result<String, ConfigError> {
    let value = lookup(variable).ok_or(ConfigError::Missing(variable))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Empty(variable));
    }
    Ok(trimmed.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn parse_bool(variable: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBoolean {
            variable,
            value: value.to_string(),
        }),
    }
}
