use crate::error::{ProcLogError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

/// Size in bytes, written in configuration as a plain integer or as a
/// string with an optional `KB`, `MB` or `GB` suffix (powers of 1024)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ByteSize(pub u64);

impl ByteSize {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl FromStr for ByteSize {
    type Err = ProcLogError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (digits, multiplier) = if let Some(digits) = s.strip_suffix("KB") {
            (digits, 1024)
        } else if let Some(digits) = s.strip_suffix("MB") {
            (digits, 1024 * 1024)
        } else if let Some(digits) = s.strip_suffix("GB") {
            (digits, 1024 * 1024 * 1024)
        } else {
            (s, 1)
        };

        let value = digits
            .trim()
            .parse::<u64>()
            .map_err(|e| ProcLogError::ConfigError(format!("Invalid byte size '{}': {}", s, e)))?;

        value
            .checked_mul(multiplier)
            .map(ByteSize)
            .ok_or_else(|| ProcLogError::ConfigError(format!("Byte size '{}' is too large", s)))
    }
}

impl Serialize for ByteSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bytes(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bytes(n) => Ok(ByteSize(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Logging settings of one output stream of a program
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// Destination specification: comma-separated paths or the sentinels
    /// `/dev/stdout`, `/dev/stderr`, `/dev/null` and `syslog`
    #[serde(default)]
    pub logfile: String,

    /// Size that triggers rotation of file destinations; 0 disables rotation
    #[serde(default = "default_maxbytes")]
    pub logfile_maxbytes: ByteSize,

    /// Number of rotated files kept per file destination
    #[serde(default = "default_backups")]
    pub logfile_backups: usize,

    /// Free-form properties, read by the syslog destination
    #[serde(default)]
    pub props: HashMap<String, String>,
}

// Default value functions for serde
fn default_maxbytes() -> ByteSize {
    ByteSize(50 * 1024 * 1024)
}

fn default_backups() -> usize {
    10
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            logfile: String::new(),
            logfile_maxbytes: default_maxbytes(),
            logfile_backups: default_backups(),
            props: HashMap::new(),
        }
    }
}

impl LogConfig {
    /// Settings for the given destination with default limits
    pub fn for_destination(logfile: impl Into<String>) -> Self {
        Self {
            logfile: logfile.into(),
            ..Self::default()
        }
    }
}

/// Logging settings of one supervised program
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgramLogConfig {
    /// Program name (unique identifier)
    pub name: String,

    /// Group the program belongs to, defaults to its name
    #[serde(default)]
    pub group: Option<String>,

    #[serde(default)]
    pub stdout: LogConfig,

    #[serde(default)]
    pub stderr: LogConfig,

    /// Send stderr output to the stdout destination
    #[serde(default)]
    pub redirect_stderr: bool,
}

impl ProgramLogConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: None,
            stdout: LogConfig::default(),
            stderr: LogConfig::default(),
            redirect_stderr: false,
        }
    }

    /// Group name, falling back to the program name
    pub fn group_name(&self) -> &str {
        self.group.as_deref().unwrap_or(&self.name)
    }

    /// Load program log configurations from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<Vec<ProgramLogConfig>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ProcLogError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let configs = match extension {
            "toml" => Self::parse_toml(&contents)?,
            "json" => Self::parse_json(&contents)?,
            _ => {
                return Err(ProcLogError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        for config in &configs {
            config.validate()?;
        }

        Ok(configs)
    }

    /// Parse TOML configuration, either one program or a `[[programs]]` list
    fn parse_toml(contents: &str) -> Result<Vec<ProgramLogConfig>> {
        #[derive(Deserialize)]
        struct ConfigFile {
            #[serde(default)]
            programs: Vec<ProgramLogConfig>,
            #[serde(flatten)]
            single: Option<ProgramLogConfig>,
        }

        let config_file: ConfigFile = toml::from_str(contents)
            .map_err(|e| ProcLogError::InvalidConfig(format!("Failed to parse TOML: {}", e)))?;

        if let Some(single) = config_file.single {
            Ok(vec![single])
        } else if !config_file.programs.is_empty() {
            Ok(config_file.programs)
        } else {
            Err(ProcLogError::InvalidConfig(
                "No program configuration found in file".to_string(),
            ))
        }
    }

    /// Parse JSON configuration, either one program or `{"programs": [...]}`
    fn parse_json(contents: &str) -> Result<Vec<ProgramLogConfig>> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum ConfigFile {
            Single(ProgramLogConfig),
            Multiple { programs: Vec<ProgramLogConfig> },
        }

        let config_file: ConfigFile = serde_json::from_str(contents)
            .map_err(|e| ProcLogError::InvalidConfig(format!("Failed to parse JSON: {}", e)))?;

        match config_file {
            ConfigFile::Single(config) => Ok(vec![config]),
            ConfigFile::Multiple { programs } => {
                if programs.is_empty() {
                    Err(ProcLogError::InvalidConfig(
                        "No program configuration found in file".to_string(),
                    ))
                } else {
                    Ok(programs)
                }
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ProcLogError::ConfigValidationError(
                "program name must not be empty".to_string(),
            ));
        }

        if self.redirect_stderr && !self.stderr.logfile.trim().is_empty() {
            tracing::warn!(
                "Program {}: stderr logfile is ignored because redirect_stderr is set",
                self.name
            );
        }

        Ok(())
    }
}
