//! Configuration for the linter
//!
//! Read from `.metalintrc.yaml` / `.metalintrc.json` (project-level) or an
//! explicit `--config` path. The `rules` section is the override catalog:
//! when present, only the rules it names are evaluated.

use crate::catalog::OverrideCatalog;
use crate::finding::Severity;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Enable parallel processing
    pub parallel: bool,

    /// Number of parallel jobs (0 = auto-detect)
    pub jobs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            jobs: 0,
        }
    }
}

/// Output settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: OutputFormat,

    /// Color mode
    pub color: ColorMode,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "table" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Color mode options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// Discovery settings: which files directories expand to
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Include patterns
    pub include: Vec<String>,

    /// Exclude patterns
    pub exclude: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            include: vec!["**/*.*-meta.xml".to_string()],
            exclude: Vec::new(),
        }
    }
}

/// Exit-code threshold: findings at this severity or higher fail the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityThreshold {
    Error,
    Warning,
    Info,
    #[default]
    None,
}

impl SeverityThreshold {
    /// True when a finding of the given priority meets the threshold
    pub fn is_met_by(self, priority: u8) -> bool {
        match self {
            SeverityThreshold::None => false,
            SeverityThreshold::Error => priority <= Severity::Error.priority(),
            SeverityThreshold::Warning => priority <= Severity::Warning.priority(),
            SeverityThreshold::Info => priority <= Severity::Info.priority(),
        }
    }
}

impl std::str::FromStr for SeverityThreshold {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(SeverityThreshold::Error),
            "warning" | "warn" => Ok(SeverityThreshold::Warning),
            "info" => Ok(SeverityThreshold::Info),
            "none" => Ok(SeverityThreshold::None),
            _ => Err(format!("Unknown severity threshold: {}", s)),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine settings
    pub engine: EngineConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Discovery settings
    pub files: FilesConfig,

    /// Rule overrides; empty means the full built-in catalog runs
    pub rules: OverrideCatalog,

    /// Exit-code severity threshold
    pub severity: SeverityThreshold,
}

impl Config {
    /// Load configuration from a file, dispatching on extension
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Err(ConfigError::Invalid(format!(
                "unsupported config extension: {}",
                path.display()
            ))),
        }
    }

    /// Look for a project config file in the given directory
    pub fn discover(dir: &Path) -> Result<Option<Self>, ConfigError> {
        for candidate in [".metalintrc.yaml", ".metalintrc.yml", ".metalintrc.json"] {
            let path = dir.join(candidate);
            if path.is_file() {
                return Ok(Some(Self::load(&path)?));
            }
        }
        Ok(None)
    }
}

/// Load a standalone override catalog file (the `--rules` flag)
pub fn load_overrides(path: &Path) -> Result<OverrideCatalog, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
        Some("json") => Ok(serde_json::from_str(&content)?),
        _ => Err(ConfigError::Invalid(format!(
            "unsupported rules file extension: {}",
            path.display()
        ))),
    }
}

/// Resolve the effective config path logic for a `PathBuf` flag
pub fn resolve(explicit: Option<&PathBuf>) -> Result<Config, ConfigError> {
    match explicit {
        Some(path) => Config::load(path),
        None => Ok(Config::discover(Path::new("."))?.unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.engine.parallel);
        assert_eq!(config.engine.jobs, 0);
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(config.files.include, vec!["**/*.*-meta.xml"]);
        assert!(config.rules.is_empty());
        assert_eq!(config.severity, SeverityThreshold::None);
    }

    #[test]
    fn test_parse_yaml_config() {
        let yaml = r#"
engine:
  parallel: false
output:
  format: json
severity: warning
rules:
  missing-description:
    priority: 1
  flow-inactive: {}
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.engine.parallel);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.severity, SeverityThreshold::Warning);
        let names: Vec<&String> = config.rules.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["missing-description", "flow-inactive"]);
    }

    #[test]
    fn test_parse_json_config() {
        let json = r#"{"files": {"include": ["**/*.flow-meta.xml"]}, "severity": "error"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.files.include, vec!["**/*.flow-meta.xml"]);
        assert_eq!(config.severity, SeverityThreshold::Error);
    }

    #[test]
    fn test_severity_threshold() {
        assert!(SeverityThreshold::Error.is_met_by(1));
        assert!(!SeverityThreshold::Error.is_met_by(2));
        assert!(SeverityThreshold::Warning.is_met_by(1));
        assert!(SeverityThreshold::Warning.is_met_by(2));
        assert!(!SeverityThreshold::Warning.is_met_by(3));
        assert!(SeverityThreshold::Info.is_met_by(3));
        assert!(!SeverityThreshold::None.is_met_by(1));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("conf.yaml");
        std::fs::write(&yaml_path, "severity: info\n").unwrap();
        let config = Config::load(&yaml_path).unwrap();
        assert_eq!(config.severity, SeverityThreshold::Info);

        let bad_path = dir.path().join("conf.toml");
        std::fs::write(&bad_path, "severity = 'info'").unwrap();
        assert!(matches!(
            Config::load(&bad_path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_discover_config() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::discover(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join(".metalintrc.yaml"), "severity: warning\n").unwrap();
        let config = Config::discover(dir.path()).unwrap().unwrap();
        assert_eq!(config.severity, SeverityThreshold::Warning);
    }

    #[test]
    fn test_load_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user-rules.json");
        std::fs::write(
            &path,
            r#"{"missing-description": {"priority": 1, "include": ["**/*.field-meta.xml"]}}"#,
        )
        .unwrap();

        let overrides = load_overrides(&path).unwrap();
        let (name, patch) = overrides.iter().next().unwrap();
        assert_eq!(name, "missing-description");
        assert_eq!(patch.priority, Some(1));
        assert_eq!(
            patch.include,
            Some(vec!["**/*.field-meta.xml".to_string()])
        );
    }
}
