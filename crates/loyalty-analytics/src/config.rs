//! Configuration for the analytics report generator

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::export::ExportFormat;

// =============================================================================
// File-based Configuration (config.toml)
// =============================================================================

/// Configuration loaded from config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Admin API endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Service root, e.g. https://api.example.com
    pub base_url: String,
    #[serde(default = "default_members_path")]
    pub members_path: String,
    #[serde(default = "default_agents_path")]
    pub agents_path: String,
    #[serde(default = "default_tier_prices_path")]
    pub tier_prices_path: String,
    /// Per-request transport timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            members_path: default_members_path(),
            agents_path: default_agents_path(),
            tier_prices_path: default_tier_prices_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Output settings
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Leading part of the generated file name
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub format: ExportFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            file_prefix: default_file_prefix(),
            output_dir: default_output_dir(),
            format: ExportFormat::default(),
        }
    }
}

fn default_members_path() -> String {
    constants::DEFAULT_MEMBERS_PATH.to_string()
}

fn default_agents_path() -> String {
    constants::DEFAULT_AGENTS_PATH.to_string()
}

fn default_tier_prices_path() -> String {
    constants::DEFAULT_TIER_PRICES_PATH.to_string()
}

fn default_timeout_secs() -> u64 {
    constants::DEFAULT_TIMEOUT_SECS
}

fn default_file_prefix() -> String {
    constants::DEFAULT_FILE_PREFIX.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(constants::DEFAULT_OUTPUT_DIR)
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).with_context(|| {
            "Failed to parse config.toml. Check for:\n\
             - Missing required fields (api.base_url)\n\
             - Invalid TOML syntax (missing quotes, brackets, etc.)\n\
             - Unknown report.format (expected \"workbook\" or \"csv\")\n\n\
             See config.toml.example for the expected format."
        })?;

        if config.api.base_url.trim().is_empty() {
            anyhow::bail!("api.base_url must not be empty");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = FileConfig::parse("[api]\nbase_url = \"https://api.example.com\"\n").unwrap();
        assert_eq!(config.api.members_path, "/admin/users");
        assert_eq!(config.api.agents_path, "/admin/agents");
        assert_eq!(config.api.tier_prices_path, "/admin/packages/stats");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.report.file_prefix, "Platform");
        assert_eq!(config.report.output_dir, PathBuf::from("./output"));
        assert_eq!(config.report.format, ExportFormat::Workbook);
    }

    #[test]
    fn report_section_overrides() {
        let config = FileConfig::parse(
            r#"
            [api]
            base_url = "https://api.example.com"
            timeout_secs = 5

            [report]
            file_prefix = "Loyalty"
            output_dir = "/tmp/reports"
            format = "csv"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.report.file_prefix, "Loyalty");
        assert_eq!(config.report.format, ExportFormat::Csv);
    }

    #[test]
    fn missing_or_blank_base_url_is_rejected() {
        assert!(FileConfig::parse("[report]\nfile_prefix = \"X\"\n").is_err());
        assert!(FileConfig::parse("[api]\nbase_url = \"  \"\n").is_err());
    }

    #[test]
    fn unknown_format_is_rejected() {
        let toml = "[api]\nbase_url = \"https://a\"\n[report]\nformat = \"pdf\"\n";
        assert!(FileConfig::parse(toml).is_err());
    }
}
