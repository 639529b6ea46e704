use crate::accident_record::ColumnMapping;
use crate::age_bracket::AgeBracket;
use crate::license_reference::LicenseReference;
use crate::severity::SeverityRule;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    /// License holders per bracket, keyed by bracket label. Empty means the
    /// built-in Fukuoka 2021 table.
    pub reference: BTreeMap<String, u64>,
    pub dashboard: DashboardConfig,
    pub elastic: ElasticConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub data_csv: PathBuf,
    pub columns: ColumnMapping,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            data_csv: PathBuf::from("事故統計R3.csv"),
            columns: ColumnMapping::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub highlight: AgeBracket,
    pub fatal_value: String,
    pub output_dir: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            highlight: AgeBracket::From75,
            fatal_value: SeverityRule::default().fatal_value,
            output_dir: PathBuf::from("output"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ElasticConfig {
    pub uri: String,
    pub index: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub batch_size: usize,
    pub throttle: usize,
}

impl Default for ElasticConfig {
    fn default() -> Self {
        ElasticConfig {
            uri: String::from("http://localhost:9200/"),
            index: String::from("traffic-accidents"),
            username: None,
            password: None,
            batch_size: 10_000,
            throttle: 1,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// Like `load_from_file`, but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            AppConfig::load_from_file(path)
        } else {
            info!("config file {:?} not found, using defaults", path);
            Ok(AppConfig::default())
        }
    }

    pub fn license_reference(&self) -> Result<LicenseReference> {
        if self.reference.is_empty() {
            return Ok(LicenseReference::fukuoka_2021());
        }
        LicenseReference::from_entries(&self.reference).context("Invalid [reference] table")
    }

    pub fn severity_rule(&self) -> SeverityRule {
        SeverityRule { fatal_value: self.dashboard.fatal_value.clone() }
    }
}
