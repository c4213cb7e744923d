use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::utils::time::{parse_time_of_day, parse_timezone};

pub mod defaults;

use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub xmltv: XmltvConfig,
    #[serde(default)]
    pub digea: DigeaConfig,
    #[serde(default)]
    pub ert: ErtConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the intermediate per-channel JSON files
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    /// Extension (without dot) of the files picked up from `input_dir`
    #[serde(default = "default_input_extension")]
    pub input_extension: String,
    /// Channel identity cache location
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_output_file")]
    pub output_file: String,
    /// File name of the region-filtered subset document
    #[serde(default = "default_regional_output_file")]
    pub regional_output_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Concatenate every input file instead of picking the newest one
    #[serde(default = "default_multi_file")]
    pub multi_file: bool,
    /// Explicit input file for single-file mode, relative to `input_dir`
    pub input_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XmltvConfig {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_programme_lang")]
    pub programme_lang: String,
    #[serde(default = "default_channel_lang")]
    pub channel_lang: String,
    #[serde(default = "default_source_info_name")]
    pub source_info_name: String,
    #[serde(default = "default_generator_info_name")]
    pub generator_info_name: String,
    #[serde(default = "default_generator_info_url")]
    pub generator_info_url: String,
    #[serde(default = "default_dtd")]
    pub dtd: String,
    #[serde(default = "default_rating_system")]
    pub rating_system: String,
    /// Rating used when a title carries no bracketed tag
    #[serde(default = "default_rating")]
    pub default_rating: String,
    /// Description used when the upstream record has none
    #[serde(default = "default_description")]
    pub default_description: String,
    /// Wall-clock time at which the broadcast day ends; the last programme of
    /// a channel runs until the next occurrence of it
    #[serde(default = "default_broadcast_day_end")]
    pub broadcast_day_end: String,
    /// Channel names that have an HD simulcast
    #[serde(default = "default_hd_channels")]
    pub hd_channels: BTreeSet<String>,
    /// Regions kept in the regional subset document
    #[serde(default = "default_regional_filter")]
    pub regional_filter: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigeaConfig {
    #[serde(default = "default_digea_base_url")]
    pub base_url: String,
    #[serde(default = "default_digea_api_prefix")]
    pub api_prefix: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout, humantime syntax (e.g. "30s")
    #[serde(default = "default_request_timeout")]
    pub timeout: String,
    /// Where the collector drops its intermediate JSON file
    #[serde(default = "default_input_dir")]
    pub export_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErtConfig {
    /// Programme page root; each channel page is `<base_url><slug>/`
    #[serde(default = "default_ert_base_url")]
    pub base_url: String,
    /// Channel page slugs, in the order their ids are assigned
    #[serde(default = "default_ert_channels")]
    pub channels: Vec<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout")]
    pub timeout: String,
    #[serde(default = "default_input_dir")]
    pub export_dir: PathBuf,
}

// Path defaults
fn default_input_dir() -> PathBuf {
    PathBuf::from(DEFAULT_INPUT_DIR)
}

fn default_input_extension() -> String {
    DEFAULT_INPUT_EXTENSION.to_string()
}

fn default_cache_file() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_FILE)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_output_file() -> String {
    DEFAULT_OUTPUT_FILE.to_string()
}

fn default_regional_output_file() -> String {
    DEFAULT_REGIONAL_OUTPUT_FILE.to_string()
}

// Ingestion defaults
fn default_multi_file() -> bool {
    DEFAULT_MULTI_FILE
}

// XMLTV defaults
fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_programme_lang() -> String {
    DEFAULT_PROGRAMME_LANG.to_string()
}

fn default_channel_lang() -> String {
    DEFAULT_CHANNEL_LANG.to_string()
}

fn default_source_info_name() -> String {
    DEFAULT_SOURCE_INFO_NAME.to_string()
}

fn default_generator_info_name() -> String {
    DEFAULT_GENERATOR_INFO_NAME.to_string()
}

fn default_generator_info_url() -> String {
    DEFAULT_GENERATOR_INFO_URL.to_string()
}

fn default_dtd() -> String {
    DEFAULT_DTD.to_string()
}

fn default_rating_system() -> String {
    DEFAULT_RATING_SYSTEM.to_string()
}

fn default_rating() -> String {
    DEFAULT_RATING.to_string()
}

fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_string()
}

fn default_broadcast_day_end() -> String {
    DEFAULT_BROADCAST_DAY_END.to_string()
}

fn default_hd_channels() -> BTreeSet<String> {
    DEFAULT_HD_CHANNELS.iter().map(|s| s.to_string()).collect()
}

fn default_regional_filter() -> BTreeSet<String> {
    DEFAULT_REGIONAL_FILTER.iter().map(|s| s.to_string()).collect()
}

// Digea defaults
fn default_digea_base_url() -> String {
    DEFAULT_DIGEA_BASE_URL.to_string()
}

fn default_digea_api_prefix() -> String {
    DEFAULT_DIGEA_API_PREFIX.to_string()
}

// ERT defaults
fn default_ert_base_url() -> String {
    DEFAULT_ERT_BASE_URL.to_string()
}

fn default_ert_channels() -> Vec<String> {
    DEFAULT_ERT_CHANNELS.iter().map(|s| s.to_string()).collect()
}

// Shared collector defaults
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_request_timeout() -> String {
    DEFAULT_REQUEST_TIMEOUT.to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            input_extension: default_input_extension(),
            cache_file: default_cache_file(),
            output_dir: default_output_dir(),
            output_file: default_output_file(),
            regional_output_file: default_regional_output_file(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            multi_file: default_multi_file(),
            input_file: None,
        }
    }
}

impl Default for XmltvConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            programme_lang: default_programme_lang(),
            channel_lang: default_channel_lang(),
            source_info_name: default_source_info_name(),
            generator_info_name: default_generator_info_name(),
            generator_info_url: default_generator_info_url(),
            dtd: default_dtd(),
            rating_system: default_rating_system(),
            default_rating: default_rating(),
            default_description: default_description(),
            broadcast_day_end: default_broadcast_day_end(),
            hd_channels: default_hd_channels(),
            regional_filter: default_regional_filter(),
        }
    }
}

impl Default for DigeaConfig {
    fn default() -> Self {
        Self {
            base_url: default_digea_base_url(),
            api_prefix: default_digea_api_prefix(),
            user_agent: default_user_agent(),
            timeout: default_request_timeout(),
            export_dir: default_input_dir(),
        }
    }
}

impl Default for ErtConfig {
    fn default() -> Self {
        Self {
            base_url: default_ert_base_url(),
            channels: default_ert_channels(),
            user_agent: default_user_agent(),
            timeout: default_request_timeout(),
            export_dir: default_input_dir(),
        }
    }
}

impl PathsConfig {
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file)
    }

    pub fn regional_output_path(&self) -> PathBuf {
        self.output_dir.join(&self.regional_output_file)
    }
}

impl XmltvConfig {
    /// Check the settings that are parsed lazily elsewhere
    pub fn validate(&self) -> AppResult<()> {
        parse_timezone(&self.timezone)?;
        parse_time_of_day(&self.broadcast_day_end)?;
        if self.default_rating.trim().is_empty() {
            return Err(AppError::configuration("default_rating must not be empty"));
        }
        Ok(())
    }
}

fn parse_timeout(section: &str, value: &str) -> AppResult<Duration> {
    humantime::parse_duration(value).map_err(|e| {
        AppError::configuration(format!("Invalid {section} timeout '{value}': {e}"))
    })
}

impl DigeaConfig {
    pub fn request_timeout(&self) -> AppResult<Duration> {
        parse_timeout("digea", &self.timeout)
    }
}

impl ErtConfig {
    pub fn request_timeout(&self) -> AppResult<Duration> {
        parse_timeout("ert", &self.timeout)
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the built-in defaults; nothing is written to disk.
    pub fn load_from_file(config_file: impl AsRef<Path>) -> AppResult<Self> {
        let config_file = config_file.as_ref();
        let config = if config_file.exists() {
            let contents = std::fs::read_to_string(config_file)?;
            let config: Config = toml::from_str(&contents).map_err(|e| {
                AppError::configuration(format!("Failed to parse {}: {e}", config_file.display()))
            })?;
            info!("Configuration loaded from: {}", config_file.display());
            config
        } else {
            info!(
                "Config file {} not found, using built-in defaults",
                config_file.display()
            );
            Self::default()
        };

        config.xmltv.validate()?;
        config.digea.request_timeout()?;
        config.ert.request_timeout()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.xmltv.validate().is_ok());
        assert_eq!(config.xmltv.timezone, "Europe/Athens");
        assert_eq!(config.xmltv.broadcast_day_end, "06:00");
        assert!(config.xmltv.hd_channels.contains("SKAI"));
        assert!(config.xmltv.regional_filter.contains("Attica-R-Z-9"));
        assert_eq!(
            config.paths.output_path(),
            PathBuf::from("./export/xmltv_GREECE.xml")
        );
        assert_eq!(config.digea.request_timeout().unwrap(), Duration::from_secs(30));
        assert_eq!(config.ert.channels.first().map(String::as_str), Some("ert1"));
        assert_eq!(config.ert.channels.len(), 6);
    }

    #[test]
    fn test_missing_file_uses_defaults_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load_from_file(&path).unwrap();
        assert!(config.ingestion.multi_file);
        assert!(!path.exists());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[paths]
output_file = "custom.xml"

[xmltv]
hd_channels = ["ERT SPORTS"]
broadcast_day_end = "05:30"
"#,
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.paths.output_file, "custom.xml");
        assert_eq!(config.paths.input_extension, "json");
        assert_eq!(config.xmltv.hd_channels.len(), 1);
        assert!(config.xmltv.hd_channels.contains("ERT SPORTS"));
        assert_eq!(config.xmltv.broadcast_day_end, "05:30");
        assert_eq!(config.xmltv.default_rating, "K16");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "[xmltv]\ntimezone = \"Mars/Olympus\"\n").unwrap();
        assert!(Config::load_from_file(&path).is_err());

        std::fs::write(&path, "[xmltv]\nbroadcast_day_end = \"6am\"\n").unwrap();
        assert!(Config::load_from_file(&path).is_err());

        std::fs::write(&path, "[digea]\ntimeout = \"soon\"\n").unwrap();
        assert!(Config::load_from_file(&path).is_err());

        std::fs::write(&path, "[ert]\ntimeout = \"later\"\n").unwrap();
        assert!(Config::load_from_file(&path).is_err());

        std::fs::write(&path, "not = [valid").unwrap();
        assert!(Config::load_from_file(&path).is_err());
    }
}
