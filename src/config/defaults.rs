/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Path defaults
pub const DEFAULT_INPUT_DIR: &str = "./export";
pub const DEFAULT_INPUT_EXTENSION: &str = "json";
pub const DEFAULT_CACHE_FILE: &str = "./cache/channels_id.json";
pub const DEFAULT_OUTPUT_DIR: &str = "./export";
pub const DEFAULT_OUTPUT_FILE: &str = "xmltv_GREECE.xml";
pub const DEFAULT_REGIONAL_OUTPUT_FILE: &str = "xmltv_GREECE_nat_att.xml";

// Ingestion defaults
pub const DEFAULT_MULTI_FILE: bool = true;

// XMLTV defaults
pub const DEFAULT_TIMEZONE: &str = "Europe/Athens";
pub const DEFAULT_PROGRAMME_LANG: &str = "el";
pub const DEFAULT_CHANNEL_LANG: &str = "en";
pub const DEFAULT_SOURCE_INFO_NAME: &str = "Digea.gr-Ert.gr";
pub const DEFAULT_GENERATOR_INFO_NAME: &str = "greek-xmltv";
pub const DEFAULT_GENERATOR_INFO_URL: &str = "https://liatas.com";
pub const DEFAULT_DTD: &str = "grxmltv.dtd";
pub const DEFAULT_RATING_SYSTEM: &str = "Greek";
pub const DEFAULT_RATING: &str = "K16";
pub const DEFAULT_DESCRIPTION: &str = "Δεν υπάρχουν πληροφορίες προγράμματος";
pub const DEFAULT_BROADCAST_DAY_END: &str = "06:00";
pub const DEFAULT_HD_CHANNELS: [&str; 6] = ["ALPHA", "ANT1", "OPEN BEYOND", "M.tv", "SKAI", "STAR"];
pub const DEFAULT_REGIONAL_FILTER: [&str; 3] = ["Nationwide", "National-public", "Attica-R-Z-9"];

// Digea collector defaults
pub const DEFAULT_DIGEA_BASE_URL: &str = "https://www.digea.gr";
pub const DEFAULT_DIGEA_API_PREFIX: &str = "/el/api/epg";

// ERT collector defaults
pub const DEFAULT_ERT_BASE_URL: &str = "https://www.ert.gr/tv/program/";
pub const DEFAULT_ERT_CHANNELS: [&str; 6] = ["ert1", "ert2", "ert3", "ertnews", "ertsports", "vouli"];

// Shared collector defaults
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_REQUEST_TIMEOUT: &str = "30s";
