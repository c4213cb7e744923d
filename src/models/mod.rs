use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod intermediate;

pub use intermediate::{IngestDefaults, IntermediateChannel, IntermediateProgramme};

/// Region tag used when the upstream record carries none
pub const UNKNOWN_REGION: &str = "Unknown";

/// Identifier placed in `hdid` for channels without an HD simulcast
pub const NO_HD_ID: &str = "00";

/// One broadcaster channel as delivered by the upstream collectors
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRecord {
    pub external_id: String,
    pub name: String,
    pub region: String,
    pub logo_url: Option<String>,
    pub programmes: Vec<RawProgramme>,
}

/// One upstream programme slot, already localized into the output zone
#[derive(Debug, Clone, PartialEq)]
pub struct RawProgramme {
    /// Raw title, possibly prefixed with a bracketed rating tag (`[K12] News`)
    pub title: String,
    pub description: String,
    pub start: DateTime<Tz>,
    pub end: Option<DateTime<Tz>>,
}

/// Persisted identity of a channel, keyed by its external id.
///
/// Field names match the on-disk cache layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelIdentity {
    /// Stable numeric id, string encoded
    #[serde(rename = "id")]
    pub assigned_id: String,
    /// Upstream channel number (`channel-042` -> `42`)
    pub channel: String,
    #[serde(rename = "hashd")]
    pub has_hd_variant: bool,
    /// HD simulcast id, or [`NO_HD_ID`]
    #[serde(rename = "hdid")]
    pub hd_assigned_id: String,
}

/// Registry contents: external id -> identity
pub type ChannelIdentityMap = BTreeMap<String, ChannelIdentity>;

/// A programme with its computed stop time
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub start: DateTime<Tz>,
    pub stop: DateTime<Tz>,
    pub title: String,
    pub rating: String,
    pub description: String,
}

impl ChannelIdentity {
    /// The HD id when this channel has a simulcast
    pub fn hd_id(&self) -> Option<&str> {
        self.has_hd_variant.then_some(self.hd_assigned_id.as_str())
    }
}

impl ChannelRecord {
    pub fn programme_count(&self) -> usize {
        self.programmes.len()
    }
}
