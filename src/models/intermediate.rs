//! Intermediate JSON records exchanged between the collectors and the generator
//!
//! The collectors write one JSON array per run, one object per channel:
//!
//! ```json
//! [{
//!   "id": ["channel-42"],
//!   "region": ["Nationwide"],
//!   "name": ["SKAI"],
//!   "img_url": ["https://www.digea.gr/logo.png"],
//!   "programmes": [
//!     {"title": "[K12] News", "desc": "...", "airDateTime": "20240115083000 +0200",
//!      "end": "20240115093000 +0200", "start": "08:30", "date": "20240115"}
//!   ]
//! }]
//! ```
//!
//! String fields are written wrapped in one-element arrays; plain strings are
//! accepted too. Conversion into [`ChannelRecord`] is where missing fields get
//! their defaults and where unusable programmes are dropped.

use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use super::{ChannelRecord, RawProgramme, UNKNOWN_REGION};
use crate::utils::time::parse_programme_time;

/// Wire shape of a channel record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntermediateChannel {
    #[serde(default, with = "one_or_many")]
    pub id: Option<String>,
    #[serde(default, with = "one_or_many")]
    pub region: Option<String>,
    #[serde(default, with = "one_or_many")]
    pub name: Option<String>,
    #[serde(
        default,
        with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub img_url: Option<String>,
    #[serde(default)]
    pub programmes: Vec<IntermediateProgramme>,
}

/// Wire shape of a programme slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntermediateProgramme {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(rename = "airDateTime", default)]
    pub air_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    /// `HH:MM`, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// `YYYYMMDD`, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Values substituted for missing fields at the ingestion boundary
#[derive(Debug, Clone, Copy)]
pub struct IngestDefaults<'a> {
    pub timezone: Tz,
    pub description: &'a str,
}

impl IntermediateChannel {
    /// Convert into a [`ChannelRecord`], or `None` when the record has no id
    pub fn into_record(self, defaults: &IngestDefaults<'_>) -> Option<ChannelRecord> {
        let external_id = match non_blank(self.id) {
            Some(id) => id,
            None => {
                warn!(
                    "Dropping channel record without id (name: {:?})",
                    self.name
                );
                return None;
            }
        };

        let name = non_blank(self.name).unwrap_or_else(|| external_id.clone());
        let region = non_blank(self.region).unwrap_or_else(|| UNKNOWN_REGION.to_string());
        let logo_url = non_blank(self.img_url);

        let programmes = self
            .programmes
            .into_iter()
            .filter_map(|p| p.into_raw(&external_id, defaults))
            .collect();

        Some(ChannelRecord {
            external_id,
            name,
            region,
            logo_url,
            programmes,
        })
    }
}

impl IntermediateProgramme {
    fn into_raw(self, channel: &str, defaults: &IngestDefaults<'_>) -> Option<RawProgramme> {
        let Some(air_date_time) = non_blank(self.air_date_time) else {
            warn!("Channel {}: dropping programme {:?} without airDateTime", channel, self.title);
            return None;
        };

        let start = match parse_programme_time(&air_date_time, &defaults.timezone) {
            Ok(start) => start,
            Err(e) => {
                warn!("Channel {}: dropping programme {:?}: {}", channel, self.title, e);
                return None;
            }
        };

        let end = non_blank(self.end).and_then(|raw| {
            parse_programme_time(&raw, &defaults.timezone)
                .map_err(|e| warn!("Channel {}: ignoring end time: {}", channel, e))
                .ok()
        });

        let description = non_blank(self.desc).unwrap_or_else(|| defaults.description.to_string());
        let title = non_blank(self.title).unwrap_or_else(|| defaults.description.to_string());

        Some(RawProgramme {
            title,
            description,
            start,
            end,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// (De)serialize an optional string that may be wrapped in an array
mod one_or_many {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(value) => Some(value),
            OneOrMany::Many(values) => values.into_iter().next(),
            OneOrMany::Null(()) => None,
        })
    }

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => [value].serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLACEHOLDER: &str = "no info";

    fn defaults() -> IngestDefaults<'static> {
        IngestDefaults {
            timezone: chrono_tz::Europe::Athens,
            description: PLACEHOLDER,
        }
    }

    #[test]
    fn test_wrapped_and_plain_strings() {
        let json = r#"[
            {"id": ["channel-42"], "name": ["SKAI"], "region": ["Nationwide"],
             "img_url": ["https://example.org/skai.png"], "programmes": []},
            {"id": "channel-43", "name": "STAR", "region": "Attica-R-Z-9", "programmes": []}
        ]"#;
        let channels: Vec<IntermediateChannel> = serde_json::from_str(json).unwrap();

        assert_eq!(channels[0].id.as_deref(), Some("channel-42"));
        assert_eq!(channels[0].img_url.as_deref(), Some("https://example.org/skai.png"));
        assert_eq!(channels[1].name.as_deref(), Some("STAR"));
        assert_eq!(channels[1].img_url, None);
    }

    #[test]
    fn test_serializes_with_array_wrappers() {
        let channel = IntermediateChannel {
            id: Some("channel-7".to_string()),
            region: Some("Nationwide".to_string()),
            name: Some("ANT1".to_string()),
            img_url: None,
            programmes: vec![],
        };
        let value = serde_json::to_value(&channel).unwrap();
        assert_eq!(value["id"], serde_json::json!(["channel-7"]));
        assert_eq!(value["name"], serde_json::json!(["ANT1"]));
        assert!(value.get("img_url").is_none());
    }

    #[test]
    fn test_into_record_applies_defaults() {
        let json = r#"{"id": ["channel-9"], "programmes": [
            {"title": "[K8] Cartoons", "airDateTime": "20240115083000 +0200"},
            {"title": "   ", "desc": "", "airDateTime": "20240115093000"},
            {"title": "Broken", "airDateTime": "yesterday"},
            {"title": "Missing"}
        ]}"#;
        let channel: IntermediateChannel = serde_json::from_str(json).unwrap();
        let record = channel.into_record(&defaults()).unwrap();

        assert_eq!(record.external_id, "channel-9");
        assert_eq!(record.name, "channel-9");
        assert_eq!(record.region, UNKNOWN_REGION);
        assert_eq!(record.logo_url, None);
        assert_eq!(record.programmes.len(), 2);
        assert_eq!(record.programmes[0].title, "[K8] Cartoons");
        assert_eq!(record.programmes[0].description, PLACEHOLDER);
        assert_eq!(record.programmes[1].title, PLACEHOLDER);
        assert_eq!(
            record.programmes[1].start.format("%Y%m%d%H%M%S %z").to_string(),
            "20240115093000 +0200"
        );
    }

    #[test]
    fn test_record_without_id_is_dropped() {
        let channel: IntermediateChannel =
            serde_json::from_str(r#"{"id": [], "name": ["Orphan"]}"#).unwrap();
        assert!(channel.into_record(&defaults()).is_none());
    }

    #[test]
    fn test_unparsable_end_is_ignored() {
        let json = r#"{"id": "channel-1", "programmes": [
            {"title": "Late show", "airDateTime": "20240115230000 +0200", "end": "later"}
        ]}"#;
        let channel: IntermediateChannel = serde_json::from_str(json).unwrap();
        let record = channel.into_record(&defaults()).unwrap();
        assert_eq!(record.programmes.len(), 1);
        assert!(record.programmes[0].end.is_none());
    }
}
