//! Digea EPG collector
//!
//! The Digea site exposes three JSON endpoints under `/el/api/epg`:
//!
//! - `get-perioxes`: broadcast regions (`ee`, `pz1` .. `pz13`)
//! - `get-channels`: channel list with logo path and regional zone
//! - `get-events?date=YYYY-MM-DD`: every programme event of one day
//!
//! They are fetched one after the other and folded into intermediate channel
//! records. Region ids are translated to the region names used in the rest of
//! the pipeline (`pz9` -> `Attica-R-Z-9`).

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use url::Url;

use super::EpgCollector;
use crate::config::DigeaConfig;
use crate::errors::{AppResult, SourceError, SourceResult};
use crate::models::{IntermediateChannel, IntermediateProgramme, UNKNOWN_REGION};
use crate::utils::http_client::{HttpClient, StandardHttpClient};
use crate::utils::time::{XMLTV_TIME_FORMAT, parse_programme_time};

/// Digea region id -> region name
pub const REGION_NAMES: [(&str, &str); 13] = [
    ("ee", "Nationwide"),
    ("pz1", "E-Macedonia-Thrace-R-Z-1"),
    ("pz2_3", "C-Macedonia-R-Z-2-3"),
    ("pz4", "W-Macedonia-R-Z-4"),
    ("pz5", "W-Greece-R-Z-5"),
    ("pz6", "Peloponnese-R-Z-6"),
    ("pz7", "Thessaly-R-Z-7"),
    ("pz8", "C-Greece-R-Z-8"),
    ("pz9", "Attica-R-Z-9"),
    ("pz10", "Crete-R-Z-10"),
    ("pz11", "Dodecanese-Samos-R-Z-11"),
    ("pz12", "Cyclades-R-Z-12"),
    ("pz13", "NE-Aegean-R-Z-13"),
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DigeaRegion {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DigeaChannel {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub img: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub regional_zone_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DigeaEvent {
    #[serde(default, deserialize_with = "lenient_string")]
    pub channel_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub actual_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub long_synopsis: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub synopsis: Option<String>,
}

/// Ids come back as strings or numbers depending on the endpoint
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

pub struct DigeaCollector<C> {
    client: C,
    base_url: Url,
    api_prefix: String,
    timezone: Tz,
    placeholder: String,
}

impl DigeaCollector<StandardHttpClient> {
    pub fn from_config(config: &DigeaConfig, timezone: Tz, placeholder: &str) -> AppResult<Self> {
        let client = StandardHttpClient::new(&config.user_agent, config.request_timeout()?)?;
        Ok(Self::with_client(
            client,
            &config.base_url,
            &config.api_prefix,
            timezone,
            placeholder,
        )?)
    }
}

impl<C> DigeaCollector<C> {
    pub fn with_client(
        client: C,
        base_url: &str,
        api_prefix: &str,
        timezone: Tz,
        placeholder: &str,
    ) -> SourceResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| SourceError::invalid_config("base_url", format!("{base_url}: {e}")))?;
        Ok(Self {
            client,
            base_url,
            api_prefix: api_prefix.trim_end_matches('/').to_string(),
            timezone,
            placeholder: placeholder.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> SourceResult<Url> {
        let full = format!("{}/{}", self.api_prefix, path);
        self.base_url
            .join(&full)
            .map_err(|e| SourceError::invalid_config("api_prefix", format!("{full}: {e}")))
    }

    /// Fold the three API payloads into intermediate channel records.
    ///
    /// Channels keep API order. Channels without an id and events without a
    /// channel id or a parsable start are skipped.
    pub fn assemble(
        &self,
        regions: &[DigeaRegion],
        channels: &[DigeaChannel],
        events: &[DigeaEvent],
    ) -> Vec<IntermediateChannel> {
        let region_lookup = region_lookup(regions);

        let mut events_by_channel: HashMap<&str, Vec<&DigeaEvent>> = HashMap::new();
        for event in events {
            if let Some(channel_id) = event.channel_id.as_deref() {
                events_by_channel.entry(channel_id).or_default().push(event);
            }
        }

        channels
            .iter()
            .filter_map(|channel| {
                let id = channel.id.as_deref()?;
                let region = channel
                    .regional_zone_id
                    .as_deref()
                    .and_then(|zone| region_lookup.get(zone).cloned())
                    .unwrap_or_else(|| UNKNOWN_REGION.to_string());
                let programmes = self.programmes(
                    events_by_channel.get(id).map(Vec::as_slice).unwrap_or_default(),
                );

                Some(IntermediateChannel {
                    id: Some(format!("channel-{id}")),
                    region: Some(region),
                    name: Some(channel.name.clone().unwrap_or_default()),
                    img_url: channel.img.as_deref().and_then(|img| self.logo_url(img)),
                    programmes,
                })
            })
            .collect()
    }

    fn programmes(&self, events: &[&DigeaEvent]) -> Vec<IntermediateProgramme> {
        let mut ordered = events.to_vec();
        ordered.sort_by(|a, b| a.actual_time.cmp(&b.actual_time));

        ordered
            .into_iter()
            .filter_map(|event| {
                let start_raw = event.actual_time.as_deref()?;
                let start = parse_programme_time(start_raw, &self.timezone)
                    .map_err(|e| warn!("Skipping Digea event {:?}: {}", event.title, e))
                    .ok()?;
                let end = event
                    .end_time
                    .as_deref()
                    .and_then(|raw| parse_programme_time(raw, &self.timezone).ok())
                    .unwrap_or(start);

                let title = event.title.clone().unwrap_or_else(|| self.placeholder.clone());
                let desc = event
                    .long_synopsis
                    .clone()
                    .or_else(|| event.synopsis.clone())
                    .unwrap_or_else(|| self.placeholder.clone());

                Some(IntermediateProgramme {
                    title: Some(title),
                    desc: Some(desc),
                    air_date_time: Some(start.format(XMLTV_TIME_FORMAT).to_string()),
                    end: Some(end.format(XMLTV_TIME_FORMAT).to_string()),
                    start: Some(start.format("%H:%M").to_string()),
                    date: Some(start.format("%Y%m%d").to_string()),
                })
            })
            .collect()
    }

    fn logo_url(&self, img: &str) -> Option<String> {
        self.base_url
            .join(img)
            .map(String::from)
            .map_err(|e| debug!("Ignoring logo path {}: {}", img, e))
            .ok()
    }
}

/// Region id -> name for the regions the API reports; unknown ids map to
/// themselves
fn region_lookup(regions: &[DigeaRegion]) -> HashMap<String, String> {
    regions
        .iter()
        .filter_map(|region| region.id.as_deref())
        .map(|id| {
            let name = REGION_NAMES
                .iter()
                .find(|(slug, _)| *slug == id)
                .map(|(_, name)| name.to_string())
                .unwrap_or_else(|| id.to_string());
            (id.to_string(), name)
        })
        .collect()
}

#[async_trait]
impl<C> EpgCollector for DigeaCollector<C>
where
    C: HttpClient + Send + Sync,
{
    fn name(&self) -> &'static str {
        "digea"
    }

    async fn collect(&self, date: NaiveDate) -> SourceResult<Vec<IntermediateChannel>> {
        let regions: Vec<DigeaRegion> =
            self.client.fetch_json(self.endpoint("get-perioxes")?.as_str()).await?;
        debug!("Digea reported {} regions", regions.len());

        let channels: Vec<DigeaChannel> =
            self.client.fetch_json(self.endpoint("get-channels")?.as_str()).await?;
        debug!("Digea reported {} channels", channels.len());

        let events_path = format!("get-events?date={}", date.format("%Y-%m-%d"));
        let events: Vec<DigeaEvent> =
            self.client.fetch_json(self.endpoint(&events_path)?.as_str()).await?;

        let records = self.assemble(&regions, &channels, &events);
        info!(
            "Collected {} Digea channels with {} events for {}",
            records.len(),
            events.len(),
            date
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const REGIONS: &str = r#"[{"id": "ee"}, {"id": "pz9"}, {"id": "pz99"}]"#;
    const CHANNELS: &str = r#"[
        {"id": 1, "name": " SKAI ", "img": "/sites/default/files/skai.png", "regional_zone_id": "ee"},
        {"id": "2", "name": "Attica TV", "img": null, "regional_zone_id": "pz9"},
        {"id": 3, "name": "Mystery", "regional_zone_id": "pz99"},
        {"id": 4, "name": "Nowhere", "regional_zone_id": "zz"},
        {"name": "No id"}
    ]"#;
    const EVENTS: &str = r#"[
        {"channel_id": 1, "actual_time": "2024-01-15 09:30:00", "end_time": "2024-01-15 10:00:00",
         "title": "[K12] News", "long_synopsis": "", "synopsis": "Short"},
        {"channel_id": 1, "actual_time": "2024-01-15 08:00:00", "title": "Morning",
         "long_synopsis": "Long morning"},
        {"channel_id": 1, "actual_time": "bogus", "title": "Broken"},
        {"channel_id": 2, "actual_time": "2024-07-01T21:00:00+00:00", "title": ""},
        {"actual_time": "2024-01-15 08:00:00", "title": "Orphan"}
    ]"#;

    /// Serves canned payloads keyed by URL path and records requested URLs
    struct CannedClient {
        responses: HashMap<&'static str, &'static str>,
        requested: Mutex<Vec<String>>,
    }

    impl CannedClient {
        fn new() -> Self {
            Self {
                responses: HashMap::from([
                    ("/el/api/epg/get-perioxes", REGIONS),
                    ("/el/api/epg/get-channels", CHANNELS),
                    ("/el/api/epg/get-events", EVENTS),
                ]),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpClient for CannedClient {
        async fn fetch_text(&self, url: &str) -> SourceResult<String> {
            self.requested.lock().unwrap().push(url.to_string());
            let path = Url::parse(url).unwrap().path().to_string();
            self.responses
                .get(path.as_str())
                .map(|body| body.to_string())
                .ok_or(SourceError::Http {
                    status: 404,
                    url: url.to_string(),
                })
        }
    }

    fn collector() -> DigeaCollector<CannedClient> {
        DigeaCollector::with_client(
            CannedClient::new(),
            "https://www.digea.gr",
            "/el/api/epg",
            chrono_tz::Europe::Athens,
            "n/a",
        )
        .unwrap()
    }

    fn assemble_canned() -> Vec<IntermediateChannel> {
        let regions: Vec<DigeaRegion> = serde_json::from_str(REGIONS).unwrap();
        let channels: Vec<DigeaChannel> = serde_json::from_str(CHANNELS).unwrap();
        let events: Vec<DigeaEvent> = serde_json::from_str(EVENTS).unwrap();
        collector().assemble(&regions, &channels, &events)
    }

    #[test]
    fn test_assemble_maps_regions_and_logos() {
        let records = assemble_canned();

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].id.as_deref(), Some("channel-1"));
        assert_eq!(records[0].name.as_deref(), Some("SKAI"));
        assert_eq!(records[0].region.as_deref(), Some("Nationwide"));
        assert_eq!(
            records[0].img_url.as_deref(),
            Some("https://www.digea.gr/sites/default/files/skai.png")
        );

        assert_eq!(records[1].region.as_deref(), Some("Attica-R-Z-9"));
        assert_eq!(records[1].img_url, None);
        assert_eq!(records[2].region.as_deref(), Some("pz99"));
        assert_eq!(records[3].region.as_deref(), Some(UNKNOWN_REGION));
        assert!(records[3].programmes.is_empty());
    }

    #[test]
    fn test_assemble_orders_and_formats_programmes() {
        let records = assemble_canned();
        let skai = &records[0].programmes;

        assert_eq!(skai.len(), 2);
        assert_eq!(skai[0].title.as_deref(), Some("Morning"));
        assert_eq!(skai[0].desc.as_deref(), Some("Long morning"));
        assert_eq!(skai[0].air_date_time.as_deref(), Some("20240115080000 +0200"));
        // No end_time: the end falls back to the start
        assert_eq!(skai[0].end.as_deref(), Some("20240115080000 +0200"));
        assert_eq!(skai[0].start.as_deref(), Some("08:00"));
        assert_eq!(skai[0].date.as_deref(), Some("20240115"));

        assert_eq!(skai[1].title.as_deref(), Some("[K12] News"));
        assert_eq!(skai[1].desc.as_deref(), Some("Short"));
        assert_eq!(skai[1].end.as_deref(), Some("20240115100000 +0200"));
    }

    #[test]
    fn test_offset_times_are_converted_to_local_zone() {
        let records = assemble_canned();
        let attica = &records[1].programmes;

        assert_eq!(attica.len(), 1);
        assert_eq!(attica[0].air_date_time.as_deref(), Some("20240702000000 +0300"));
        assert_eq!(attica[0].date.as_deref(), Some("20240702"));
        assert_eq!(attica[0].title.as_deref(), Some("n/a"));
        assert_eq!(attica[0].desc.as_deref(), Some("n/a"));
    }

    #[tokio::test]
    async fn test_collect_fetches_endpoints_in_order() {
        let collector = collector();
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

        let records = collector.collect(date).await.unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(collector.name(), "digea");

        let requested = collector.client.requested.lock().unwrap().clone();
        assert_eq!(
            requested,
            vec![
                "https://www.digea.gr/el/api/epg/get-perioxes",
                "https://www.digea.gr/el/api/epg/get-channels",
                "https://www.digea.gr/el/api/epg/get-events?date=2024-01-15",
            ]
        );
    }

    #[tokio::test]
    async fn test_collect_surfaces_http_errors() {
        let mut client = CannedClient::new();
        client.responses.remove("/el/api/epg/get-channels");
        let collector = DigeaCollector::with_client(
            client,
            "https://www.digea.gr",
            "/el/api/epg/",
            chrono_tz::Europe::Athens,
            "n/a",
        )
        .unwrap();

        let err = collector
            .collect(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Http { status: 404, .. }));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = DigeaCollector::with_client(
            CannedClient::new(),
            "not a url",
            "/el/api/epg",
            chrono_tz::Europe::Athens,
            "n/a",
        );
        assert!(matches!(result, Err(SourceError::InvalidConfig { .. })));
    }
}
