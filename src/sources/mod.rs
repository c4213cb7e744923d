//! Upstream EPG collectors
//!
//! A collector fetches one day of listings from a broadcaster and returns
//! them as intermediate channel records. [`write_export`] stores those
//! records in the input directory, where the generator picks them up.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::{AppResult, SourceResult};
use crate::models::IntermediateChannel;
use crate::utils::atomic_file::replace_file;

pub mod digea;
pub mod ert;
pub mod html;

pub use digea::DigeaCollector;
pub use ert::ErtCollector;

#[async_trait]
pub trait EpgCollector {
    /// Short name used in export file names
    fn name(&self) -> &'static str;

    /// Fetch the listings of `date`
    async fn collect(&self, date: NaiveDate) -> SourceResult<Vec<IntermediateChannel>>;
}

/// Write `channels` to `<dir>/<source>_<YYYY-MM-DDTHH-MM-SS>.json`
pub fn write_export(
    dir: &Path,
    source: &str,
    channels: &[IntermediateChannel],
    collected_at: DateTime<Utc>,
) -> AppResult<PathBuf> {
    let path = dir.join(format!(
        "{}_{}.json",
        source,
        collected_at.format("%Y-%m-%dT%H-%M-%S")
    ));

    let json = serde_json::to_vec_pretty(channels)?;
    replace_file(&path, &json)?;

    info!(
        "Exported {} {} channels to {}",
        channels.len(),
        source,
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IntermediateProgramme;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_write_export_produces_loader_input() {
        let dir = TempDir::new().unwrap();
        let channels = vec![IntermediateChannel {
            id: Some("channel-1".to_string()),
            region: Some("Nationwide".to_string()),
            name: Some("SKAI".to_string()),
            img_url: None,
            programmes: vec![IntermediateProgramme {
                title: Some("News".to_string()),
                desc: Some("Daily news".to_string()),
                air_date_time: Some("20240115083000 +0200".to_string()),
                end: Some("20240115093000 +0200".to_string()),
                start: Some("08:30".to_string()),
                date: Some("20240115".to_string()),
            }],
        }];
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 6, 5, 9).unwrap();

        let path = write_export(&dir.path().join("export"), "digea", &channels, at).unwrap();
        assert_eq!(path.file_name().unwrap(), "digea_2024-01-15T06-05-09.json");

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[0]["id"], serde_json::json!(["channel-1"]));
        assert_eq!(raw[0]["programmes"][0]["airDateTime"], "20240115083000 +0200");

        let back: Vec<IntermediateChannel> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, channels);
    }
}
