use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::collections::BTreeSet;
use tracing::debug;

use super::document::{ChannelDeclaration, ProgrammeEntry, VideoQuality, XmltvDocument};
use crate::config::XmltvConfig;
use crate::errors::AppResult;
use crate::models::{ChannelIdentity, ChannelRecord, Interval};
use crate::utils::time::{document_timestamp, format_xmltv_time, parse_timezone};

/// A channel ready for document assembly
#[derive(Debug, Clone)]
pub struct ChannelSchedule<'a> {
    pub record: &'a ChannelRecord,
    pub identity: &'a ChannelIdentity,
    pub intervals: Vec<Interval>,
}

/// Static document settings taken from [`XmltvConfig`]
#[derive(Debug, Clone)]
pub struct XmltvBuilder {
    timezone: Tz,
    programme_lang: String,
    channel_lang: String,
    source_info_name: String,
    generator_info_name: String,
    generator_info_url: String,
    dtd: String,
    rating_system: String,
}

impl XmltvBuilder {
    pub fn from_config(config: &XmltvConfig) -> AppResult<Self> {
        Ok(Self {
            timezone: parse_timezone(&config.timezone)?,
            programme_lang: config.programme_lang.clone(),
            channel_lang: config.channel_lang.clone(),
            source_info_name: config.source_info_name.clone(),
            generator_info_name: config.generator_info_name.clone(),
            generator_info_url: config.generator_info_url.clone(),
            dtd: config.dtd.clone(),
            rating_system: config.rating_system.clone(),
        })
    }

    /// Assemble a document.
    ///
    /// With a region filter only channels whose region is listed are included,
    /// each one in full. Channels keep their input order; an HD simulcast is
    /// declared right after its SD channel and each programme entry is
    /// followed by its HD copy.
    pub fn build(
        &self,
        channels: &[ChannelSchedule<'_>],
        region_filter: Option<&BTreeSet<String>>,
        generated_at: DateTime<Utc>,
    ) -> XmltvDocument {
        let mut declarations = Vec::new();
        let mut programmes = Vec::new();

        for schedule in channels {
            if let Some(filter) = region_filter
                && !filter.contains(&schedule.record.region)
            {
                debug!(
                    "Skipping channel {} (region {})",
                    schedule.record.name, schedule.record.region
                );
                continue;
            }

            let hd_id = schedule.identity.hd_id();
            declarations.extend(self.declarations(schedule.record, schedule.identity));

            for interval in &schedule.intervals {
                let entry = self.programme_entry(interval, &schedule.identity.assigned_id);
                let hd_entry = hd_id.map(|id| entry.hd_copy(id));
                programmes.push(entry);
                programmes.extend(hd_entry);
            }
        }

        XmltvDocument {
            date: document_timestamp(generated_at, &self.timezone),
            source_info_name: self.source_info_name.clone(),
            generator_info_name: self.generator_info_name.clone(),
            generator_info_url: self.generator_info_url.clone(),
            dtd: self.dtd.clone(),
            channels: declarations,
            programmes,
        }
    }

    fn declarations(
        &self,
        record: &ChannelRecord,
        identity: &ChannelIdentity,
    ) -> Vec<ChannelDeclaration> {
        let sd = ChannelDeclaration {
            id: identity.assigned_id.clone(),
            display_name: record.name.clone(),
            lang: self.channel_lang.clone(),
            icon: record.logo_url.clone(),
        };
        let hd = identity.hd_id().map(|hd_id| ChannelDeclaration {
            id: hd_id.to_string(),
            display_name: format!("{} HD", record.name),
            lang: self.channel_lang.clone(),
            icon: None,
        });
        std::iter::once(sd).chain(hd).collect()
    }

    fn programme_entry(&self, interval: &Interval, channel_id: &str) -> ProgrammeEntry {
        ProgrammeEntry {
            start: format_xmltv_time(&interval.start),
            stop: format_xmltv_time(&interval.stop),
            channel: channel_id.to_string(),
            title: interval.title.clone(),
            desc: interval.description.clone(),
            lang: self.programme_lang.clone(),
            quality: VideoQuality::Sdtv,
            rating_system: self.rating_system.clone(),
            rating: interval.rating.clone(),
        }
    }
}
