//! Batch export: intermediate JSON in, XMLTV out.
//!
//! One run loads every selected channel record, resolves stable ids through
//! the registry, normalizes each schedule and writes the full document. With
//! the regional option a second, region-filtered document is written from the
//! same schedules.

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::AppResult;
use crate::ingestor::{InputSelection, JsonLoader};
use crate::models::IngestDefaults;
use crate::registry::{CacheStatus, ChannelRegistry};
use crate::schedule::ScheduleNormalizer;
use crate::utils::time::{parse_time_of_day, parse_timezone};
use crate::xmltv::{ChannelSchedule, XmltvBuilder, XmltvDocument, write_document};

/// One document written by a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenDocument {
    pub path: PathBuf,
    pub channels: usize,
    pub programmes: usize,
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub input_channels: usize,
    pub cache_status: CacheStatus,
    pub documents: Vec<WrittenDocument>,
}

pub struct XmltvExporter {
    config: Config,
    timezone: Tz,
    day_end: NaiveTime,
}

impl XmltvExporter {
    pub fn new(config: Config) -> AppResult<Self> {
        let timezone = parse_timezone(&config.xmltv.timezone)?;
        let day_end = parse_time_of_day(&config.xmltv.broadcast_day_end)?;
        Ok(Self {
            config,
            timezone,
            day_end,
        })
    }

    /// Which input files the configured ingestion mode consumes
    pub fn input_selection(&self) -> InputSelection {
        let ingestion = &self.config.ingestion;
        if ingestion.multi_file {
            InputSelection::All
        } else {
            match &ingestion.input_file {
                Some(file) => InputSelection::File(PathBuf::from(file)),
                None => InputSelection::Newest,
            }
        }
    }

    pub fn run(&self, regional: bool) -> AppResult<ExportSummary> {
        self.run_at(regional, Utc::now())
    }

    /// Run with an explicit generation time for the document header
    pub fn run_at(&self, regional: bool, generated_at: DateTime<Utc>) -> AppResult<ExportSummary> {
        let started = Instant::now();
        let paths = &self.config.paths;
        let xmltv = &self.config.xmltv;

        let defaults = IngestDefaults {
            timezone: self.timezone,
            description: &xmltv.default_description,
        };
        let loader = JsonLoader::new(&paths.input_dir, &paths.input_extension, defaults);
        let channels = loader.load(&self.input_selection());
        if channels.is_empty() {
            warn!("No channel records loaded, the document will be empty");
        }

        let registry = ChannelRegistry::new(&paths.cache_file, xmltv.hd_channels.clone());
        let (identities, cache_status) = registry.resolve(&channels);

        let normalizer = ScheduleNormalizer::new(xmltv.default_rating.clone(), self.day_end);
        let mut seen = HashSet::new();
        let schedules: Vec<ChannelSchedule<'_>> = channels
            .iter()
            // Repeated external ids share one identity; only the first record is emitted
            .filter(|record| seen.insert(record.external_id.as_str()))
            .filter_map(|record| {
                let identity = identities.get(&record.external_id)?;
                Some(ChannelSchedule {
                    record,
                    identity,
                    intervals: normalizer.normalize(&record.programmes),
                })
            })
            .collect();

        let builder = XmltvBuilder::from_config(xmltv)?;
        let mut documents = Vec::new();

        let full = builder.build(&schedules, None, generated_at);
        documents.push(write(&full, paths.output_path())?);

        if regional {
            let subset = builder.build(&schedules, Some(&xmltv.regional_filter), generated_at);
            documents.push(write(&subset, paths.regional_output_path())?);
        }

        info!(
            "XMLTV export completed: input_channels={} cache={:?} documents={} duration={}",
            channels.len(),
            cache_status,
            documents.len(),
            humantime::format_duration(started.elapsed())
        );

        Ok(ExportSummary {
            input_channels: schedules.len(),
            cache_status,
            documents,
        })
    }
}

fn write(document: &XmltvDocument, path: PathBuf) -> AppResult<WrittenDocument> {
    let bytes = write_document(document, &path)?;
    info!(
        "Wrote {} ({} channels, {} programmes, {}KB)",
        path.display(),
        document.channels.len(),
        document.programmes.len(),
        bytes / 1024
    );
    Ok(WrittenDocument {
        path,
        channels: document.channels.len(),
        programmes: document.programmes.len(),
        bytes,
    })
}
