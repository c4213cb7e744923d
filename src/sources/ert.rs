//! ERT EPG collector
//!
//! The public broadcaster publishes one HTML programme page per channel at
//! `https://www.ert.gr/tv/program/<slug>/`. Each page carries the channel logo
//! inside the `broadcast` header and one `<article data-start-time=...>` per
//! programme with the title in a `section-title` element and the synopsis in
//! `fs-ms` elements.
//!
//! Channel ids are assigned by position in the configured slug list
//! (`channel-010`, `channel-020`, ...), so they do not depend on which pages
//! happened to load. Every channel belongs to the `National-public` region.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use tracing::{debug, info, warn};
use url::Url;

use super::EpgCollector;
use super::html::{Element, elements};
use crate::config::ErtConfig;
use crate::errors::{AppResult, SourceError, SourceResult};
use crate::models::{IntermediateChannel, IntermediateProgramme};
use crate::utils::http_client::{HttpClient, StandardHttpClient};
use crate::utils::time::{XMLTV_TIME_FORMAT, parse_programme_time};

/// Region every ERT channel is filed under
pub const ERT_REGION: &str = "National-public";

const ID_STEP: usize = 10;

pub struct ErtCollector<C> {
    client: C,
    base_url: Url,
    channels: Vec<String>,
    timezone: Tz,
    placeholder: String,
}

impl ErtCollector<StandardHttpClient> {
    pub fn from_config(config: &ErtConfig, timezone: Tz, placeholder: &str) -> AppResult<Self> {
        let client = StandardHttpClient::new(&config.user_agent, config.request_timeout()?)?;
        Ok(Self::with_client(
            client,
            &config.base_url,
            &config.channels,
            timezone,
            placeholder,
        )?)
    }
}

impl<C> ErtCollector<C> {
    pub fn with_client(
        client: C,
        base_url: &str,
        channels: &[String],
        timezone: Tz,
        placeholder: &str,
    ) -> SourceResult<Self> {
        // A base without a trailing slash would lose its last segment on join
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| SourceError::invalid_config("base_url", format!("{base_url}: {e}")))?;
        if channels.is_empty() {
            return Err(SourceError::invalid_config("channels", "no channel pages configured"));
        }
        Ok(Self {
            client,
            base_url,
            channels: channels.to_vec(),
            timezone,
            placeholder: placeholder.to_string(),
        })
    }

    fn page_url(&self, slug: &str) -> SourceResult<Url> {
        let path = format!("{}/", slug.trim_matches('/'));
        self.base_url
            .join(&path)
            .map_err(|e| SourceError::invalid_config("channels", format!("{slug}: {e}")))
    }

    /// Turn one programme page into a channel record.
    ///
    /// The name comes from the logo's `alt` text, falling back to the
    /// uppercased slug. Articles without a parsable start are skipped.
    pub fn parse_page(
        &self,
        page_url: &Url,
        slug: &str,
        id: &str,
        html: &str,
    ) -> IntermediateChannel {
        let logo = broadcast_logo(html);
        let name = logo
            .as_ref()
            .and_then(|img| img.attr("alt"))
            .map(|alt| alt.trim().to_string())
            .filter(|alt| !alt.is_empty())
            .unwrap_or_else(|| slug.to_uppercase());
        let img_url = logo
            .as_ref()
            .and_then(|img| img.attr("src"))
            .and_then(|src| {
                page_url
                    .join(src.trim())
                    .map(String::from)
                    .map_err(|e| debug!("Ignoring ERT logo path {}: {}", src, e))
                    .ok()
            });

        let programmes = elements(html, &["article"], 0)
            .iter()
            .filter_map(|article| self.programme(article))
            .collect();

        IntermediateChannel {
            id: Some(id.to_string()),
            region: Some(ERT_REGION.to_string()),
            name: Some(name),
            img_url,
            programmes,
        }
    }

    fn programme(&self, article: &Element<'_>) -> Option<IntermediateProgramme> {
        let start_raw = article.attr("data-start-time")?;
        let start = parse_programme_time(&start_raw, &self.timezone)
            .map_err(|e| warn!("Skipping ERT article: {}", e))
            .ok()?;
        let end: DateTime<Tz> = article
            .attr("data-end-time")
            .and_then(|raw| parse_programme_time(&raw, &self.timezone).ok())
            .unwrap_or(start);

        let inner = article.inner_html();
        let title = elements(inner, &["strong"], 0)
            .into_iter()
            .find(|strong| strong.class_contains("section-title"))
            .map(|strong| strong.text())
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| self.placeholder.clone());
        let desc = elements(inner, &["em", "span"], 0)
            .iter()
            .filter(|element| element.class_contains("fs-ms"))
            .map(Element::text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let desc = if desc.is_empty() {
            self.placeholder.clone()
        } else {
            desc
        };

        Some(IntermediateProgramme {
            title: Some(title),
            desc: Some(desc),
            air_date_time: Some(start.format(XMLTV_TIME_FORMAT).to_string()),
            end: Some(end.format(XMLTV_TIME_FORMAT).to_string()),
            start: Some(start.format("%H:%M").to_string()),
            date: Some(start.format("%Y%m%d").to_string()),
        })
    }
}

/// `channel-010`, `channel-020`, ... by position in the slug list
pub fn channel_id(position: usize) -> String {
    format!("channel-0{}", (position + 1) * ID_STEP)
}

/// First logo image after the `broadcast` header block
fn broadcast_logo(html: &str) -> Option<Element<'_>> {
    let header = elements(html, &["div"], 0)
        .into_iter()
        .find(|div| div.class_contains("broadcast"))?;
    elements(html, &["img"], header.start)
        .into_iter()
        .find(|img| img.attr("src").is_some_and(|src| src.contains("logo")))
}

#[async_trait]
impl<C> EpgCollector for ErtCollector<C>
where
    C: HttpClient + Send + Sync,
{
    fn name(&self) -> &'static str {
        "ert"
    }

    /// The pages list whatever ERT currently publishes; `date` is only logged
    async fn collect(&self, date: NaiveDate) -> SourceResult<Vec<IntermediateChannel>> {
        let mut records = Vec::with_capacity(self.channels.len());
        let mut last_error = None;

        for (position, slug) in self.channels.iter().enumerate() {
            let url = self.page_url(slug)?;
            match self.client.fetch_text(url.as_str()).await {
                Ok(html) => {
                    let record = self.parse_page(&url, slug, &channel_id(position), &html);
                    debug!(
                        "ERT page {} gave {} programmes",
                        slug,
                        record.programmes.len()
                    );
                    records.push(record);
                }
                Err(e) => {
                    warn!("Skipping ERT channel {}: {}", slug, e);
                    last_error = Some(e);
                }
            }
        }

        if records.is_empty()
            && let Some(e) = last_error
        {
            return Err(e);
        }

        info!(
            "Collected {} of {} ERT channels (requested for {})",
            records.len(),
            self.channels.len(),
            date
        );
        Ok(records)
    }
}
