//! Time utilities for timezone resolution and XMLTV timestamp handling
//!
//! All programme times are interpreted as civil time in a single named zone
//! (`Europe/Athens` by default). Using the IANA rules from `chrono-tz` rather
//! than a fixed UTC delta keeps the offsets right on both sides of a
//! daylight-saving transition.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::errors::{AppError, AppResult};

/// XMLTV timestamp layout, e.g. `20240101083000 +0200`
pub const XMLTV_TIME_FORMAT: &str = "%Y%m%d%H%M%S %z";

/// Layout of the `date` attribute on the `<tv>` root element
pub const DOCUMENT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static FIXED_OFFSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-])(\d{2}):?(\d{2})$").expect("valid offset regex"));

/// Resolve a named IANA timezone such as `Europe/Athens`
pub fn parse_timezone(tz_str: &str) -> AppResult<Tz> {
    tz_str.trim().parse::<Tz>().map_err(|_| {
        if FIXED_OFFSET_RE.is_match(tz_str.trim()) {
            AppError::configuration(format!(
                "Fixed offset '{tz_str}' is not supported; use a named timezone (e.g. 'Europe/Athens') so DST rules apply"
            ))
        } else {
            AppError::configuration(format!("Invalid timezone: '{tz_str}'"))
        }
    })
}

/// Parse a wall-clock time like `06:00` or `06:00:00`
pub fn parse_time_of_day(value: &str) -> AppResult<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|e| AppError::configuration(format!("Invalid time of day '{value}': {e}")))
}

/// Parse an upstream programme timestamp into the local zone.
///
/// Timestamps carrying an offset are converted into `tz`; naive timestamps are
/// localized into it. Accepted layouts:
/// - `YYYYMMDDHHMMSS ±HHMM` (the intermediate feed format)
/// - `YYYYMMDDHHMMSS`
/// - RFC 3339 / `YYYY-MM-DD HH:MM:SS±HH:MM`
/// - `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DDTHH:MM:SS`
pub fn parse_programme_time(value: &str, tz: &Tz) -> AppResult<DateTime<Tz>> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::timestamp(value, "empty timestamp"));
    }

    if let Ok(dt) = DateTime::parse_from_str(value, XMLTV_TIME_FORMAT) {
        return Ok(dt.with_timezone(tz));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(tz));
    }
    for format in ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Ok(dt.with_timezone(tz));
        }
    }

    const NAIVE_FORMATS: [&str; 3] = ["%Y%m%d%H%M%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return localize(&naive, tz)
                .ok_or_else(|| AppError::timestamp(value, format!("not representable in {tz}")));
        }
    }

    Err(AppError::timestamp(value, "unrecognised timestamp layout"))
}

/// Localize a naive wall-clock time into `tz`.
///
/// Ambiguous times (the repeated hour when clocks go back) resolve to the
/// earlier instant; times inside a spring-forward gap are shifted forward by
/// the size of the gap.
pub fn localize(naive: &NaiveDateTime, tz: &Tz) -> Option<DateTime<Tz>> {
    if let Some(dt) = tz.from_local_datetime(naive).earliest() {
        return Some(dt);
    }
    debug!("Local time {} falls in a DST gap for {}, shifting", naive, tz);
    tz.from_local_datetime(&(*naive + Duration::hours(1))).earliest()
}

/// The first occurrence of `boundary` (wall-clock, in `start`'s zone) strictly
/// after `start`.
///
/// With the default 06:00 boundary a programme starting at 21:00 ends at 06:00
/// the next day, while one starting at 02:00 ends at 06:00 the same day.
pub fn next_boundary_after(start: &DateTime<Tz>, boundary: NaiveTime) -> DateTime<Tz> {
    let tz = start.timezone();
    let local = start.naive_local();
    let mut date: NaiveDate = local.date();
    if local.time() >= boundary {
        date = date.succ_opt().unwrap_or(date);
    }

    localize(&date.and_time(boundary), &tz).unwrap_or_else(|| *start + Duration::hours(24))
}

/// Format a timestamp the way XMLTV expects it
pub fn format_xmltv_time(dt: &DateTime<Tz>) -> String {
    dt.format(XMLTV_TIME_FORMAT).to_string()
}

/// Current time in `tz`, formatted for the `<tv date="...">` attribute
pub fn document_timestamp(now: DateTime<Utc>, tz: &Tz) -> String {
    now.with_timezone(tz).format(DOCUMENT_DATE_FORMAT).to_string()
}
