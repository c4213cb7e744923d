//! Schedule normalization: turns a channel's programme starts into closed
//! intervals and separates the rating tag from each title.
//!
//! Feeds only carry reliable start times, so each programme runs until the
//! next one starts. The last programme of a channel ends at its explicit end
//! when one is present, otherwise at the next broadcast-day cutover
//! (06:00 local time unless configured).

use chrono::NaiveTime;
use regex::Regex;
use std::sync::LazyLock;

use crate::models::{Interval, RawProgramme};
use crate::utils::time::next_boundary_after;

/// `[TAG] rest of title`; the tag must be followed by whitespace and text,
/// which may span several lines
static RATING_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\[([^\]\s]+)\]\s+(\S.*)$").expect("valid rating tag regex")
});

#[derive(Debug, Clone)]
pub struct ScheduleNormalizer {
    default_rating: String,
    day_end: NaiveTime,
}

impl ScheduleNormalizer {
    pub fn new(default_rating: impl Into<String>, day_end: NaiveTime) -> Self {
        Self {
            default_rating: default_rating.into(),
            day_end,
        }
    }

    /// Derive intervals for one channel.
    ///
    /// Programmes are stably sorted by start first, so upstream order does not
    /// matter. Two programmes with the same start produce a zero-length
    /// interval for the first one.
    pub fn normalize(&self, programmes: &[RawProgramme]) -> Vec<Interval> {
        let mut ordered: Vec<&RawProgramme> = programmes.iter().collect();
        ordered.sort_by_key(|p| p.start);

        ordered
            .iter()
            .enumerate()
            .map(|(i, programme)| {
                let stop = match ordered.get(i + 1) {
                    Some(next) => next.start,
                    None => programme
                        .end
                        .filter(|end| *end > programme.start)
                        .unwrap_or_else(|| next_boundary_after(&programme.start, self.day_end)),
                };
                let (rating, title) = split_rating(&programme.title, &self.default_rating);

                Interval {
                    start: programme.start,
                    stop,
                    title,
                    rating,
                    description: programme.description.clone(),
                }
            })
            .collect()
    }
}

/// Split `"[K16] Breaking News"` into `("K16", "Breaking News")`.
///
/// Titles without a separable leading tag are kept whole and get
/// `default_rating`.
pub fn split_rating(title: &str, default_rating: &str) -> (String, String) {
    let title = title.trim();
    match RATING_TAG_RE.captures(title) {
        Some(caps) => (caps[1].to_string(), caps[2].trim_end().to_string()),
        None => (default_rating.to_string(), title.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Athens;
    use rstest::rstest;

    fn normalizer() -> ScheduleNormalizer {
        ScheduleNormalizer::new("K16", NaiveTime::from_hms_opt(6, 0, 0).unwrap())
    }

    fn programme(title: &str, y: i32, mo: u32, d: u32, h: u32, mi: u32) -> RawProgramme {
        RawProgramme {
            title: title.to_string(),
            description: format!("about {title}"),
            start: Athens.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap(),
            end: None,
        }
    }

    #[test]
    fn test_stop_borrows_next_start_and_last_runs_to_cutover() {
        let intervals = normalizer().normalize(&[
            programme("[K] Morning", 2024, 1, 15, 8, 0),
            programme("[K12] News", 2024, 1, 15, 9, 30),
        ]);

        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].start, Athens.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap());
        assert_eq!(intervals[0].stop, Athens.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap());
        assert_eq!(intervals[1].stop, Athens.with_ymd_and_hms(2024, 1, 16, 6, 0, 0).unwrap());
        assert_eq!(intervals[1].rating, "K12");
        assert_eq!(intervals[1].title, "News");
        assert_eq!(intervals[1].description, "about [K12] News");
    }

    #[test]
    fn test_unsorted_input_is_ordered() {
        let intervals = normalizer().normalize(&[
            programme("Late", 2024, 1, 15, 22, 0),
            programme("Early", 2024, 1, 15, 7, 0),
        ]);
        assert_eq!(intervals[0].title, "Early");
        assert_eq!(intervals[0].stop, intervals[1].start);
        assert_eq!(intervals[1].title, "Late");
    }

    #[test]
    fn test_after_midnight_programme_ends_same_morning() {
        let intervals = normalizer().normalize(&[programme("Night", 2024, 1, 16, 2, 0)]);
        assert_eq!(intervals[0].stop, Athens.with_ymd_and_hms(2024, 1, 16, 6, 0, 0).unwrap());
    }

    #[test]
    fn test_explicit_end_used_for_last_programme() {
        let mut last = programme("Film", 2024, 1, 15, 21, 0);
        last.end = Some(Athens.with_ymd_and_hms(2024, 1, 15, 23, 15, 0).unwrap());
        let intervals = normalizer().normalize(&[programme("News", 2024, 1, 15, 20, 0), last]);
        assert_eq!(intervals[1].stop, Athens.with_ymd_and_hms(2024, 1, 15, 23, 15, 0).unwrap());
    }

    #[test]
    fn test_explicit_end_not_after_start_is_ignored() {
        let mut last = programme("Film", 2024, 1, 15, 21, 0);
        last.end = Some(last.start);
        let intervals = normalizer().normalize(&[last]);
        assert_eq!(intervals[0].stop, Athens.with_ymd_and_hms(2024, 1, 16, 6, 0, 0).unwrap());
    }

    #[test]
    fn test_configured_cutover() {
        let normalizer = ScheduleNormalizer::new("K16", NaiveTime::from_hms_opt(5, 30, 0).unwrap());
        let intervals = normalizer.normalize(&[programme("Show", 2024, 7, 1, 23, 0)]);
        assert_eq!(intervals[0].stop, Athens.with_ymd_and_hms(2024, 7, 2, 5, 30, 0).unwrap());
    }

    #[test]
    fn test_empty_schedule() {
        assert!(normalizer().normalize(&[]).is_empty());
    }

    #[test]
    fn test_last_interval_across_dst_change_keeps_local_cutover() {
        // Clocks go forward at 03:00 on 2024-03-31
        let intervals = normalizer().normalize(&[programme("Late", 2024, 3, 30, 23, 0)]);
        let stop = intervals[0].stop;
        assert_eq!(stop.format("%Y%m%d%H%M%S %z").to_string(), "20240331060000 +0300");
    }

    #[rstest]
    #[case("[K16] Breaking News", "K16", "Breaking News")]
    #[case("[K] Cartoons  ", "K", "Cartoons")]
    #[case("[K12]   Spaced   out", "K12", "Spaced   out")]
    #[case("NoTagTitle", "K16", "NoTagTitle")]
    #[case("[K8]", "K16", "[K8]")]
    #[case("[K8]Glued", "K16", "[K8]Glued")]
    #[case("Title [K12] later", "K16", "Title [K12] later")]
    #[case("", "K16", "")]
    #[case("[K12] Line one\nLine two", "K12", "Line one\nLine two")]
    fn test_split_rating(#[case] input: &str, #[case] rating: &str, #[case] title: &str) {
        assert_eq!(
            split_rating(input, "K16"),
            (rating.to_string(), title.to_string())
        );
    }
}
