//! Text and date helpers shared by the content API and the admin shell.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\s]").expect("static regex"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));
static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static regex"));
static IMG_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img.*?src="(.*?)""#).expect("static regex"));

/// URL-friendly slug: lowercase, punctuation dropped, whitespace runs become `-`.
pub fn generate_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    WHITESPACE_RUN.replace_all(&stripped, "-").into_owned()
}

/// Parses the ISO-8601 shapes the site stores: full RFC 3339 timestamps,
/// zone-less date-times (read as UTC), and bare dates (midnight UTC).
pub fn parse_iso(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `Jan 5, 2025`, or `Jan 5, 2025 3:07 PM` with `show_time`.
pub fn format_date(dt: &DateTime<Utc>, show_time: bool) -> String {
    if show_time {
        dt.format("%b %-d, %Y %-I:%M %p").to_string()
    } else {
        dt.format("%b %-d, %Y").to_string()
    }
}

/// Strictly after now.
pub fn is_upcoming(dt: &DateTime<Utc>) -> bool {
    *dt > Utc::now()
}

/// A deadline that has passed. No deadline never expires.
pub fn is_deadline_expired(deadline: Option<&DateTime<Utc>>) -> bool {
    deadline.is_some_and(|dt| *dt < Utc::now())
}

/// Cuts to `max_chars` characters and appends `...` when the text is longer.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn html_to_plain_text(html: &str) -> String {
    HTML_TAG.replace_all(html, "").into_owned()
}

/// First `<img src="...">` in the content, or `fallback`.
pub fn content_image(content: &str, fallback: &str) -> String {
    IMG_SRC
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| fallback.to_string())
}

/// Joins a form's date and optional time fields into `<date>T<time>`,
/// defaulting the time to midnight.
pub fn combine_date_time(date: &str, time: Option<&str>) -> String {
    let time = time.map(str::trim).filter(|t| !t.is_empty()).unwrap_or("00:00");
    format!("{}T{}", date.trim(), time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn slug_drops_punctuation_and_joins_words() {
        assert_eq!(generate_slug("Hello, World!"), "hello-world");
        assert_eq!(generate_slug("Tree  Planting   Drive 2025"), "tree-planting-drive-2025");
        assert_eq!(generate_slug("snake_case stays"), "snake_case-stays");
    }

    #[test]
    fn formats_dates_with_and_without_time() {
        let dt = Utc.with_ymd_and_hms(2025, 1, 5, 15, 7, 0).unwrap();
        assert_eq!(format_date(&dt, false), "Jan 5, 2025");
        assert_eq!(format_date(&dt, true), "Jan 5, 2025 3:07 PM");
        let morning = parse_iso("2025-11-20T09:30").unwrap();
        assert_eq!(format_date(&morning, true), "Nov 20, 2025 9:30 AM");
    }

    #[test]
    fn unparseable_dates_are_rejected() {
        assert_eq!(parse_iso(""), None);
        assert_eq!(parse_iso("next tuesday"), None);
        assert_eq!(
            parse_iso("2025-01-05"),
            Some(Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn upcoming_and_expired_compare_against_now() {
        let future = Utc::now() + Duration::days(3);
        let past = Utc::now() - Duration::days(3);
        assert!(is_upcoming(&future));
        assert!(!is_upcoming(&past));
        assert!(is_deadline_expired(Some(&past)));
        assert!(!is_deadline_expired(Some(&future)));
        assert!(!is_deadline_expired(None));
    }

    #[test]
    fn truncation_is_char_based() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdef", 3), "abc...");
        assert_eq!(truncate_text("ñandú rojo", 5), "ñandú...");
    }

    #[test]
    fn strips_tags_and_finds_images() {
        assert_eq!(html_to_plain_text("<p>Hi <b>there</b></p>"), "Hi there");
        let html = r#"<p>x</p><img class="a" src="https://cdn/x.png" alt="">"#;
        assert_eq!(content_image(html, "/fallback.png"), "https://cdn/x.png");
        assert_eq!(content_image("<p>none</p>", "/fallback.png"), "/fallback.png");
    }

    #[test]
    fn date_and_time_are_combined() {
        assert_eq!(combine_date_time("2025-03-01", Some("18:30")), "2025-03-01T18:30");
        assert_eq!(combine_date_time("2025-03-01", Some("")), "2025-03-01T00:00");
        assert_eq!(combine_date_time("2025-03-01", None), "2025-03-01T00:00");
        assert_eq!(
            parse_iso(&combine_date_time("2025-03-01", None)),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap())
        );
    }
}
