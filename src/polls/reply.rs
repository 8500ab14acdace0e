//! Reply text and timestamp helpers.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};

/// Where quoted original content starts in a reply body.
const REPLY_BOUNDARIES: [&str; 4] = ["\n\nFrom:", "\n\n_____", "\n\nOn ", "\n\n>"];

/// Outlook renders received times in local time, 12- or 24-hour.
const OUTLOOK_FORMATS: [&str; 4] = [
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

/// Keep only the part of a reply the sender wrote, dropping the quoted original.
///
/// The body is cut at the earliest boundary marker that is not at the very start.
pub fn strip_quoted(body: &str) -> String {
    let body = body.replace("\r\n", "\n");
    let cut = REPLY_BOUNDARIES
        .iter()
        .filter_map(|marker| body.match_indices(marker).map(|(i, _)| i).find(|&i| i > 0))
        .min();

    match cut {
        Some(i) => body[..i].to_string(),
        None => body,
    }
}

/// Parse an RFC 3339 timestamp or an Outlook-style local time ("2/2/2026 03:17 PM").
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }

    OUTLOOK_FORMATS.iter().find_map(|fmt| {
        let naive = NaiveDateTime::parse_from_str(raw, fmt).ok()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.fixed_offset())
    })
}
