//! Telemetry extraction from the workload's free-form log output.
//!
//! The workload periodically prints a status line such as
//!
//! ```text
//! 2025/01/28 12:00:00 [STATS] Connecting: 3 | Connected: 42 | Up: 1.2MB/s | Down: 3.4MB/s | Uptime: 2h5m
//! ```
//!
//! Everything else in the log is ignored.

use crate::models::{Completeness, TelemetrySample};

/// Marker identifying telemetry lines.
pub const TELEMETRY_TAG: &str = "[STATS]";

const FIELD_DELIMITER: char = '|';

const CONNECTING: &str = "Connecting:";
const CONNECTED: &str = "Connected:";
const UPLOAD: &str = "Up:";
const DOWNLOAD: &str = "Down:";
const UPTIME: &str = "Uptime:";

/// Build a sample from the most recent tagged line in `lines`.
///
/// `lines` is ordered oldest to newest. Each field is read independently: a
/// missing or unreadable field takes its zero value and downgrades the
/// result to [`Completeness::Partial`] without affecting the others.
pub fn extract<S: AsRef<str>>(lines: &[S]) -> TelemetrySample {
    let Some(line) = lines
        .iter()
        .rev()
        .map(AsRef::as_ref)
        .find(|line| line.contains(TELEMETRY_TAG))
    else {
        return TelemetrySample::no_data();
    };

    let body = match line.find(TELEMETRY_TAG) {
        Some(idx) => &line[idx + TELEMETRY_TAG.len()..],
        None => line,
    };

    let connecting = field(body, CONNECTING).and_then(parse_count);
    let connected = field(body, CONNECTED).and_then(parse_count);
    let upload_rate = field(body, UPLOAD);
    let download_rate = field(body, DOWNLOAD);
    let uptime = field(body, UPTIME);

    let all_found = connecting.is_some()
        && connected.is_some()
        && upload_rate.is_some()
        && download_rate.is_some()
        && uptime.is_some();

    TelemetrySample {
        connecting: connecting.unwrap_or(0),
        connected: connected.unwrap_or(0),
        upload_rate: upload_rate.unwrap_or_default().to_string(),
        download_rate: download_rate.unwrap_or_default().to_string(),
        uptime: uptime.unwrap_or_default().to_string(),
        completeness: if all_found {
            Completeness::Full
        } else {
            Completeness::Partial
        },
    }
}

/// Convenience wrapper over a raw block of log text.
pub fn extract_text(text: &str) -> TelemetrySample {
    let lines: Vec<&str> = text.lines().collect();
    extract(&lines)
}

/// Locate `label` as a whole token and return its non-empty value, read up
/// to the next delimiter or end of line.
fn field<'a>(body: &'a str, label: &str) -> Option<&'a str> {
    let mut search_from = 0;
    while let Some(offset) = body[search_from..].find(label) {
        let start = search_from + offset;
        let at_boundary = body[..start]
            .chars()
            .next_back()
            .map_or(true, |c| {
                c.is_whitespace() || c == FIELD_DELIMITER || c == ']'
            });

        if at_boundary {
            let rest = &body[start + label.len()..];
            let end = rest.find(FIELD_DELIMITER).unwrap_or(rest.len());
            let value = rest[..end].trim();
            return (!value.is_empty()).then_some(value);
        }
        search_from = start + label.len();
    }
    None
}

fn parse_count(value: &str) -> Option<u64> {
    value.split_whitespace().next()?.parse().ok()
}
