use crate::error::AppError;
use time::format_description::FormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

const COMPLETED_AT_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

const NAIVE_FORMATS: &[&[FormatItem<'static>]] = &[
    COMPLETED_AT_FORMAT,
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
    format_description!(
        "[month padding:none]/[day padding:none]/[year], [hour repr:12 padding:none]:[minute]:[second] [period]"
    ),
];

/// Source of the current time, replaceable in tests.
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(local_offset())
    }
}

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

pub fn epoch_millis(at: OffsetDateTime) -> u128 {
    u128::try_from(at.unix_timestamp_nanos() / 1_000_000).unwrap_or(0)
}

/// Renders a completion timestamp in the instant's own offset.
pub fn format_completed_at(at: OffsetDateTime) -> Result<String, AppError> {
    at.format(COMPLETED_AT_FORMAT)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

/// Parses a stored completion timestamp.
///
/// Accepts RFC 3339 and the naive local forms written by this crate or by
/// en-US locale formatting; naive values are read in `offset`.
pub fn parse_completed_at(raw: &str, offset: UtcOffset) -> Option<OffsetDateTime> {
    let normalized = raw.trim().replace(['\u{202f}', '\u{a0}'], " ");
    if normalized.is_empty() {
        return None;
    }

    if let Ok(parsed) = OffsetDateTime::parse(&normalized, &Rfc3339) {
        return Some(parsed);
    }

    NAIVE_FORMATS.iter().find_map(|format| {
        PrimitiveDateTime::parse(&normalized, format)
            .ok()
            .map(|naive| naive.assume_offset(offset))
    })
}
