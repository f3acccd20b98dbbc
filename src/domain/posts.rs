//! Publication rules and field limits for posts and tags.

use time::{
    Duration, OffsetDateTime, PrimitiveDateTime, format_description::FormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

use crate::domain::error::DomainError;

pub const POST_TITLE_MAX: usize = 150;
pub const POST_SLUG_MAX: usize = 150;
pub const TAG_TITLE_MAX: usize = 50;
pub const TAG_SLUG_MAX: usize = 50;

/// Window used by [`was_published_recently`].
pub const RECENT_WINDOW: Duration = Duration::days(1);

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] = format_description!(
    "[month repr:long] [day padding:none], [year], [hour]:[minute] UTC"
);

/// Value format of `<input type="datetime-local">`.
pub const FORM_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

const LOCAL_FORMATS: &[&[FormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
];

/// A post is visible to the public once its publish time is reached.
pub fn is_published_at(pub_date: OffsetDateTime, now: OffsetDateTime) -> bool {
    pub_date <= now
}

/// `now - 1 day <= pub_date <= now`, both bounds inclusive.
pub fn was_published_recently(pub_date: OffsetDateTime, now: OffsetDateTime) -> bool {
    now - RECENT_WINDOW <= pub_date && pub_date <= now
}

/// Parse a submitted publish date.
///
/// Accepts RFC 3339 or a zone-less `YYYY-MM-DD[T ]HH:MM[:SS]`, read as UTC.
pub fn parse_pub_date(raw: &str) -> Result<OffsetDateTime, DomainError> {
    let raw = raw.trim();
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }

    LOCAL_FORMATS
        .iter()
        .find_map(|format| PrimitiveDateTime::parse(raw, format).ok())
        .map(PrimitiveDateTime::assume_utc)
        .ok_or_else(|| DomainError::validation(format!("`{raw}` is not a valid date and time")))
}

pub fn format_human(value: OffsetDateTime) -> String {
    value
        .format(HUMAN_DATE_FORMAT)
        .unwrap_or_else(|_| value.to_string())
}

pub fn format_for_form(value: OffsetDateTime) -> String {
    value
        .to_offset(time::UtcOffset::UTC)
        .format(FORM_DATE_FORMAT)
        .unwrap_or_default()
}
