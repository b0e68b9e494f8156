//! Date and datetime recognition.
//!
//! Two interchangeable [`DateParser`] implementations exist: the
//! [`FixedFormatDateParser`] accepts ISO-8601 plus a closed list of explicit
//! layouts, and the [`FlexibleDateParser`] additionally understands RFC 2822,
//! month names and date-times written with slashes or dots. One of them is
//! chosen at startup and passed by reference to inference and validation.
//!
//! Every parser yields a [`NaiveDateTime`]. Values carrying a UTC offset are
//! converted to UTC first, so instants from mixed inputs stay comparable.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy)]
enum Layout {
    Date(&'static str),
    DateTime(&'static str),
    Zoned(&'static str),
}

impl Layout {
    fn parse(self, value: &str) -> Option<NaiveDateTime> {
        match self {
            Layout::Date(fmt) => NaiveDate::parse_from_str(value, fmt)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0)),
            Layout::DateTime(fmt) => NaiveDateTime::parse_from_str(value, fmt).ok(),
            Layout::Zoned(fmt) => DateTime::parse_from_str(value, fmt)
                .ok()
                .map(|dt| dt.naive_utc()),
        }
    }
}

const ISO_LAYOUTS: &[Layout] = &[
    Layout::Date("%Y-%m-%d"),
    Layout::DateTime("%Y-%m-%dT%H:%M:%S%.f"),
    Layout::DateTime("%Y-%m-%d %H:%M:%S%.f"),
    Layout::DateTime("%Y-%m-%dT%H:%M"),
    Layout::DateTime("%Y-%m-%d %H:%M"),
    Layout::Zoned("%Y-%m-%dT%H:%M:%S%.f%:z"),
    Layout::Zoned("%Y-%m-%d %H:%M:%S%.f%:z"),
];

/// Explicit layouts tried in order after ISO-8601.
const EXPLICIT_LAYOUTS: &[Layout] = &[
    Layout::DateTime("%Y-%m-%d %H:%M:%S"),
    Layout::DateTime("%Y-%m-%d %H:%M"),
    Layout::Date("%Y-%m-%d"),
    Layout::Date("%d.%m.%Y"),
    Layout::Date("%d/%m/%Y"),
    Layout::Date("%m/%d/%Y"),
    Layout::Date("%Y/%m/%d"),
    Layout::Date("%d-%m-%Y"),
    Layout::DateTime("%Y%m%dT%H%M%S"),
    Layout::Zoned("%Y-%m-%dT%H:%M:%S%z"),
    Layout::DateTime("%Y-%m-%dT%H:%M:%S"),
];

const FLEXIBLE_LAYOUTS: &[Layout] = &[
    Layout::DateTime("%d/%m/%Y %H:%M:%S"),
    Layout::DateTime("%m/%d/%Y %H:%M:%S"),
    Layout::DateTime("%d/%m/%Y %H:%M"),
    Layout::DateTime("%Y/%m/%d %H:%M:%S"),
    Layout::DateTime("%Y/%m/%d %H:%M"),
    Layout::DateTime("%d.%m.%Y %H:%M:%S"),
    Layout::DateTime("%d.%m.%Y %H:%M"),
    Layout::Date("%d %B %Y"),
    Layout::Date("%B %d, %Y"),
    Layout::Date("%B %d %Y"),
    Layout::Date("%d-%b-%Y"),
    Layout::Date("%Y-%b-%d"),
    Layout::DateTime("%d %B %Y %H:%M:%S"),
    Layout::DateTime("%B %d, %Y %H:%M:%S"),
    Layout::DateTime("%B %d %Y %H:%M:%S"),
    Layout::Date("%Y.%m.%d"),
    Layout::Date("%Y%m%d"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum DateParserKind {
    #[default]
    Flexible,
    Fixed,
}

impl DateParserKind {
    pub fn build(self) -> Box<dyn DateParser> {
        match self {
            DateParserKind::Flexible => Box::new(FlexibleDateParser),
            DateParserKind::Fixed => Box::new(FixedFormatDateParser),
        }
    }
}

impl fmt::Display for DateParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateParserKind::Flexible => write!(f, "flexible"),
            DateParserKind::Fixed => write!(f, "fixed"),
        }
    }
}

pub trait DateParser: fmt::Debug + Send + Sync {
    /// Returns the instant `value` denotes, or `None` when no supported layout
    /// matches. `value` is expected to be trimmed already.
    fn parse(&self, value: &str) -> Option<NaiveDateTime>;

    fn kind(&self) -> DateParserKind;

    fn is_datetime(&self, value: &str) -> bool {
        self.parse(value).is_some()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FixedFormatDateParser;

impl DateParser for FixedFormatDateParser {
    fn parse(&self, value: &str) -> Option<NaiveDateTime> {
        if !has_digit(value) {
            return None;
        }
        parse_iso8601(value).or_else(|| first_match(EXPLICIT_LAYOUTS, value))
    }

    fn kind(&self) -> DateParserKind {
        DateParserKind::Fixed
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FlexibleDateParser;

impl DateParser for FlexibleDateParser {
    fn parse(&self, value: &str) -> Option<NaiveDateTime> {
        if !has_digit(value) {
            return None;
        }
        DateTime::parse_from_rfc2822(value)
            .ok()
            .map(|dt| dt.naive_utc())
            .or_else(|| FixedFormatDateParser.parse(value))
            .or_else(|| first_match(FLEXIBLE_LAYOUTS, value))
    }

    fn kind(&self) -> DateParserKind {
        DateParserKind::Flexible
    }
}

pub fn parse_iso8601(value: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.naive_utc())
        .or_else(|| first_match(ISO_LAYOUTS, value))
}

/// Renders an instant as `YYYY-MM-DDTHH:MM:SS`, adding fractional seconds only
/// when present.
pub fn format_iso(value: &NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

fn first_match(layouts: &[Layout], value: &str) -> Option<NaiveDateTime> {
    layouts.iter().find_map(|layout| layout.parse(value))
}

fn has_digit(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
}
