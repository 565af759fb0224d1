//! Typed, ordered feature domains for schedulable items.
//!
//! A [`Feature`] is a named, ordered, duplicate-free domain of values. Items
//! (see [`crate::item`]) carry one value per feature. Two value shapes exist:
//! scalar atoms (a course code, a section identifier) and sets of atoms (the
//! weekday pattern of a meeting, the quarter-hour ticks its time range spans).
//! A set value is admitted by a domain exactly when each of its atoms is.

use std::fmt;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Nominal quantization frequency for meeting times, in minutes.
pub const DEFAULT_SLOT_MINUTES: u16 = 15;

/// Weekday tokens in calendar order, as they appear in schedule data.
pub const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Errors raised while building features or quantizing time ranges.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeatureError {
    #[error("malformed time range '{0}', expected 'HH:MM-HH:MM'")]
    InvalidTimeRange(String),

    #[error("time range '{0}' ends before it starts")]
    EmptyTimeRange(String),

    #[error("slot frequency must be a positive number of minutes")]
    InvalidFrequency,
}

/// A value drawn from (or validated against) a feature domain.
///
/// `Token` and `Tick` are atoms; `Tokens` and `Ticks` are sets of atoms used
/// for multi-valued features such as weekday patterns and time-slot spans.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FeatureValue {
    Token(String),
    Tick(u16),
    Tokens(Vec<String>),
    Ticks(Vec<u16>),
}

impl FeatureValue {
    pub fn token(value: impl Into<String>) -> Self {
        Self::Token(value.into())
    }

    pub fn tokens<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Tokens(values.into_iter().map(Into::into).collect())
    }

    pub fn ticks(values: impl IntoIterator<Item = u16>) -> Self {
        Self::Ticks(values.into_iter().collect())
    }

    /// True if this value is, or contains, the given atom.
    pub fn contains_atom(&self, atom: &FeatureValue) -> bool {
        match (self, atom) {
            (Self::Tokens(set), Self::Token(token)) => set.iter().any(|t| t == token),
            (Self::Ticks(set), Self::Tick(tick)) => set.contains(tick),
            _ => self == atom,
        }
    }

    fn admitted_by(&self, domain: &[FeatureValue]) -> bool {
        match self {
            Self::Tokens(set) => set
                .iter()
                .all(|t| domain.iter().any(|d| matches!(d, Self::Token(a) if a == t))),
            Self::Ticks(set) => set
                .iter()
                .all(|t| domain.iter().any(|d| matches!(d, Self::Tick(a) if a == t))),
            atom => domain.contains(atom),
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(t) => write!(f, "{t}"),
            Self::Tick(t) => write!(f, "t{t}"),
            Self::Tokens(ts) => write!(f, "{}", ts.join(" ")),
            Self::Ticks(ts) => {
                let rendered: Vec<String> = ts.iter().map(|t| format!("t{t}")).collect();
                write!(f, "{}", rendered.join(" "))
            }
        }
    }
}

/// A named, ordered, finite domain.
///
/// Equality and hashing cover `(name, domain)`, so two features with the same
/// name but different domains are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Feature {
    name: String,
    domain: Vec<FeatureValue>,
}

impl Feature {
    /// Creates a feature, dropping duplicate domain entries while preserving
    /// first-occurrence order.
    pub fn new(name: impl Into<String>, domain: Vec<FeatureValue>) -> Self {
        let mut deduped: Vec<FeatureValue> = Vec::with_capacity(domain.len());
        for value in domain {
            if !deduped.contains(&value) {
                deduped.push(value);
            }
        }
        Self {
            name: name.into(),
            domain: deduped,
        }
    }

    /// A course-code feature over the given catalog codes.
    pub fn course<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("course", codes.into_iter().map(FeatureValue::token).collect())
    }

    /// A section-identifier feature.
    pub fn section<I, S>(sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            "section",
            sections.into_iter().map(FeatureValue::token).collect(),
        )
    }

    /// The seven-day weekday feature.
    pub fn weekday() -> Self {
        Self::new(
            "weekday",
            WEEKDAYS.iter().map(|d| FeatureValue::token(*d)).collect(),
        )
    }

    /// A time-slot feature whose domain is every quarter-hour tick touched by
    /// any of the given `"HH:MM-HH:MM"` ranges, quantized at `minutes`.
    pub fn time_slots<S: AsRef<str>>(
        ranges: &[S],
        minutes: u16,
    ) -> Result<Self, FeatureError> {
        let mut ticks: Vec<u16> = Vec::new();
        for range in ranges {
            for tick in slots_for_time_range(range.as_ref(), minutes)? {
                if !ticks.contains(&tick) {
                    ticks.push(tick);
                }
            }
        }
        ticks.sort_unstable();
        Ok(Self::new(
            "slot",
            ticks.into_iter().map(FeatureValue::Tick).collect(),
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> &[FeatureValue] {
        &self.domain
    }

    /// True if the value (or each of its atoms) lies in this domain.
    pub fn admits(&self, value: &FeatureValue) -> bool {
        value.admitted_by(&self.domain)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.domain.first(), self.domain.last()) {
            (Some(first), Some(last)) => write!(f, "{}: [{first} ... {last}]", self.name),
            _ => write!(f, "{}: []", self.name),
        }
    }
}

/// Quantizes a `"HH:MM-HH:MM"` meeting time into the slot ticks it touches.
///
/// A tick covers `[k * minutes, (k + 1) * minutes)`; the range touches every
/// tick it overlaps, so `"10:00-10:50"` at 15 minutes yields ticks 40..=43.
pub fn slots_for_time_range(range: &str, minutes: u16) -> Result<Vec<u16>, FeatureError> {
    if minutes == 0 {
        return Err(FeatureError::InvalidFrequency);
    }
    let (start, end) = range
        .split_once('-')
        .ok_or_else(|| FeatureError::InvalidTimeRange(range.to_string()))?;
    let start = parse_clock(start.trim(), range)?;
    let end = parse_clock(end.trim(), range)?;
    if end <= start {
        return Err(FeatureError::EmptyTimeRange(range.to_string()));
    }
    let first = start / minutes;
    let last = (end - 1) / minutes;
    Ok((first..=last).collect())
}

fn parse_clock(clock: &str, range: &str) -> Result<u16, FeatureError> {
    let invalid = || FeatureError::InvalidTimeRange(range.to_string());
    let (hours, mins) = clock.split_once(':').ok_or_else(invalid)?;
    let hours: u16 = hours.trim().parse().map_err(|_| invalid())?;
    let mins: u16 = mins.trim().parse().map_err(|_| invalid())?;
    if hours > 23 || mins > 59 {
        return Err(invalid());
    }
    Ok(hours * 60 + mins)
}
