//! What a harvest run searches for and how its pages are keyed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{ConfigError, CoreError};

/// Number of records the search API returns for a full page.
pub const PAGE_SIZE: usize = 20;

/// Immutable description of one search: where, what, and which Google
/// locale to query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTarget {
    /// Named search area, e.g. `mar_del_plata`.
    pub zone: String,
    /// Map anchor and zoom, e.g. `@-38.0174516,-57.7653418,11z`.
    pub coords: String,
    /// Search keyword.
    pub query: String,
    pub country: String,
    pub domain: String,
}

impl SearchTarget {
    /// Builds a target, rejecting a blank zone or query.
    ///
    /// The zone prefixes every checkpoint key and a blank one renders keys
    /// (`"_0"`) that cannot be parsed back.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if `zone` or `query` is empty or
    /// whitespace-only.
    pub fn new(
        zone: impl Into<String>,
        coords: impl Into<String>,
        query: impl Into<String>,
        country: impl Into<String>,
        domain: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let target = Self {
            zone: zone.into(),
            coords: coords.into(),
            query: query.into(),
            country: country.into(),
            domain: domain.into(),
        };
        for (name, value) in [("zone", &target.zone), ("query", &target.query)] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{name} must not be empty")));
            }
        }
        Ok(target)
    }
}

/// Half-open range of page indices `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    start: u32,
    end: u32,
}

impl PageRange {
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when `start >= end`, which would
    /// describe a run that can never fetch a page.
    pub fn new(start: u32, end: u32) -> Result<Self, ConfigError> {
        if start >= end {
            return Err(ConfigError::Validation(format!(
                "start page ({start}) must be lower than end page ({end})"
            )));
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub fn start(&self) -> u32 {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> u32 {
        self.end
    }

    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        (self.start..self.end).contains(&page)
    }
}

/// `(zone, page)` key of one page inside a checkpoint map.
///
/// Rendered as `"{zone}_{page}"`. Zones may themselves contain underscores,
/// so parsing splits at the last one. Ordering is by zone, then by numeric
/// page, which keeps `zone_2` ahead of `zone_10`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CheckpointKey {
    pub zone: String,
    pub page: u32,
}

impl CheckpointKey {
    #[must_use]
    pub fn new(zone: impl Into<String>, page: u32) -> Self {
        Self {
            zone: zone.into(),
            page,
        }
    }
}

impl fmt::Display for CheckpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.zone, self.page)
    }
}

impl FromStr for CheckpointKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (zone, page) = s
            .rsplit_once('_')
            .ok_or_else(|| CoreError::InvalidCheckpointKey(s.to_owned()))?;
        if zone.is_empty() {
            return Err(CoreError::InvalidCheckpointKey(s.to_owned()));
        }
        let page = page
            .parse::<u32>()
            .map_err(|_| CoreError::InvalidCheckpointKey(s.to_owned()))?;
        Ok(Self::new(zone, page))
    }
}

impl Serialize for CheckpointKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CheckpointKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Lower-cases `value` and replaces every run of non-alphanumeric characters
/// with a single `_`, for use in artifact file names.
#[must_use]
pub fn slug(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_sep = false;
    for ch in value.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}
