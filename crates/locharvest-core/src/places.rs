//! Business records returned by the local-results search endpoint.
//!
//! Only the fields the final dataset projects are modelled explicitly. Every
//! other key the API sends (`position`, `dataId`, `reviews`, thumbnails, ...)
//! is kept in [`PlaceRecord::extra`] so a checkpoint written from a record is
//! as complete as the raw page it came from.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Latitude/longitude pair as sent in `gpsCoordinates`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A single business listing.
///
/// All modelled fields are optional: listings routinely omit a website,
/// phone, rating or schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Unique business identifier; the deduplication key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_coordinates: Option<GpsCoordinates>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Business category, sent as `type`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,

    /// Per-day opening schedule. Kept as raw JSON because its shape varies
    /// between listings (day map, list of ranges, free text).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlaceRecord {
    /// Returns the `placeId`, treating an empty string as absent.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.place_id.as_deref().filter(|id| !id.is_empty())
    }
}
