//! CSV encoding of place records.
//!
//! Both the per-run snapshot and the final dataset use the same projection:
//! [`OUTPUT_COLUMNS`]. `gpsCoordinates` and `workingHours` are structured in
//! the API response and are written as compact JSON strings; consumers that
//! need the structure must parse those cells again. Absent values are empty
//! cells.

use csv::Writer;
use locharvest_core::PlaceRecord;

use crate::checkpoint::CheckpointMap;

pub const OUTPUT_COLUMNS: [&str; 9] = [
    "title",
    "address",
    "placeId",
    "website",
    "gpsCoordinates",
    "phone",
    "type",
    "rating",
    "workingHours",
];

/// Leading column of the per-run snapshot naming the page a row came from.
pub const KEY_COLUMN: &str = "key";

fn text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_owned()
}

/// Projects `record` onto [`OUTPUT_COLUMNS`].
#[must_use]
pub fn place_fields(record: &PlaceRecord) -> [String; 9] {
    let gps = record
        .gps_coordinates
        .as_ref()
        .and_then(|gps| serde_json::to_string(gps).ok())
        .unwrap_or_default();
    let hours = record
        .working_hours
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    let rating = record.rating.map(|r| r.to_string()).unwrap_or_default();

    [
        text(record.title.as_deref()),
        text(record.address.as_deref()),
        text(record.place_id.as_deref()),
        text(record.website.as_deref()),
        gps,
        text(record.phone.as_deref()),
        text(record.category.as_deref()),
        rating,
        hours,
    ]
}

fn finish(writer: Writer<Vec<u8>>) -> Result<Vec<u8>, csv::Error> {
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Encodes every record of `map` in key order, prefixed with its page key.
/// No deduplication is applied.
///
/// # Errors
///
/// Returns a `csv::Error` if encoding fails.
pub fn snapshot_csv(map: &CheckpointMap) -> Result<Vec<u8>, csv::Error> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(std::iter::once(KEY_COLUMN).chain(OUTPUT_COLUMNS))?;
    for (key, records) in map {
        let key = key.to_string();
        for record in records {
            writer.write_record(std::iter::once(key.clone()).chain(place_fields(record)))?;
        }
    }
    finish(writer)
}

/// Encodes `records` in the given order under [`OUTPUT_COLUMNS`].
///
/// # Errors
///
/// Returns a `csv::Error` if encoding fails.
pub fn dataset_csv<'a, I>(records: I) -> Result<Vec<u8>, csv::Error>
where
    I: IntoIterator<Item = &'a PlaceRecord>,
{
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(OUTPUT_COLUMNS)?;
    for record in records {
        writer.write_record(place_fields(record))?;
    }
    finish(writer)
}
