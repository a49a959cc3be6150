//! Wire types for `POST /scrape/google/locals`.
//!
//! ## Request body
//! ```json
//! {"country": "BR", "domain": "com", "keyword": "maderera", "start": 40, "ll": "@-38.01,-57.76,11z"}
//! ```
//! `start` is a record offset, not a page number: page `i` is requested with
//! `start = 20 * i`.
//!
//! ## Response body
//! ```json
//! {"scrapingResult": {"locals": [ {...}, {...} ]}}
//! ```
//! Anything else the API wraps around `scrapingResult` (request metadata,
//! pagination hints) is ignored for decoding but preserved in
//! [`ScrapeResponse::raw`].

use locharvest_core::{PlaceRecord, SearchTarget};
use serde::Serialize;
use serde_json::Value;

use crate::pagination::page_offset;

/// JSON body for one page request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeRequest {
    pub country: String,
    pub domain: String,
    pub keyword: String,
    /// Record offset of the page.
    pub start: u32,
    /// Coordinate + zoom anchor.
    pub ll: String,
    /// Page index this request was built for; not sent.
    #[serde(skip)]
    pub page: u32,
}

impl ScrapeRequest {
    #[must_use]
    pub fn for_page(target: &SearchTarget, page: u32) -> Self {
        Self {
            country: target.country.clone(),
            domain: target.domain.clone(),
            keyword: target.query.clone(),
            start: page_offset(page),
            ll: target.coords.clone(),
            page,
        }
    }
}

/// One decoded page: the records in API (relevance) order plus the raw body
/// they were decoded from.
#[derive(Debug, Clone)]
pub struct ScrapeResponse {
    pub records: Vec<PlaceRecord>,
    pub raw: Value,
}
