//! The pagination loop: fetch one page, checkpoint it, decide, wait, repeat.
//!
//! Strictly sequential: at most one request is in flight and the next page is
//! not requested until the previous one is durably recorded. Any fetch or
//! persistence error ends the run; nothing is persisted for the failed page.

use anyhow::Context;
use locharvest_core::{PageRange, PAGE_SIZE};
use locharvest_scraper::{
    LocalsClient, PageDecision, RateLimiter, ScrapeRequest, StopReason, TerminationPolicy,
};
use locharvest_store::{CheckpointMap, CheckpointStore};

/// Summary of one harvest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HarvestOutcome {
    /// Pages requested and recorded by this process.
    pub pages_fetched: u32,
    /// Records in those pages (not deduplicated).
    pub records: usize,
    /// Highest page index now in the checkpoint, if any.
    pub last_page: Option<u32>,
    pub stop_reason: StopReason,
}

/// Where a run begins given what the checkpoint already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StartPoint {
    Fetch(u32),
    Done(StopReason),
}

/// Picks the first page to fetch.
///
/// With an empty checkpoint this is `range.start`. With pages already stored
/// for `zone`, the run is complete if the last one was short or the next index
/// reaches `range.end`; otherwise it continues at the page right after the
/// last stored one. `range.start` does not apply then: jumping ahead would
/// leave a gap in the zone's page keys.
pub(crate) fn start_point(map: &CheckpointMap, zone: &str, range: PageRange) -> StartPoint {
    let Some((last, records)) = map.last_page(zone) else {
        return StartPoint::Fetch(range.start());
    };
    if records.len() < PAGE_SIZE {
        return StartPoint::Done(StopReason::AlreadyComplete);
    }
    let next = last.saturating_add(1);
    if next >= range.end() {
        return StartPoint::Done(StopReason::EndReached);
    }
    StartPoint::Fetch(next)
}

/// Fetches and records pages until the termination policy says stop.
///
/// # Errors
///
/// Returns the first fetch error (after retries) or persistence error, with
/// the page index in its context.
pub(crate) async fn run_pages(
    client: &LocalsClient,
    store: &mut CheckpointStore,
    range: PageRange,
    limiter: &RateLimiter,
) -> anyhow::Result<HarvestOutcome> {
    let target = store.target().clone();
    let mut outcome = HarvestOutcome {
        pages_fetched: 0,
        records: 0,
        last_page: store.map().last_page(&target.zone).map(|(page, _)| page),
        stop_reason: StopReason::AlreadyComplete,
    };

    let mut page = match start_point(store.map(), &target.zone, range) {
        StartPoint::Fetch(page) => page,
        StartPoint::Done(reason) => {
            tracing::info!(
                zone = %target.zone,
                query = %target.query,
                last_page = ?outcome.last_page,
                reason = %reason,
                "checkpoint already complete; nothing to fetch"
            );
            outcome.stop_reason = reason;
            return Ok(outcome);
        }
    };

    tracing::info!(
        zone = %target.zone,
        query = %target.query,
        start = page,
        end = range.end(),
        "starting harvest"
    );

    let policy = TerminationPolicy::new(range.end());
    loop {
        let request = ScrapeRequest::for_page(&target, page);
        let response = client
            .fetch_page(&request)
            .await
            .with_context(|| format!("failed to fetch page {page} for zone '{}'", target.zone))?;

        let count = response.records.len();
        store
            .record_page(page, &response.raw, response.records)
            .await
            .with_context(|| format!("failed to checkpoint page {page}"))?;

        outcome.pages_fetched += 1;
        outcome.records += count;
        outcome.last_page = Some(page);
        tracing::info!(
            zone = %target.zone,
            page,
            records = count,
            total_records = outcome.records,
            "page recorded"
        );

        match policy.decide(page, count) {
            PageDecision::Continue => {
                limiter.wait().await;
                page += 1;
            }
            PageDecision::Stop(reason) => {
                tracing::info!(
                    zone = %target.zone,
                    pages = outcome.pages_fetched,
                    records = outcome.records,
                    reason = %reason,
                    "harvest finished"
                );
                outcome.stop_reason = reason;
                return Ok(outcome);
            }
        }
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
