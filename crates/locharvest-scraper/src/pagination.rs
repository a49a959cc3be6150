//! Page-index pagination for the local-results endpoint.
//!
//! The API has no cursor and no total count. A page shorter than
//! [`PAGE_SIZE`] is taken to be the last one; otherwise the caller's
//! exclusive `end` bound stops the run.

use locharvest_core::PAGE_SIZE;

/// Record offset sent as `start` for `page`.
#[must_use]
pub fn page_offset(page: u32) -> u32 {
    #[allow(clippy::cast_possible_truncation)]
    let size = PAGE_SIZE as u32;
    page.saturating_mul(size)
}

/// Why a run stopped fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The page held fewer than a full page of records (possibly zero).
    ShortPage { records: usize },
    /// The next page index would reach the configured end bound.
    EndReached,
    /// A resumed run found its last stored page was already short.
    AlreadyComplete,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::ShortPage { records } => write!(f, "short page ({records} records)"),
            StopReason::EndReached => write!(f, "end page reached"),
            StopReason::AlreadyComplete => write!(f, "already complete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDecision {
    Continue,
    Stop(StopReason),
}

/// Stateless continue/stop decision made after each fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationPolicy {
    page_size: usize,
    end: u32,
}

impl TerminationPolicy {
    /// Policy with the API's fixed page size and an exclusive `end` page.
    #[must_use]
    pub fn new(end: u32) -> Self {
        Self {
            page_size: PAGE_SIZE,
            end,
        }
    }

    /// Decides whether to fetch the page after `page`, given that `page`
    /// returned `records` records.
    ///
    /// A short page wins over the end bound so the reported reason reflects
    /// the data when both apply.
    #[must_use]
    pub fn decide(&self, page: u32, records: usize) -> PageDecision {
        if records < self.page_size {
            return PageDecision::Stop(StopReason::ShortPage { records });
        }
        if page.saturating_add(1) >= self.end {
            return PageDecision::Stop(StopReason::EndReached);
        }
        PageDecision::Continue
    }
}
