pub mod client;
pub mod error;
pub mod pagination;
pub mod rate_limit;
pub mod retry;
pub mod types;

pub use client::LocalsClient;
pub use error::ScraperError;
pub use pagination::{page_offset, PageDecision, StopReason, TerminationPolicy};
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;
pub use types::{ScrapeRequest, ScrapeResponse};
