//! On-disk persistence for harvest runs: per-page raw responses, cumulative
//! checkpoint maps, tabular snapshots, and the final deduplicated dataset.

mod atomic;
pub mod aggregate;
pub mod checkpoint;
pub mod error;
pub mod layout;
pub mod log;
pub mod tabular;

pub use aggregate::{dedupe_by_place_id, AggregateSummary, Aggregator, MergedCheckpoints};
pub use checkpoint::{read_checkpoint, CheckpointMap, CheckpointStore};
pub use error::StoreError;
pub use layout::ArtifactLayout;
