//! In-memory nearest-neighbor indexes.
//!
//! [`VectorIndex`] is a flat, payload-parameterized store ranked by cosine
//! similarity. [`SegmentIndex`] holds one document's embedded segments;
//! [`ToolRegistryIndex`] holds every tool, keyed by its description.

pub mod filter;
pub mod registry;
pub mod segment_index;
pub mod store;
pub mod vector;

#[cfg(test)]
pub(crate) mod testing;

pub use filter::MetadataFilter;
pub use registry::ToolRegistryIndex;
pub use segment_index::{ScoredSegment, SegmentIndex, SummaryView};
pub use store::{IndexEntry, Scored, VectorIndex, embed_batched};
pub use vector::cosine_similarity;
