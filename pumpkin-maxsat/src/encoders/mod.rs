//! Cardinality encodings used to relax the cores found by the core-guided search.
mod incremental_totaliser;

pub use incremental_totaliser::EncodingError;
pub use incremental_totaliser::IncrementalTotaliser;
pub use incremental_totaliser::NodeId;
