pub mod bolt;
pub mod merge;
pub mod validate;

pub use merge::{GraphMerger, GraphStats, ImportSummary};
pub use validate::{CleanEdge, CleanNode, clean_edges, clean_nodes};
