mod index;
mod query;

pub use index::ClusterIndex;
