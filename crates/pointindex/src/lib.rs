//! A static, flat-array KD-tree for 2D points.
//!
//! Built once in `O(n log n)` by in-place median partitioning, then queried
//! with inclusive axis-aligned boxes ([`KdTree::range`]) or Euclidean radii
//! ([`KdTree::within`]).  Queries report the insertion index of each match.

pub mod kdtree;

pub use kdtree::{KdTree, DEFAULT_NODE_SIZE};
