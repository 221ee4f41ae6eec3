//! Static KD-tree over 2D points, stored in flat arrays.
//!
//! # Structure
//!
//! The tree has no node records.  Points live in two parallel arrays:
//!
//! * `ids`: the original insertion index of each point
//! * `coords`: interleaved `x, y` pairs, `coords[2 * i..2 * i + 2]` belongs
//!   to `ids[i]`
//!
//! Construction partitions both arrays in place around medians, alternating
//! the split axis (X at the root, then Y, then X, ...).  A range
//! `left..=right` is an implicit node whose median sits at
//! `(left + right) / 2`; ranges of at most `node_size` points are leaves and
//! are scanned linearly.
//!
//! The tree is immutable once built.  There is no insertion or removal.

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default number of points in a leaf range.
pub const DEFAULT_NODE_SIZE: usize = 64;

/// Ranges longer than this use Floyd-Rivest sampling before partitioning.
const SAMPLE_THRESHOLD: usize = 600;

// ---------------------------------------------------------------------------
// KdTree
// ---------------------------------------------------------------------------

/// A static 2D KD-tree answering axis-aligned range and Euclidean radius
/// queries with the insertion indices of matching points.
#[derive(Clone, Debug)]
pub struct KdTree {
    node_size: usize,
    ids:       Vec<u32>,
    coords:    Vec<f64>,
}

impl KdTree {
    /// Build a tree over `points` with [`DEFAULT_NODE_SIZE`].
    ///
    /// The `n`-th point yielded by `points` is reported as id `n` by queries.
    pub fn new<I>(points: I) -> Self where I: IntoIterator<Item = [f64; 2]> {
        Self::with_node_size(points, DEFAULT_NODE_SIZE)
    }

    /// Build a tree over `points`, stopping subdivision at `node_size` points.
    ///
    /// Panics if `node_size` is zero or there are more than `u32::MAX` points.
    pub fn with_node_size<I>(points: I, node_size: usize) -> Self where I: IntoIterator<Item = [f64; 2]> {
        assert!(node_size > 0, "node_size must be positive");

        let mut coords = points.into_iter()
            .flat_map(|[x, y]| [x, y])
            .collect::<Vec<_>>();
        coords.shrink_to_fit();

        let len = coords.len() / 2;
        assert!(len <= u32::MAX as usize, "a KdTree holds at most u32::MAX points");

        let mut ids = (0..len as u32).collect::<Vec<_>>();
        if len > 0 {
            sort(&mut ids, &mut coords, node_size, 0, len - 1, 0);
        }

        Self { node_size, ids, coords }
    }

    /// Number of indexed points.
    #[inline] pub fn len(&self) -> usize { self.ids.len() }

    /// Check if the tree holds no points.
    #[inline] pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    /// Leaf size the tree was built with.
    #[inline] pub fn node_size(&self) -> usize { self.node_size }

    /// Iterate over `(id, [x, y])` pairs in tree order (not insertion order).
    pub fn iter(&self) -> impl Iterator<Item = (usize, [f64; 2])> + '_ {
        self.ids.iter()
            .zip(self.coords.chunks_exact(2))
            .map(|(&id, xy)| (id as usize, [xy[0], xy[1]]))
    }

    #[inline]
    fn coord(&self, i: usize, axis: usize) -> f64 { self.coords[2 * i + axis] }

    // -----------------------------------------------------------------------
    // Range queries
    // -----------------------------------------------------------------------

    /// Visit the id of every point with `min_x <= x <= max_x` and
    /// `min_y <= y <= max_y`.  Bounds are inclusive on all sides.
    pub fn range_with<F>(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64, mut visit: F)
    where F: FnMut(usize) {
        if self.is_empty() { return }

        let inside = |x: f64, y: f64| x >= min_x && x <= max_x && y >= min_y && y <= max_y;

        let mut stack = vec![(0, self.len() - 1, 0)];
        while let Some((left, right, axis)) = stack.pop() {
            // Leaf range: linear scan.
            if right - left <= self.node_size {
                for i in left..=right {
                    if inside(self.coord(i, 0), self.coord(i, 1)) { visit(self.ids[i] as usize) }
                }
                continue;
            }

            let m = (left + right) >> 1;
            let (x, y) = (self.coord(m, 0), self.coord(m, 1));
            if inside(x, y) { visit(self.ids[m] as usize) }

            let split = if axis == 0 { x } else { y };
            let (lo, hi) = if axis == 0 { (min_x, max_x) } else { (min_y, max_y) };

            if lo <= split { stack.push((left, m - 1, 1 - axis)) }
            if hi >= split { stack.push((m + 1, right, 1 - axis)) }
        }
    }

    /// Ids of every point inside the inclusive box `[min_x, max_x] × [min_y, max_y]`.
    pub fn range(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<usize> {
        let mut result = Vec::new();
        self.range_with(min_x, min_y, max_x, max_y, |id| result.push(id));
        result
    }

    /// Visit the id of every point whose Euclidean distance to `(qx, qy)` is
    /// at most `radius`.
    pub fn within_with<F>(&self, qx: f64, qy: f64, radius: f64, mut visit: F) where F: FnMut(usize) {
        if self.is_empty() { return }

        let r2 = radius * radius;
        let near = |x: f64, y: f64| sq_dist(x, y, qx, qy) <= r2;

        let mut stack = vec![(0, self.len() - 1, 0)];
        while let Some((left, right, axis)) = stack.pop() {
            if right - left <= self.node_size {
                for i in left..=right {
                    if near(self.coord(i, 0), self.coord(i, 1)) { visit(self.ids[i] as usize) }
                }
                continue;
            }

            let m = (left + right) >> 1;
            let (x, y) = (self.coord(m, 0), self.coord(m, 1));
            if near(x, y) { visit(self.ids[m] as usize) }

            let (split, q) = if axis == 0 { (x, qx) } else { (y, qy) };

            if q - radius <= split { stack.push((left, m - 1, 1 - axis)) }
            if q + radius >= split { stack.push((m + 1, right, 1 - axis)) }
        }
    }

    /// Ids of every point within `radius` of `(qx, qy)`.
    pub fn within(&self, qx: f64, qy: f64, radius: f64) -> Vec<usize> {
        let mut result = Vec::new();
        self.within_with(qx, qy, radius, |id| result.push(id));
        result
    }
}

#[inline]
fn sq_dist(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let dx = ax - bx;
    let dy = ay - by;
    dx * dx + dy * dy
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Recursively partition `left..=right` around its median on `axis`.
/// Recursion depth is `log2(len / node_size)`.
fn sort(ids: &mut [u32], coords: &mut [f64], node_size: usize, left: usize, right: usize, axis: usize) {
    if right - left <= node_size { return }

    // right - left >= 2 here, so left < m < right.
    let m = (left + right) >> 1;

    select(ids, coords, m, left, right, axis);

    sort(ids, coords, node_size, left, m - 1, 1 - axis);
    sort(ids, coords, node_size, m + 1, right, 1 - axis);
}

/// Rearrange `left..=right` so that the item at `k` is the one that would be
/// there if the range were sorted on `axis`, with smaller items before it
/// and larger items after it (Floyd-Rivest selection).
fn select(ids: &mut [u32], coords: &mut [f64], k: usize, mut left: usize, mut right: usize, axis: usize) {
    while right > left {
        if right - left > SAMPLE_THRESHOLD {
            let n = (right - left + 1) as f64;
            let m = (k - left + 1) as f64;
            let z = n.ln();
            let s = 0.5 * (2.0 * z / 3.0).exp();
            let sd = 0.5 * (z * s * (n - s) / n).sqrt() * if m - n / 2.0 < 0.0 { -1.0 } else { 1.0 };
            let new_left = (k as f64 - m * s / n + sd).floor().max(left as f64) as usize;
            let new_right = (k as f64 + (n - m) * s / n + sd).floor().min(right as f64) as usize;
            select(ids, coords, k, new_left, new_right, axis);
        }

        let t = coords[2 * k + axis];
        let mut i = left;
        let mut j = right;

        swap_item(ids, coords, left, k);
        if coords[2 * right + axis] > t { swap_item(ids, coords, left, right) }

        while i < j {
            swap_item(ids, coords, i, j);
            i += 1;
            j -= 1;
            while coords[2 * i + axis] < t { i += 1 }
            while coords[2 * j + axis] > t { j -= 1 }
        }

        if coords[2 * left + axis] == t {
            swap_item(ids, coords, left, j);
        } else {
            j += 1;
            swap_item(ids, coords, j, right);
        }

        if j <= k { left = j + 1 }
        if k <= j {
            let Some(next) = j.checked_sub(1) else { break };
            right = next;
        }
    }
}

#[inline]
fn swap_item(ids: &mut [u32], coords: &mut [f64], i: usize, j: usize) {
    ids.swap(i, j);
    coords.swap(2 * i, 2 * j);
    coords.swap(2 * i + 1, 2 * j + 1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize) -> Vec<[f64; 2]> {
        (0..n * n).map(|i| [(i % n) as f64, (i / n) as f64]).collect()
    }

    #[test]
    fn empty_tree_answers_nothing() {
        let tree = KdTree::new(std::iter::empty());
        assert!(tree.is_empty());
        assert!(tree.range(-1.0, -1.0, 1.0, 1.0).is_empty());
        assert!(tree.within(0.0, 0.0, 10.0).is_empty());
    }

    #[test]
    fn single_point() {
        let tree = KdTree::new([[0.5, 0.5]]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.range(0.5, 0.5, 0.5, 0.5), vec![0]);
        assert_eq!(tree.within(0.0, 0.0, 1.0), vec![0]);
        assert!(tree.within(0.0, 0.0, 0.5).is_empty());
    }

    #[test]
    fn select_places_median() {
        let mut coords = vec![5.0, 0.0, 1.0, 0.0, 4.0, 0.0, 2.0, 0.0, 3.0, 0.0];
        let mut ids = vec![0, 1, 2, 3, 4];
        select(&mut ids, &mut coords, 2, 0, 4, 0);
        assert_eq!(coords[4], 3.0);
        assert_eq!(ids[2], 4);
        assert!(coords[0] <= 3.0 && coords[2] <= 3.0);
        assert!(coords[6] >= 3.0 && coords[8] >= 3.0);
    }

    #[test]
    fn ids_follow_their_coordinates() {
        let points = grid(40);
        let tree = KdTree::with_node_size(points.clone(), 4);
        for (id, xy) in tree.iter() {
            assert_eq!(points[id], xy);
        }
    }

    #[test]
    fn range_on_grid_is_inclusive() {
        let tree = KdTree::with_node_size(grid(20), 3);
        let mut ids = tree.range(2.0, 3.0, 4.0, 5.0);
        ids.sort_unstable();
        let expected = [62, 63, 64, 82, 83, 84, 102, 103, 104];
        assert_eq!(ids, expected);
    }

    #[test]
    fn within_on_grid() {
        let tree = KdTree::with_node_size(grid(20), 3);
        let mut ids = tree.within(10.0, 10.0, 1.0);
        ids.sort_unstable();
        assert_eq!(ids, vec![190, 209, 210, 211, 230]);
    }

    #[test]
    fn duplicate_points_are_all_reported() {
        let tree = KdTree::with_node_size(vec![[1.0, 1.0]; 200], 8);
        assert_eq!(tree.within(1.0, 1.0, 0.0).len(), 200);
        assert_eq!(tree.range(1.0, 1.0, 1.0, 1.0).len(), 200);
    }

    #[test]
    #[should_panic(expected = "node_size must be positive")]
    fn zero_node_size_panics() {
        KdTree::with_node_size(grid(2), 0);
    }
}
