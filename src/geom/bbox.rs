use super::Axis;

/// An axis-aligned bounding box in projected `[0, 1]²` space.
///
/// The default box is empty (inverted, `min > max`) so that extending it by
/// the first point yields that point's box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for BBox {
    fn default() -> Self { Self::EMPTY }
}

impl BBox {
    /// The empty box; the identity for [`BBox::union`].
    pub const EMPTY: Self = Self {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    /// Construct a box from its corners.
    #[inline]
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Check if the box contains no points.
    #[inline] pub fn is_empty(&self) -> bool { self.min_x > self.max_x || self.min_y > self.max_y }

    /// Lower bound on `axis`.
    #[inline]
    pub fn min(&self, axis: Axis) -> f64 {
        match axis { Axis::X => self.min_x, Axis::Y => self.min_y }
    }

    /// Upper bound on `axis`.
    #[inline]
    pub fn max(&self, axis: Axis) -> f64 {
        match axis { Axis::X => self.max_x, Axis::Y => self.max_y }
    }

    /// Grow the box to include `(x, y)`.
    #[inline]
    pub fn extend(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// The smallest box containing both boxes.
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Translate the box along X.
    #[inline]
    pub(crate) fn shift_x(&mut self, offset: f64) {
        self.min_x += offset;
        self.max_x += offset;
    }
}
