mod bbox;
mod geom;
pub(crate) mod algorithm;

pub use bbox::BBox;
pub use geom::{Axis, VtFeature, VtGeometry, VtLineString, VtLinearRing, VtPoint};
