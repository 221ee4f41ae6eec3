mod clip;
mod proj;
mod simplify;
mod wrap;

pub(crate) use clip::clip;
pub(crate) use proj::{project_x, project_y, unproject_x, unproject_y};
pub use simplify::simplify;
pub(crate) use wrap::wrap;
