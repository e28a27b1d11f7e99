//! Pyramid chart: renderer-independent geometry and an SVG renderer for it.

pub mod geometry;
pub mod svg;

pub use geometry::{PyramidChart, pyramid};
pub use svg::render_svg;
