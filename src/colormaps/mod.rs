//! Colormap implementations for elevation rasters.
//!
//! Both ramps are pure functions over the unit interval; [`colorize`] applies
//! one to a whole normalized field.

pub mod colorize;
pub mod colormap;
pub mod linear;
pub mod rainbow;

pub use colorize::colorize;
pub use colormap::{get_colormap, Colormap, ColormapPolicy};

pub use linear::LinearRamp;
pub use rainbow::Rainbow;
