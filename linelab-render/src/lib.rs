pub mod layout;
pub mod raster;

pub use layout::{LineDraw, layout_trial, saturation_color};
pub use raster::{draw_lines, render_trial};
