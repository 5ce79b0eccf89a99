//! Contribution charts: ASCII for `predict`, Plotters for the TUI and SVG files.

pub mod ascii;
pub mod chart;
pub mod svg;

pub use ascii::render_contribution_bars;
pub use chart::{chart_bars, draw_contributions, Bar, ChartStyle};
pub use svg::{write_attribution_svg, SVG_SIZE};
