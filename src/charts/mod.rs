//! Charts module - Chart series and PNG rendering

mod plotter;
mod renderer;

pub use plotter::{ChartPlotter, ChartSeries, PALETTE};
pub use renderer::{RenderError, StaticChartRenderer};
