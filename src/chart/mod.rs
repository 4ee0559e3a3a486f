pub mod renderer;

pub use renderer::{render_chart, ChartImage, ChartStyle};
