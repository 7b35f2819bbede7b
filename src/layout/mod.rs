//! Layout context and height measurement

mod context;
pub mod font;
mod measure;
mod oracle;

pub use context::{
    mm_to_units, LayoutContext, LayoutProvider, Margins, PageDimensions, DEFAULT_FONT_SIZE,
    LINE_HEIGHT_FACTOR, PAGE_BREAK_BUFFER, UNITS_PER_INCH,
};
pub use font::FontMetrics;
pub use measure::MetricsOracle;
pub use oracle::{MeasurementOracle, StyleContext};
