//! Page geometry and the derived layout quantities

use serde::{Deserialize, Serialize};

use super::StyleContext;

/// Layout units per inch
pub const UNITS_PER_INCH: f32 = 96.0;

const MM_PER_INCH: f32 = 25.4;

/// Line height as a multiple of font size
pub const LINE_HEIGHT_FACTOR: f32 = 1.15;

pub const DEFAULT_FONT_SIZE: f32 = 16.0;

/// Space held back at the bottom of every page (about four lines)
pub const PAGE_BREAK_BUFFER: f32 = 48.0;

/// Convert millimetres to whole layout units
pub fn mm_to_units(mm: f32) -> f32 {
    (mm * UNITS_PER_INCH / MM_PER_INCH).floor()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageDimensions {
    pub width: f32,
    pub height: f32,
}

impl Default for PageDimensions {
    fn default() -> Self {
        // A4
        Self {
            width: mm_to_units(210.0),
            height: mm_to_units(297.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Margins {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Margins {
    pub fn uniform(size: f32) -> Self {
        Self {
            top: size,
            bottom: size,
            left: size,
            right: size,
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(UNITS_PER_INCH)
    }
}

/// Layout constants every reflow operation is computed against.
///
/// A value type: a resize or font change produces a new context rather
/// than mutating the current one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutContext {
    pub font_size: f32,
    pub page: PageDimensions,
    pub margins: Margins,
    pub break_buffer: f32,
}

impl Default for LayoutContext {
    fn default() -> Self {
        Self::a4()
    }
}

impl LayoutContext {
    /// A4 page, 1 inch margins, default font size
    pub fn a4() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            page: PageDimensions::default(),
            margins: Margins::default(),
            break_buffer: PAGE_BREAK_BUFFER,
        }
    }

    /// Read a (possibly partial) JSON object; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_font_size(self, font_size: f32) -> Self {
        Self { font_size, ..self }
    }

    pub fn with_page(self, page: PageDimensions) -> Self {
        Self { page, ..self }
    }

    pub fn line_height(&self) -> f32 {
        (self.font_size * LINE_HEIGHT_FACTOR).ceil()
    }

    /// Height available to content on one page.
    ///
    /// Independent of font size; only the line height follows the font.
    pub fn max_content_height(&self) -> f32 {
        self.page.height - (self.margins.top + self.margins.bottom + self.break_buffer)
    }

    pub fn content_width(&self) -> f32 {
        self.page.width - self.margins.left - self.margins.right
    }

    /// Whole lines that fit on a page (line-number gutter length)
    pub fn max_lines(&self) -> usize {
        let line_height = self.line_height();
        if line_height <= 0.0 {
            return 0;
        }
        (self.max_content_height() / line_height).floor().max(0.0) as usize
    }

    /// Style handed to the measurement oracle
    pub fn style(&self) -> StyleContext {
        StyleContext {
            font_size: self.font_size,
            line_height: self.line_height(),
            content_width: self.content_width(),
        }
    }
}

/// Source of the current page geometry, consulted on container resize
pub trait LayoutProvider {
    fn layout_context(&self) -> LayoutContext;
}

impl LayoutProvider for LayoutContext {
    fn layout_context(&self) -> LayoutContext {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_defaults() {
        let layout = LayoutContext::a4();
        assert_eq!(layout.page.width, 793.0);
        assert_eq!(layout.page.height, 1122.0);
        assert_eq!(layout.margins, Margins::uniform(96.0));
        assert_eq!(layout.break_buffer, 48.0);
    }

    #[test]
    fn test_derived_quantities() {
        let layout = LayoutContext::a4();
        assert_eq!(layout.line_height(), 19.0);
        assert_eq!(layout.max_content_height(), 882.0);
        assert_eq!(layout.content_width(), 601.0);
        assert_eq!(layout.max_lines(), 46);
    }

    #[test]
    fn test_capacity_ignores_font_size() {
        let small = LayoutContext::a4().with_font_size(10.0);
        let large = LayoutContext::a4().with_font_size(32.0);
        assert_eq!(small.max_content_height(), large.max_content_height());
        assert!(small.max_lines() > large.max_lines());
    }

    #[test]
    fn test_partial_json() {
        let layout = LayoutContext::from_json(r#"{"fontSize": 12, "margins": {"top": 50}}"#).unwrap();
        assert_eq!(layout.font_size, 12.0);
        assert_eq!(layout.margins.top, 50.0);
        assert_eq!(layout.margins.bottom, 96.0);
        assert_eq!(layout.page.height, 1122.0);
    }
}
