//! Font metrics for the built-in oracle

use super::LINE_HEIGHT_FACTOR;

/// Advance width of a monospace glyph relative to the font size
const MONOSPACE_ADVANCE: f32 = 0.6;

/// Metrics needed for text layout
#[derive(Debug, Clone)]
pub struct FontMetrics {
    /// Line height in layout units
    pub line_height: f32,
    /// Width of ASCII characters (0-127)
    pub char_widths: Vec<f32>,
    /// Default width for non-ASCII characters
    pub default_width: f32,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self::monospace(super::DEFAULT_FONT_SIZE)
    }
}

impl FontMetrics {
    pub fn new(line_height: f32, char_widths: Vec<f32>, default_width: f32) -> Self {
        Self {
            line_height,
            char_widths,
            default_width,
        }
    }

    /// Uniform-advance metrics for the editor's monospace face
    pub fn monospace(font_size: f32) -> Self {
        let advance = font_size * MONOSPACE_ADVANCE;
        Self {
            line_height: (font_size * LINE_HEIGHT_FACTOR).ceil(),
            char_widths: vec![advance; 128],
            default_width: advance,
        }
    }

    /// Get width of a character
    pub fn width(&self, c: char) -> f32 {
        if c == '\t' {
            return self.default_width * 4.0;
        }
        if c.is_control() {
            return 0.0;
        }
        if c.is_ascii() {
            if let Some(w) = self.char_widths.get(c as usize) {
                return *w;
            }
        }
        self.default_width
    }

    /// Width of a run of text
    pub fn text_width(&self, text: &str) -> f32 {
        text.chars().map(|c| self.width(c)).sum()
    }
}
