//! Deterministic oracle that lays text out with font metrics
//!
//! Stands in for a rendering surface in headless hosts, the demo binary
//! and tests. Markup is stripped, every `\n` starts a new line and long
//! lines soft-wrap at Unicode line-break opportunities.

use unicode_linebreak::linebreaks;
use unicode_segmentation::UnicodeSegmentation;

use super::{FontMetrics, MeasurementOracle, StyleContext};
use crate::content::Fragment;
use crate::error::MeasureError;

#[derive(Debug, Clone, Default)]
pub struct MetricsOracle {
    /// Fixed metrics; when unset, monospace metrics follow the style's font size
    metrics: Option<FontMetrics>,
}

impl MetricsOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(metrics: FontMetrics) -> Self {
        Self {
            metrics: Some(metrics),
        }
    }

    /// Number of visual lines `text` occupies at `max_width`
    pub fn line_count(&self, text: &str, metrics: &FontMetrics, max_width: f32) -> usize {
        let text = text.strip_suffix('\n').unwrap_or(text);
        if text.is_empty() {
            return 0;
        }
        text.split('\n')
            .map(|line| wrapped_lines(line, metrics, max_width))
            .sum()
    }
}

impl MeasurementOracle for MetricsOracle {
    fn measure(&self, content: &str, style: &StyleContext) -> Result<f32, MeasureError> {
        if style.content_width <= 0.0 {
            return Err(MeasureError::Detached(format!(
                "content width {} leaves no room for text",
                style.content_width
            )));
        }

        let monospace;
        let metrics = match &self.metrics {
            Some(metrics) => metrics,
            None => {
                monospace = FontMetrics::monospace(style.font_size);
                &monospace
            }
        };

        let text = Fragment::parse(content).plain_text();
        let lines = self.line_count(&text, metrics, style.content_width);
        Ok(lines as f32 * metrics.line_height)
    }
}

/// Greedy wrap of a single hard line
fn wrapped_lines(line: &str, metrics: &FontMetrics, max_width: f32) -> usize {
    let mut lines = 1;
    let mut x: f32 = 0.0;
    let mut start = 0;

    for (end, _) in linebreaks(line) {
        let segment = &line[start..end];
        start = end;

        let visible = metrics.text_width(segment.trim_end());
        if visible > max_width {
            // Emergency break inside an overlong word
            for grapheme in segment.graphemes(true) {
                let width = metrics.text_width(grapheme);
                if x > 0.0 && x + width > max_width && !grapheme.trim().is_empty() {
                    lines += 1;
                    x = 0.0;
                }
                x += width;
            }
            continue;
        }

        if x > 0.0 && x + visible > max_width {
            lines += 1;
            x = 0.0;
        }
        x += metrics.text_width(segment);
    }

    lines
}
