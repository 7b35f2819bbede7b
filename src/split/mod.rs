//! Measurement-driven content splitting
//!
//! The cut point is found by binary search over token boundaries, then
//! snapped back to the nearest line break, or failing that the nearest
//! word boundary, inside a bounded look-back window.

use crate::content::{Fragment, Token};
use crate::error::MeasureError;
use crate::layout::{MeasurementOracle, StyleContext};

/// Look-back window for snapping to a line break, in rendered characters
pub const LINE_BREAK_LOOKBACK: usize = 100;

/// Look-back window for snapping to a word boundary, in rendered characters
pub const WORD_LOOKBACK: usize = 20;

/// Result of splitting one page's content
#[derive(Debug, Clone, PartialEq)]
pub struct SplitResult {
    /// Prefix that fits on the page
    pub fitting: Fragment,
    /// Suffix for the following page; may be empty
    pub remainder: Fragment,
    /// The fitting part still overflows: nothing smaller could be cut off
    pub degraded: bool,
}

impl SplitResult {
    fn whole(content: &Fragment, degraded: bool) -> Self {
        Self {
            fitting: content.clone(),
            remainder: Fragment::default(),
            degraded,
        }
    }
}

/// How a cut point was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Snap {
    LineBreak,
    Word,
    Verbatim,
}

/// Splits content at the largest safe prefix that fits a height
pub struct ContentSplitter<'a, O: MeasurementOracle + ?Sized> {
    oracle: &'a O,
    style: StyleContext,
}

impl<'a, O: MeasurementOracle + ?Sized> ContentSplitter<'a, O> {
    pub fn new(oracle: &'a O, style: StyleContext) -> Self {
        Self { oracle, style }
    }

    /// Cut `content` into a part measuring at most `max_height` and the rest.
    ///
    /// Needs O(log n) oracle calls for n tokens.
    pub fn split(&self, content: &Fragment, max_height: f32) -> Result<SplitResult, MeasureError> {
        if self.oracle.height("", &self.style)? > max_height {
            // Not even an empty page fits; keep everything rather than loop
            return Ok(SplitResult::whole(content, true));
        }

        let last_good = self.last_fitting_offset(content, max_height)?;
        if last_good >= content.len() {
            return Ok(SplitResult::whole(content, false));
        }

        let (cut, degraded) = if content.has_content_before(last_good) {
            let (cut, snap) = snap_cut(content, last_good);
            log::debug!(
                "split at token {} of {} ({:?}, raw {})",
                cut,
                content.len(),
                snap,
                last_good
            );
            (cut, false)
        } else {
            match first_content_end(content) {
                Some(cut) => (cut, true),
                None => return Ok(SplitResult::whole(content, false)),
            }
        };

        let (fitting, remainder) = content.split_balanced(cut);
        Ok(SplitResult {
            fitting,
            remainder,
            degraded,
        })
    }

    /// Binary search for the largest prefix whose rendered height fits
    fn last_fitting_offset(
        &self,
        content: &Fragment,
        max_height: f32,
    ) -> Result<usize, MeasureError> {
        let mut lo = 0usize;
        let mut hi = content.len();
        let mut best = 0usize;

        while lo <= hi {
            let mid = lo + (hi - lo) / 2;
            let prefix = content.balanced_prefix(mid).to_markup();
            if self.oracle.height(&prefix, &self.style)? <= max_height {
                best = mid;
                lo = mid + 1;
            } else {
                if mid == 0 {
                    break;
                }
                hi = mid - 1;
            }
        }

        Ok(best)
    }
}

/// Move a raw cut back to the nearest safe boundary.
///
/// A cut must leave visible content in front of it; boundaries at the
/// very start of the content are skipped.
pub fn snap_cut(content: &Fragment, last_good: usize) -> (usize, Snap) {
    let tokens = content.tokens();
    let last_good = last_good.min(tokens.len());

    if let Some(cut) = find_back(tokens, last_good, LINE_BREAK_LOOKBACK, |i, token| {
        match token {
            Token::LineBreak(_) => Some(i),
            // keep the closing tag with the block it ends
            Token::Close { .. } if token.is_line_boundary() => Some(i + 1),
            _ => None,
        }
    })
    .filter(|&cut| content.has_content_before(cut))
    {
        return (cut, Snap::LineBreak);
    }

    if let Some(cut) = find_back(tokens, last_good, WORD_LOOKBACK, |i, token| {
        matches!(token, Token::Space(_)).then_some(i)
    })
    .filter(|&cut| content.has_content_before(cut))
    {
        return (cut, Snap::Word);
    }

    (last_good, Snap::Verbatim)
}

/// Scan tokens backwards from `from` while within `window` characters and
/// return the first cut `pick` accepts (never past `from`). The token right
/// at `from` counts, so a raw cut already on a boundary stays put.
fn find_back(
    tokens: &[Token],
    from: usize,
    window: usize,
    pick: impl Fn(usize, &Token) -> Option<usize>,
) -> Option<usize> {
    let start = from.min(tokens.len().checked_sub(1)?);
    let mut distance = 0usize;
    for i in (0..=start).rev() {
        if let Some(cut) = pick(i, &tokens[i]).filter(|&cut| cut <= from && cut > 0) {
            return Some(cut);
        }
        if i < from {
            distance += tokens[i].char_len();
        }
        if distance > window {
            break;
        }
    }
    None
}

/// Offset just past the first visible token
fn first_content_end(content: &Fragment) -> Option<usize> {
    content
        .tokens()
        .iter()
        .position(Token::is_content)
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutContext, MetricsOracle};
    use std::cell::Cell;

    fn lines(count: usize) -> String {
        (1..=count)
            .map(|i| format!("Line {}", i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_fitting_content_is_untouched() {
        let oracle = MetricsOracle::new();
        let layout = LayoutContext::a4();
        let splitter = ContentSplitter::new(&oracle, layout.style());
        let content = Fragment::parse(&lines(10));

        let result = splitter.split(&content, layout.max_content_height()).unwrap();
        assert_eq!(result.fitting, content);
        assert!(result.remainder.is_empty());
        assert!(!result.degraded);
    }

    #[test]
    fn test_splits_at_line_break() {
        let oracle = MetricsOracle::new();
        let layout = LayoutContext::a4();
        let splitter = ContentSplitter::new(&oracle, layout.style());
        let content = Fragment::parse(&lines(47));

        let result = splitter.split(&content, layout.max_content_height()).unwrap();
        assert_eq!(result.fitting.to_markup(), lines(46));
        assert_eq!(result.remainder.to_markup(), "Line 47");
        let style = layout.style();
        assert!(oracle.measure(&result.fitting.to_markup(), &style).unwrap() <= 882.0);
    }

    #[test]
    fn test_snaps_to_word_without_line_break() {
        // One unit of height per character past the first ten
        let oracle = |content: &str, _: &StyleContext| -> Result<f32, MeasureError> {
            let chars = Fragment::parse(content).char_len() as f32;
            Ok((chars - 10.0).max(0.0))
        };
        let style = LayoutContext::a4().style();
        let splitter = ContentSplitter::new(&oracle, style);

        // the raw cut already sits on a space
        let content = Fragment::parse("alpha beta gamma delta");
        let result = splitter.split(&content, 6.0).unwrap();
        assert_eq!(result.fitting.to_markup(), "alpha beta gamma");
        assert_eq!(result.remainder.to_markup(), "delta");

        // the raw cut falls between "beta+" and "gamma"; back off to the space
        let content = Fragment::parse("alpha beta+gamma delta");
        let result = splitter.split(&content, 1.0).unwrap();
        assert_eq!(result.fitting.to_markup(), "alpha");
        assert_eq!(result.remainder.to_markup(), "beta+gamma delta");
    }

    #[test]
    fn test_long_run_without_boundaries_is_cut_verbatim() {
        let oracle = |content: &str, _: &StyleContext| -> Result<f32, MeasureError> {
            Ok(Fragment::parse(content).len() as f32)
        };
        let style = LayoutContext::a4().style();
        let splitter = ContentSplitter::new(&oracle, style);
        let x = "x".repeat(40);
        let y = "y".repeat(40);
        let content = Fragment::parse(&format!("{}+{}+{}", x, y, x));

        assert_eq!(snap_cut(&content, 2), (2, Snap::Verbatim));
        let result = splitter.split(&content, 2.0).unwrap();
        assert_eq!(result.fitting.to_markup(), format!("{}+", x));
        assert_eq!(result.remainder.to_markup(), format!("{}+{}", y, x));
    }

    #[test]
    fn test_empty_page_overflow_keeps_everything() {
        let oracle = |_: &str, _: &StyleContext| -> Result<f32, MeasureError> { Ok(1000.0) };
        let style = LayoutContext::a4().style();
        let splitter = ContentSplitter::new(&oracle, style);
        let content = Fragment::parse("anything");

        let result = splitter.split(&content, 882.0).unwrap();
        assert!(result.degraded);
        assert_eq!(result.fitting, content);
        assert!(result.remainder.is_empty());
    }

    #[test]
    fn test_oversized_first_token_still_makes_progress() {
        let oracle = |content: &str, _: &StyleContext| -> Result<f32, MeasureError> {
            Ok(if content.contains("huge") { 2000.0 } else { 0.0 })
        };
        let style = LayoutContext::a4().style();
        let splitter = ContentSplitter::new(&oracle, style);
        let content = Fragment::parse("<p>huge rest of page</p>");

        let result = splitter.split(&content, 882.0).unwrap();
        assert!(result.degraded);
        assert_eq!(result.fitting.to_markup(), "<p>huge</p>");
        assert_eq!(result.remainder.to_markup(), "<p>rest of page</p>");
    }

    #[test]
    fn test_measure_calls_are_logarithmic() {
        let calls = Cell::new(0usize);
        let oracle = |content: &str, _: &StyleContext| -> Result<f32, MeasureError> {
            calls.set(calls.get() + 1);
            Ok(Fragment::parse(content).len() as f32)
        };
        let style = LayoutContext::a4().style();
        let splitter = ContentSplitter::new(&oracle, style);
        let content = Fragment::parse(&vec!["word"; 2000].join(" "));

        splitter.split(&content, 1000.0).unwrap();
        // one call for the empty page, then ~log2(3999)
        assert!(calls.get() <= 14, "made {} calls", calls.get());
    }

    #[test]
    fn test_measurement_failure_propagates() {
        let oracle = |_: &str, _: &StyleContext| -> Result<f32, MeasureError> {
            Err(MeasureError::Detached("gone".to_string()))
        };
        let style = LayoutContext::a4().style();
        let splitter = ContentSplitter::new(&oracle, style);
        assert!(splitter.split(&Fragment::parse("x"), 10.0).is_err());
    }

    #[test]
    fn test_negative_height_is_a_failure() {
        let oracle = |content: &str, _: &StyleContext| -> Result<f32, MeasureError> {
            Ok(if content.is_empty() { 0.0 } else { -5.0 })
        };
        let style = LayoutContext::a4().style();
        let splitter = ContentSplitter::new(&oracle, style);
        assert!(matches!(
            splitter.split(&Fragment::parse("one two"), 10.0),
            Err(MeasureError::Failed(_))
        ));
    }
}
