//! Height measurement supplied by the host

use crate::error::MeasureError;

/// Style inputs a measurement depends on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleContext {
    pub font_size: f32,
    pub line_height: f32,
    pub content_width: f32,
}

/// Renders a content fragment and reports its height in layout units.
///
/// Must behave as a pure function of `(content, style)`: the same inputs
/// always give the same height. The engine caches nothing on its behalf.
pub trait MeasurementOracle {
    fn measure(&self, content: &str, style: &StyleContext) -> Result<f32, MeasureError>;

    /// [`measure`](Self::measure), with NaN, infinite and negative heights
    /// turned into [`MeasureError::Failed`]
    fn height(&self, content: &str, style: &StyleContext) -> Result<f32, MeasureError> {
        let height = self.measure(content, style)?;
        if height.is_finite() && height >= 0.0 {
            Ok(height)
        } else {
            Err(MeasureError::Failed(format!("invalid height {}", height)))
        }
    }
}

impl<F> MeasurementOracle for F
where
    F: Fn(&str, &StyleContext) -> Result<f32, MeasureError>,
{
    fn measure(&self, content: &str, style: &StyleContext) -> Result<f32, MeasureError> {
        self(content, style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutContext;

    fn fixed(value: f32) -> impl Fn(&str, &StyleContext) -> Result<f32, MeasureError> {
        move |_, _| Ok(value)
    }

    #[test]
    fn test_height_rejects_invalid_values() {
        let style = LayoutContext::a4().style();

        assert_eq!(fixed(19.0).height("x", &style), Ok(19.0));
        assert_eq!(fixed(0.0).height("", &style), Ok(0.0));
        for bad in [f32::NAN, -1.0, f32::INFINITY] {
            assert!(matches!(
                fixed(bad).height("x", &style),
                Err(MeasureError::Failed(_))
            ));
        }
    }
}
