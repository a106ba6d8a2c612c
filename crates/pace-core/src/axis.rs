const PADDING_FRACTION: f64 = 0.15;
const ANNOTATION_FRACTION: f64 = 0.25;
/// Padding used when every observed value is identical.
pub const MIN_VISUAL_PADDING: f64 = 0.005;

/// Y-axis display window for one pair's chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBounds {
    pub lower: f64,
    pub upper: f64,
    pub padding: f64,
    pub annotation_offset: f64,
    pub observed_min: f64,
    pub observed_max: f64,
}

impl AxisBounds {
    /// Frame every finite value in `values`; `None` if there are none.
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let (min, max) = values
            .into_iter()
            .filter(|value| value.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, value| match acc {
                None => Some((value, value)),
                Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
            })?;

        let spread = max - min;
        let padding = if spread > 0.0 {
            spread * PADDING_FRACTION
        } else {
            (max.abs() * PADDING_FRACTION).max(MIN_VISUAL_PADDING)
        };

        Some(Self {
            lower: (min - padding).max(0.0),
            upper: max + padding,
            padding,
            annotation_offset: padding * ANNOTATION_FRACTION,
            observed_min: min,
            observed_max: max,
        })
    }

    /// Baseline y for a race annotation: just above the higher of the two values.
    pub fn label_anchor(&self, a_value: f64, b_value: f64) -> f64 {
        a_value.max(b_value) + self.annotation_offset
    }
}
