use crate::error::{AnalyticsError, Result};
use crate::reference::growth::validate_anchors;

/// Place `value` on the percentile ladder by linear interpolation between
/// the reference anchors.
///
/// `anchors[i]` is the measurement at percentile `ladder[i]`.
///
/// - At or below the first anchor the percentile falls linearly toward 0 at
///   a value of 0, so it can land below the lowest rung.
/// - At or above the last anchor it is clamped to the top rung.
/// - Otherwise it is interpolated within the bracketing pair.
///
/// Anchors must match the ladder in length, start positive and never
/// decrease; anything else is `InvalidReferenceData`.
pub fn interpolate_percentile(value: f64, anchors: &[f64], ladder: &[f64]) -> Result<f64> {
    validate_anchors(anchors, ladder.len()).map_err(AnalyticsError::reference)?;

    let first = anchors[0];
    let last = anchors[anchors.len() - 1];
    let top = ladder[ladder.len() - 1];

    if value <= first {
        return Ok(ladder[0] * (value / first));
    }
    if value >= last {
        return Ok(top);
    }

    for (i, pair) in anchors.windows(2).enumerate() {
        let (lo, hi) = (pair[0], pair[1]);
        if lo <= value && value < hi {
            let fraction = (value - lo) / (hi - lo);
            return Ok(ladder[i] + fraction * (ladder[i + 1] - ladder[i]));
        }
    }

    // Unreachable for finite values: first < value < last always brackets.
    Ok(top)
}
