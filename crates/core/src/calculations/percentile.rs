//! Ghost Score to percentile mapping.

/// `(score, percentile)` anchors of the piecewise-linear benchmark curve.
const ANCHORS: [(f64, f64); 8] = [
    (0.0, 0.0),
    (40.0, 10.0),
    (55.0, 25.0),
    (65.0, 50.0),
    (75.0, 75.0),
    (85.0, 90.0),
    (95.0, 99.0),
    (100.0, 100.0),
];

/// Percentile of stores a Ghost Score beats.
///
/// Scores are clamped to `[0, 100]`; NaN maps to 0. The curve is
/// non-decreasing, maps 0 to 0 and 100 to 100.
#[must_use]
pub fn calculate_percentile_benchmark(score: f64) -> u8 {
    let score = if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    };

    let percentile = ANCHORS
        .windows(2)
        .find_map(|pair| match pair {
            [(x0, y0), (x1, y1)] if score <= *x1 => {
                Some(y0 + (score - x0) * (y1 - y0) / (x1 - x0))
            }
            _ => None,
        })
        .unwrap_or(100.0);

    // Clamped to [0, 100] above, so the cast cannot truncate.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rounded = percentile.round().clamp(0.0, 100.0) as u8;
    rounded
}
