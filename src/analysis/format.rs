//! Display formatting for engine scores

/// Scores beyond this many pawns are treated as forced mates
const MATE_THRESHOLD: f64 = 50.0;

/// Render a pawn-unit score for display
///
/// Regular scores get two decimals and an explicit `+` when positive.
/// Scores past the mate threshold render as `M{n}` / `M-{n}`, where the
/// engine encodes the distance as tenths of the score.
///
/// ```
/// use xfchess_analysis::analysis::format_evaluation;
///
/// assert_eq!(format_evaluation(0.35), "+0.35");
/// assert_eq!(format_evaluation(-1.2), "-1.20");
/// assert_eq!(format_evaluation(95.0), "M10");
/// ```
pub fn format_evaluation(value: f64) -> String {
    if value.abs() > MATE_THRESHOLD {
        let mate_in = (value.abs() / 10.0).ceil() as i64;
        return if value > 0.0 {
            format!("M{mate_in}")
        } else {
            format!("M-{mate_in}")
        };
    }

    if value > 0.0 {
        format!("+{value:.2}")
    } else {
        format!("{value:.2}")
    }
}
