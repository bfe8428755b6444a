//! Fundraising progress as a bounded percentage.

/// Percentage of `target` covered by `raised`, in `0..=100`.
///
/// A zero or negative `target` is treated as 1 and a negative `raised` as 0.
/// Halves round up. Raising more than the goal still reports 100.
///
/// # Examples
///
/// ```
/// use fundboard::progress::percent;
///
/// assert_eq!(percent(18_250, 50_000), 37);
/// assert_eq!(percent(5, 0), 100);
/// assert_eq!(percent(-10, 100), 0);
/// ```
#[must_use]
pub fn percent(raised: i64, target: i64) -> u8 {
    let target = i128::from(target.max(1));
    let raised = i128::from(raised.max(0));

    // round(raised / target * 100) with ties away from zero, in integers
    let rounded = (raised * 200 + target) / (2 * target);

    u8::try_from(rounded.min(100)).unwrap_or(100)
}
