//! Small numeric helpers over lap durations.

use std::cmp::Ordering;

/// Arithmetic mean, or `None` for an empty slice.
#[expect(
    clippy::float_arithmetic,
    reason = "lap statistics are floating-point means by definition"
)]
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    let count = u32::try_from(values.len()).ok().filter(|count| *count > 0)?;
    Some(values.iter().sum::<f64>() / f64::from(count))
}

/// Smallest value, or `None` for an empty slice.
pub(crate) fn minimum(values: &[f64]) -> Option<f64> {
    values.iter().copied().min_by(f64::total_cmp)
}

/// Orders present values ascending and pushes absent ones last.
pub(crate) fn missing_last(left: Option<f64>, right: Option<f64>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => left.total_cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
