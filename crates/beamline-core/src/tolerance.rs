//! Floating-point tolerances used for spatial and parameter comparisons.

/// Canonical tolerance for longitudinal geometry, in metres.
///
/// A gap smaller than this is not turned into a drift, and an overlap smaller
/// than this is not reported as a negative drift.
pub const GEOMETRY_TOLERANCE: f64 = 1e-9;

/// Relative tolerance used when comparing element parameters.
pub const PARAMETER_RELATIVE_TOLERANCE: f64 = 1e-8;

/// Absolute floor for parameter comparisons of values close to zero.
pub const PARAMETER_ABSOLUTE_TOLERANCE: f64 = 1e-12;

/// Returns `true` if `a` and `b` agree within `rel` of their larger magnitude,
/// or within [`PARAMETER_ABSOLUTE_TOLERANCE`] absolutely.
///
/// # Examples
///
/// ```
/// use beamline_core::tolerance::relative_eq;
///
/// assert!(relative_eq(1.0, 1.0 + 1e-10, 1e-8));
/// assert!(!relative_eq(1.0, 1.001, 1e-8));
/// assert!(relative_eq(0.0, 1e-14, 1e-8));
/// ```
pub fn relative_eq(a: f64, b: f64, rel: f64) -> bool {
    let diff = (a - b).abs();
    diff <= PARAMETER_ABSOLUTE_TOLERANCE || diff <= rel * a.abs().max(b.abs())
}

/// Compares two scalars with the default parameter tolerance.
pub fn params_eq(a: f64, b: f64) -> bool {
    relative_eq(a, b, PARAMETER_RELATIVE_TOLERANCE)
}

/// Compares two coefficient arrays with the default parameter tolerance.
///
/// Missing trailing entries are treated as zero, so `[0.1]` equals `[0.1, 0.0]`.
pub fn slices_eq(a: &[f64], b: &[f64]) -> bool {
    let len = a.len().max(b.len());
    (0..len).all(|i| {
        let left = a.get(i).copied().unwrap_or(0.0);
        let right = b.get(i).copied().unwrap_or(0.0);
        params_eq(left, right)
    })
}
