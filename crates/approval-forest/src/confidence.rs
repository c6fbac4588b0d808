/// Convert an out-of-bag error into an accuracy percentage.
///
/// # Arguments
///
/// * `oob_error` - Error between 0 (no error) and 1 (every sample wrong).
/// * `observed_count` - Number of samples the service has been trained on.
/// * `min_count` - Below this many samples the accuracy is reported as 0.
///
/// # Returns
///
/// `(1 - oob_error) * 100`, or 0 while `observed_count < min_count`.
/// Errors outside [0, 1] are clamped; a NaN error yields 0.
pub fn accuracy(oob_error: f64, observed_count: usize, min_count: usize) -> f64 {
    if observed_count < min_count || oob_error.is_nan() {
        return 0.0;
    }
    (1.0 - oob_error.clamp(0.0, 1.0)) * 100.0
}
