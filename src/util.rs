use crate::{error::RuntimeError, interpreter::evaluator::core::EvalResult};

/// Largest integer value exactly representable as an `f64` (`2^53 - 1`).
pub const MAX_SAFE_INT: f64 = 9_007_199_254_740_991.0;

/// Formats a number in its canonical source form.
///
/// Integral values print without a decimal part (`7`, not `7.0`), all other
/// finite values use the shortest round-trip representation. Non-finite
/// values fall back to the standard float formatting.
///
/// # Example
/// ```
/// use minipar::util::format_number;
///
/// assert_eq!(format_number(7.0), "7");
/// assert_eq!(format_number(-3.0), "-3");
/// assert_eq!(format_number(2.5), "2.5");
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_SAFE_INT {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Converts a numeric port value to `u16`, rejecting fractional or
/// out-of-range values.
///
/// # Errors
/// Returns `RuntimeError::InvalidPort` if the value is not an integer in
/// `0..=65535`.
///
/// # Example
/// ```
/// use minipar::util::number_to_port;
///
/// assert_eq!(number_to_port(8080.0, 1).unwrap(), 8080);
/// assert!(number_to_port(-1.0, 1).is_err());
/// assert!(number_to_port(8080.5, 1).is_err());
/// ```
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
pub fn number_to_port(value: f64, line: usize) -> EvalResult<u16> {
    if !value.is_finite() || value.fract() != 0.0 || value < 0.0 || value > f64::from(u16::MAX) {
        return Err(RuntimeError::InvalidPort { port: format_number(value),
                                               line });
    }
    Ok(value as u16)
}

/// Converts a numeric value to a non-negative whole number of milliseconds.
///
/// Used by the `sleep` builtin, which takes a duration in seconds.
///
/// # Errors
/// Returns `RuntimeError::ConversionFailure` for negative or non-finite
/// durations.
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
pub fn number_to_millis(value: f64, line: usize) -> EvalResult<u64> {
    if !value.is_finite() || value < 0.0 {
        return Err(RuntimeError::ConversionFailure { value:  format_number(value),
                                                     target: "duration",
                                                     line });
    }
    Ok((value * 1000.0) as u64)
}
