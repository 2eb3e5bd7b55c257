//! Time formatting helpers.

use std::time::Duration;

/// Format an elapsed wall-clock time as seconds with two decimals.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.2} seconds", elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_elapsed_with_two_decimals() {
        assert_eq!(format_elapsed(Duration::from_millis(1500)), "1.50 seconds");
        assert_eq!(format_elapsed(Duration::ZERO), "0.00 seconds");
    }
}
