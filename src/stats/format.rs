// src/stats/format.rs
//! Hashrate display formatting

/// Unit labels in ascending magnitude, each 1000x the previous
const UNITS: [&str; 5] = ["H/s", "kH/s", "MH/s", "GH/s", "TH/s"];

/// Formats a hashes/second value for display
///
/// Steps up one unit per factor of 1000 while the value exceeds 1000,
/// never past TH/s, and prints two decimals.
///
/// ```
/// use verthash_driver_rs::stats::format_hash_rate;
/// assert_eq!(format_hash_rate(1500), "1.50 kH/s");
/// ```
pub fn format_hash_rate(hash_rate: u64) -> String {
    let mut value = hash_rate as f64;
    let mut unit = 0;

    while value > 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    format!("{:.2} {}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_plain_hashes() {
        assert_eq!(format_hash_rate(0), "0.00 H/s");
        assert_eq!(format_hash_rate(999), "999.00 H/s");
    }

    #[test]
    fn test_format_scaled_units() {
        assert_eq!(format_hash_rate(1500), "1.50 kH/s");
        assert_eq!(format_hash_rate(2_500_000), "2.50 MH/s");
        assert_eq!(format_hash_rate(3_250_000_000), "3.25 GH/s");
    }

    #[test]
    fn test_format_boundary_stays_in_lower_unit() {
        // Exactly 1000 does not exceed the threshold
        assert_eq!(format_hash_rate(1000), "1000.00 H/s");
    }

    #[test]
    fn test_format_caps_at_terahash() {
        assert_eq!(format_hash_rate(5_000_000_000_000_000), "5000.00 TH/s");
    }
}
