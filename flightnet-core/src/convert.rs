//! Flight-plan string conversions.
//!
//! IVAO files cruise level as `F350` and speed as `N0450`. These parse such
//! strings into plain feet and knots; anything malformed is `None`.

/// Convert a flight-level string like `F350` to feet.
pub fn flight_level_to_feet(level: &str) -> Option<i64> {
    let digits = level.strip_prefix('F')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i64>().ok().map(|fl| fl * 100)
}

/// Convert a knots speed string like `N0450` to knots.
pub fn speed_to_knots(speed: &str) -> Option<i64> {
    let digits = speed.strip_prefix('N')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i64>().ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
