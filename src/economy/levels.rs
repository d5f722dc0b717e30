//! The leveling curve.
//!
//! Levels are derived purely from lifetime XP against a fixed threshold
//! table. Nothing is stored: the same lifetime XP always maps to the same
//! level, so level can never drift out of sync with XP.

/// Highest attainable level.
pub const MAX_LEVEL: u32 = 50;

/// Lifetime XP required to *reach* each level. Index 0 is level 1 (0 XP).
///
/// The table is deliberately front-loaded: early levels come quickly, the
/// band from level 33 upward advances in small fixed steps so veterans
/// still see movement.
pub const LEVEL_THRESHOLDS: [u64; MAX_LEVEL as usize] = [
    0, 100, 500, 1_500, 3_000, 5_000, 8_000, 12_000, 18_000, 25_000, 35_000, 45_000, 60_000,
    80_000, 100_000, 125_000, 150_000, 180_000, 210_000, 250_000, 290_000, 330_000, 380_000,
    430_000, 480_000, 540_000, 600_000, 660_000, 720_000, 780_000, 840_000, 900_000, 960_000,
    970_000, 980_000, 990_000, 995_000, 1_000_000, 1_005_000, 1_010_000, 1_015_000, 1_020_000,
    1_025_000, 1_030_000, 1_035_000, 1_040_000, 1_045_000, 1_050_000, 1_055_000, 1_060_000,
];

/// Level for a given lifetime XP total: the highest level whose threshold
/// the total meets. Always in `1..=MAX_LEVEL`.
pub fn level_for_lifetime_xp(lifetime_xp: u64) -> u32 {
    // partition_point returns the count of thresholds <= lifetime_xp,
    // which is exactly the 1-based level.
    let level = LEVEL_THRESHOLDS.partition_point(|&t| t <= lifetime_xp) as u32;
    level.max(1)
}

/// Lifetime XP required to reach `level`. Levels beyond the table clamp to
/// the final threshold; only level 0 is out of range.
pub fn xp_for_level(level: u32) -> Option<u64> {
    if level == 0 {
        return None;
    }
    Some(LEVEL_THRESHOLDS[(level.min(MAX_LEVEL) - 1) as usize])
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_xp_is_level_one() {
        assert_eq!(level_for_lifetime_xp(0), 1);
        assert_eq!(level_for_lifetime_xp(99), 1);
    }

    #[test]
    fn test_exact_thresholds() {
        assert_eq!(level_for_lifetime_xp(100), 2);
        assert_eq!(level_for_lifetime_xp(500), 3);
        assert_eq!(level_for_lifetime_xp(1_500), 4);
        assert_eq!(level_for_lifetime_xp(1_060_000), 50);
    }

    #[test]
    fn test_one_below_threshold() {
        assert_eq!(level_for_lifetime_xp(499), 2);
        assert_eq!(level_for_lifetime_xp(1_059_999), 49);
    }

    #[test]
    fn test_caps_at_max_level() {
        assert_eq!(level_for_lifetime_xp(u64::MAX), MAX_LEVEL);
        assert_eq!(level_for_lifetime_xp(10_000_000), MAX_LEVEL);
    }

    #[test]
    fn test_xp_for_level_bounds() {
        assert_eq!(xp_for_level(0), None);
        assert_eq!(xp_for_level(1), Some(0));
        assert_eq!(xp_for_level(2), Some(100));
        assert_eq!(xp_for_level(50), Some(1_060_000));
        // Past the table: clamped to the final threshold, never None.
        assert_eq!(xp_for_level(51), Some(1_060_000));
        assert_eq!(xp_for_level(u32::MAX), Some(1_060_000));
    }

    #[test]
    fn test_thresholds_strictly_increasing() {
        for pair in LEVEL_THRESHOLDS.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_round_trip_thresholds() {
        for level in 1..=MAX_LEVEL {
            let xp = xp_for_level(level).unwrap();
            assert_eq!(level_for_lifetime_xp(xp), level);
        }
    }

    proptest! {
        #[test]
        fn prop_level_monotone_in_xp(a in 0u64..2_000_000, b in 0u64..2_000_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(level_for_lifetime_xp(lo) <= level_for_lifetime_xp(hi));
        }

        #[test]
        fn prop_level_always_in_range(xp in any::<u64>()) {
            let level = level_for_lifetime_xp(xp);
            prop_assert!((1..=MAX_LEVEL).contains(&level));
        }
    }
}
