/// Pixels on the radius-3 Bresenham circle
pub(crate) const CIRCLE_LEN: usize = 16;

/// Pack per-pixel flags of the 16-pixel circle into a bitmask, bit `i` = pixel `i`.
pub(crate) fn circle_mask(flags: impl IntoIterator<Item = bool>) -> u16 {
    flags
        .into_iter()
        .take(CIRCLE_LEN)
        .enumerate()
        .fold(0u16, |mask, (i, set)| mask | ((set as u16) << i))
}

/// True if the circular mask holds a run of at least `min_count` set bits.
///
/// ANDs the mask with its rotations: a bit survives `n - 1` rotations only if
/// it starts a run of length `n`.
pub fn has_consecutive_pixels(mask: u16, min_count: usize) -> bool {
    if min_count == 0 || min_count > CIRCLE_LEN {
        return false;
    }
    if mask == u16::MAX {
        return true;
    }

    let mut runs = mask;
    for shift in 1..min_count as u32 {
        runs &= mask.rotate_right(shift);
        if runs == 0 {
            return false;
        }
    }
    runs != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn naive_longest_run(mask: u16) -> usize {
        if mask == u16::MAX {
            return CIRCLE_LEN;
        }
        let mut best = 0;
        let mut current = 0;
        for i in 0..CIRCLE_LEN * 2 {
            if mask & (1 << (i % CIRCLE_LEN)) != 0 {
                current += 1;
                best = best.max(current);
            } else {
                current = 0;
            }
        }
        best.min(CIRCLE_LEN)
    }

    #[test]
    fn test_run_in_middle() {
        let mask = circle_mask((0..16).map(|i| (3..12).contains(&i)));
        assert!(has_consecutive_pixels(mask, 9));
        assert!(!has_consecutive_pixels(mask, 10));
    }

    #[test]
    fn test_run_wraps_around() {
        let mask = circle_mask((0..16).map(|i| i >= 12 || i < 5));
        assert!(has_consecutive_pixels(mask, 9));
    }

    #[test]
    fn test_alternating_pixels() {
        let mask = circle_mask((0..16).map(|i| i % 2 == 0));
        assert!(has_consecutive_pixels(mask, 1));
        assert!(!has_consecutive_pixels(mask, 2));
    }

    #[test]
    fn test_degenerate_counts() {
        assert!(!has_consecutive_pixels(u16::MAX, 0));
        assert!(!has_consecutive_pixels(u16::MAX, 17));
        assert!(has_consecutive_pixels(u16::MAX, 16));
    }

    proptest! {
        #[test]
        fn prop_matches_naive_scan(mask in any::<u16>(), n in 1usize..=16) {
            prop_assert_eq!(has_consecutive_pixels(mask, n), naive_longest_run(mask) >= n);
        }
    }
}
