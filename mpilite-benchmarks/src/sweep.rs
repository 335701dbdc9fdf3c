//! Geometric size sweep.

/// Sizes `min, 2*min, 4*min, ...` up to and including `max`.
///
/// Every rank builds the same sequence locally; nothing is communicated.
#[derive(Clone, Debug)]
pub struct SizeSweep {
    next: Option<usize>,
    max: usize,
}

/// Sweep from `min` to `max` by doubling. Empty if `min > max` or `min == 0`.
pub fn sweep(min: usize, max: usize) -> SizeSweep {
    SizeSweep {
        next: Some(min),
        max,
    }
}

impl Iterator for SizeSweep {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let size = self.next.filter(|&size| size != 0 && size <= self.max)?;
        // Stop instead of wrapping around at the top of the range.
        self.next = size.checked_mul(2);
        Some(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_up_to_max() {
        let sizes: Vec<usize> = sweep(2, 1024).collect();
        assert_eq!(sizes, vec![2, 4, 8, 16, 32, 64, 128, 256, 512, 1024]);
    }

    #[test]
    fn pingpong_range() {
        let sizes: Vec<usize> = sweep(1, 1048576).collect();
        assert_eq!(sizes.len(), 21);
        assert_eq!(sizes.first(), Some(&1));
        assert_eq!(sizes.last(), Some(&1048576));
    }

    #[test]
    fn max_need_not_be_a_power_of_two() {
        assert_eq!(sweep(3, 20).collect::<Vec<_>>(), vec![3, 6, 12]);
    }

    #[test]
    fn inverted_bounds_are_empty() {
        assert_eq!(sweep(1048576, 1).count(), 0);
    }

    #[test]
    fn zero_minimum_is_empty() {
        assert_eq!(sweep(0, 16).count(), 0);
    }

    #[test]
    fn stops_before_overflow() {
        let top = 1usize << (usize::BITS - 1);
        assert_eq!(sweep(top, usize::MAX).collect::<Vec<_>>(), vec![top]);
    }

    #[test]
    fn restarts_from_a_clone() {
        let sizes = sweep(4, 32);
        let first: Vec<usize> = sizes.clone().collect();
        let second: Vec<usize> = sizes.collect();
        assert_eq!(first, second);
    }
}
