use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Convert Fixed64 to f64. Use only at the display boundary, never in the
/// sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Fixed-point ratio of two small counts. Returns zero when the denominator
/// is zero.
///
/// Division of equal counts is exact, so `ratio(n, n) == Fixed64::ONE`
/// holds precisely. The win test relies on this.
#[inline]
pub fn ratio(num: u32, den: u32) -> Fixed64 {
    if den == 0 {
        Fixed64::ZERO
    } else {
        Fixed64::from_num(num) / Fixed64::from_num(den)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_of_equal_counts_is_exactly_one() {
        assert_eq!(ratio(4, 4), Fixed64::ONE);
        assert_eq!(ratio(317, 317), Fixed64::ONE);
    }

    #[test]
    fn ratio_zero_denominator_is_zero() {
        assert_eq!(ratio(3, 0), Fixed64::ZERO);
    }

    #[test]
    fn proper_fraction_stays_below_one() {
        assert!(ratio(3, 4) < Fixed64::ONE);
        assert!(ratio(1, 3) < Fixed64::ONE);
        assert!(ratio(99, 100) < Fixed64::ONE);
    }

    #[test]
    fn product_of_proper_fractions_stays_below_one() {
        let share = ratio(5, 6) * ratio(4, 4);
        assert!(share < Fixed64::ONE);
    }

    #[test]
    fn ratio_is_deterministic() {
        assert_eq!(ratio(1, 3), ratio(1, 3));
    }
}
