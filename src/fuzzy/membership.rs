//! Fuzzy truth values and triangular membership functions.

use std::fmt;

use crate::error::{WashError, WashResult};
use crate::fuzzy::universe::Universe;

/// A fuzzy truth value in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct FuzzyValue(f64);

impl FuzzyValue {
    pub const ZERO: FuzzyValue = FuzzyValue(0.0);
    pub const ONE: FuzzyValue = FuzzyValue(1.0);

    /// Clamps into [0, 1]; NaN becomes 0.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Fuzzy AND (t-norm) - minimum
    pub fn and(&self, other: &Self) -> Self {
        Self(self.0.min(other.0))
    }

    /// Fuzzy OR (t-conorm) - maximum
    pub fn or(&self, other: &Self) -> Self {
        Self(self.0.max(other.0))
    }

    /// Fuzzy implication (Mamdani: min)
    pub fn implies_mamdani(&self, other: &Self) -> Self {
        self.and(other)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl fmt::Display for FuzzyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// Triangular membership function with feet at `a` and `c` and peak at `b`.
///
/// `a == b` or `b == c` collapses the corresponding ramp into a vertical edge,
/// giving the shoulder shapes used at the ends of a universe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MembershipFunction {
    a: f64,
    b: f64,
    c: f64,
}

impl MembershipFunction {
    /// Build a triangle, requiring finite `a <= b <= c` with `a < c`.
    pub fn triangular(a: f64, b: f64, c: f64) -> WashResult<Self> {
        if !(a.is_finite() && b.is_finite() && c.is_finite()) {
            return Err(WashError::invalid_membership(format!(
                "Triangle [{}, {}, {}] has non-finite parameters",
                a, b, c
            )));
        }
        if !(a <= b && b <= c) || a == c {
            return Err(WashError::invalid_membership(format!(
                "Triangle [{}, {}, {}] must satisfy a <= b <= c with a < c",
                a, b, c
            )));
        }
        Ok(Self { a, b, c })
    }

    /// Membership degree of `x`; total over the reals (NaN maps to 0).
    pub fn degree(&self, x: f64) -> f64 {
        let (a, b, c) = (self.a, self.b, self.c);
        if x == b {
            1.0
        } else if x.is_nan() || x <= a || x >= c {
            0.0
        } else if x < b {
            (x - a) / (b - a)
        } else {
            (c - x) / (c - b)
        }
    }

    pub fn evaluate(&self, x: f64) -> FuzzyValue {
        FuzzyValue::new(self.degree(x))
    }

    /// Degrees at every sample of `universe`, in order
    pub fn sample(&self, universe: &Universe) -> Vec<f64> {
        universe.samples().iter().map(|&x| self.degree(x)).collect()
    }
}

impl fmt::Display for MembershipFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trimf[{}, {}, {}]", self.a, self.b, self.c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_fuzzy_value_operations() {
        let a = FuzzyValue::new(0.6);
        let b = FuzzyValue::new(0.4);

        assert!((a.and(&b).value() - 0.4).abs() < 0.001);
        assert!((a.or(&b).value() - 0.6).abs() < 0.001);
        assert!((a.implies_mamdani(&b).value() - 0.4).abs() < 0.001);
        assert_eq!(FuzzyValue::new(1.7), FuzzyValue::ONE);
        assert_eq!(FuzzyValue::new(-0.2), FuzzyValue::ZERO);
        assert_eq!(FuzzyValue::new(f64::NAN), FuzzyValue::ZERO);
    }

    #[test]
    fn test_triangular_membership() {
        let mf = MembershipFunction::triangular(0.0, 5.0, 10.0).unwrap();

        assert!((mf.degree(0.0) - 0.0).abs() < 0.001);
        assert!((mf.degree(5.0) - 1.0).abs() < 0.001);
        assert!((mf.degree(10.0) - 0.0).abs() < 0.001);
        assert!((mf.degree(2.5) - 0.5).abs() < 0.001);
        assert!((mf.degree(7.5) - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_zero_outside_support() {
        let mf = MembershipFunction::triangular(3.0, 6.0, 9.0).unwrap();
        for x in [-100.0, 0.0, 3.0, 9.0, 9.5, 1e9, f64::NEG_INFINITY, f64::INFINITY] {
            assert_eq!(mf.degree(x), 0.0, "x = {}", x);
        }
        assert_eq!(mf.degree(f64::NAN), 0.0);
    }

    #[test]
    fn test_left_shoulder() {
        // load 'small' / dirt 'low' shape
        let mf = MembershipFunction::triangular(0.0, 0.0, 5.0).unwrap();
        assert_eq!(mf.degree(0.0), 1.0);
        assert!((mf.degree(2.0) - 0.6).abs() < 1e-12);
        assert_eq!(mf.degree(5.0), 0.0);
        assert_eq!(mf.degree(-0.5), 0.0);
    }

    #[test]
    fn test_right_shoulder() {
        let mf = MembershipFunction::triangular(7.0, 12.0, 12.0).unwrap();
        assert_eq!(mf.degree(12.0), 1.0);
        assert!((mf.degree(10.0) - 0.6).abs() < 1e-12);
        assert_eq!(mf.degree(7.0), 0.0);
        assert_eq!(mf.degree(12.5), 0.0);
    }

    #[test]
    fn test_degree_bounded() {
        let mf = MembershipFunction::triangular(20.0, 35.0, 45.0).unwrap();
        let mut x = -10.0;
        while x <= 70.0 {
            let d = mf.degree(x);
            assert!((0.0..=1.0).contains(&d), "degree({}) = {}", x, d);
            x += 0.25;
        }
    }

    #[test]
    fn test_sample_over_universe() {
        let u = Universe::new(0.0, 10.0, 1.0).unwrap();
        let mf = MembershipFunction::triangular(2.0, 5.0, 8.0).unwrap();
        let sampled = mf.sample(&u);
        assert_eq!(sampled.len(), 11);
        assert_eq!(sampled[5], 1.0);
        assert_eq!(sampled[2], 0.0);
        assert!((sampled[3] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_unordered_parameters() {
        for (a, b, c) in [
            (5.0, 0.0, 10.0),
            (0.0, 11.0, 10.0),
            (4.0, 4.0, 4.0),
            (0.0, f64::NAN, 1.0),
        ] {
            let err = MembershipFunction::triangular(a, b, c).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidMembership);
        }
    }

    #[test]
    fn test_display() {
        let mf = MembershipFunction::triangular(600.0, 1000.0, 1200.0).unwrap();
        assert_eq!(mf.to_string(), "trimf[600, 1000, 1200]");
        assert_eq!(FuzzyValue::new(0.5).to_string(), "0.500");
    }
}
