//! A small bounded-denominator rational, used for data-path `scale` factors.
//!
//! `spec.md` leaves the exact rounding mode for float→rational approximation
//! a policy choice (§9 open questions); `DESIGN.md` records the bound chosen
//! here.

use std::fmt;

/// A positive rational `numerator / denominator`, always kept in lowest
/// terms with a positive denominator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    numerator: i64,
    denominator: i64,
}

impl Default for Scale {
    fn default() -> Self {
        Scale::ONE
    }
}

impl Scale {
    pub const ONE: Scale = Scale { numerator: 1, denominator: 1 };

    /// Construct a reduced `Scale`. Panics on a zero or negative denominator,
    /// which can only happen from a programmer error in this crate.
    pub fn new(numerator: i64, denominator: i64) -> Scale {
        assert!(denominator > 0, "scale denominator must be positive");
        let g = gcd(numerator.unsigned_abs(), denominator.unsigned_abs()).max(1);
        Scale {
            numerator: numerator / g as i64,
            denominator: denominator / g as i64,
        }
    }

    pub fn from_int(n: i64) -> Scale {
        Scale::new(n, 1)
    }

    /// Approximates `value` as a fraction with denominator bounded by
    /// `max_denominator`, using a continued-fraction (Stern-Brocot) search.
    /// This is the "reasonable limit" referenced by spec.md §4.4 pass 11.
    pub fn approximate(value: f64, max_denominator: i64) -> Scale {
        if value == 0.0 {
            return Scale::new(0, 1);
        }
        let sign = if value < 0.0 { -1 } else { 1 };
        let value = value.abs();

        let (mut lower_n, mut lower_d) = (0i64, 1i64);
        let (mut upper_n, mut upper_d) = (1i64, 0i64);
        loop {
            let mid_n = lower_n + upper_n;
            let mid_d = lower_d + upper_d;
            if mid_d > max_denominator {
                break;
            }
            if (mid_n as f64) / (mid_d as f64) < value {
                lower_n = mid_n;
                lower_d = mid_d;
            } else {
                upper_n = mid_n;
                upper_d = mid_d;
            }
        }
        // Pick whichever of the two bracketing fractions is closer.
        let lower_err = if lower_d == 0 {
            f64::INFINITY
        } else {
            (value - lower_n as f64 / lower_d as f64).abs()
        };
        let upper_err = if upper_d == 0 {
            f64::INFINITY
        } else {
            (value - upper_n as f64 / upper_d as f64).abs()
        };
        let (n, d) = if lower_err <= upper_err {
            (lower_n, lower_d)
        } else {
            (upper_n, upper_d)
        };
        Scale::new(sign * n, d.max(1))
    }

    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    pub fn is_one(&self) -> bool {
        self.numerator == self.denominator
    }

    pub fn reciprocal(&self) -> Scale {
        Scale::new(self.denominator, self.numerator)
    }

    pub fn mul(&self, other: Scale) -> Scale {
        Scale::new(self.numerator * other.numerator, self.denominator * other.denominator)
    }

    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            // Minecraft's `execute store` scale argument takes a single
            // decimal literal, so render the reduced fraction as a float.
            write!(f, "{}", self.as_f64())
        }
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_to_lowest_terms() {
        let s = Scale::new(4, 8);
        assert_eq!((s.numerator(), s.denominator()), (1, 2));
    }

    #[test]
    fn reciprocal_of_one_hundred() {
        let s = Scale::from_int(100).reciprocal();
        assert_eq!((s.numerator(), s.denominator()), (1, 100));
        assert_eq!(s.as_f64(), 0.01);
    }

    #[test]
    fn approximate_exact_decimal() {
        let s = Scale::approximate(0.01, 1000);
        assert_eq!((s.numerator(), s.denominator()), (1, 100));
    }
}
