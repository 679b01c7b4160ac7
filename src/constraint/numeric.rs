use crate::literal::Number;

/// A `min` or `max` bound. `exclusive` is folded in from
/// `exclusiveMinimum`/`exclusiveMaximum` by the compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub value: Number,
    pub exclusive: bool,
}

impl Bound {
    pub fn new(value: Number) -> Self {
        Self { value, exclusive: false }
    }

    /// `n` satisfies this bound used as a minimum.
    pub fn admits_from_below(&self, n: &Number) -> bool {
        if self.exclusive { *n > self.value } else { *n >= self.value }
    }

    /// `n` satisfies this bound used as a maximum.
    pub fn admits_from_above(&self, n: &Number) -> bool {
        if self.exclusive { *n < self.value } else { *n <= self.value }
    }
}

/// Some number lies between `min` and `max`.
pub fn range_is_satisfiable(min: &Bound, max: &Bound) -> bool {
    min.value < max.value || (min.value == max.value && !min.exclusive && !max.exclusive)
}

pub fn fits_precision(n: &Number, precision: u64) -> bool {
    n.fraction_digits() as u64 <= precision
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(s: &str) -> Number {
        Number::parse(s).unwrap()
    }

    #[test]
    fn exclusive_bounds_are_strict() {
        let mut min = Bound::new(num("0"));
        assert!(min.admits_from_below(&num("0")));
        min.exclusive = true;
        assert!(!min.admits_from_below(&num("0")));
        assert!(min.admits_from_below(&num("0.001")));
        let max = Bound { value: num("10"), exclusive: true };
        assert!(max.admits_from_above(&num("9.99")));
        assert!(!max.admits_from_above(&num("10.0")));
    }

    #[test]
    fn equal_bounds_need_inclusive_ends() {
        let a = Bound::new(num("5"));
        let b = Bound::new(num("5"));
        assert!(range_is_satisfiable(&a, &b));
        let b = Bound { exclusive: true, ..b };
        assert!(!range_is_satisfiable(&a, &b));
        assert!(!range_is_satisfiable(&Bound::new(num("6")), &Bound::new(num("5"))));
    }

    #[test]
    fn precision_counts_the_exponent() {
        assert!(fits_precision(&num("1.25"), 2));
        assert!(!fits_precision(&num("1.5e-3"), 1));
        assert!(fits_precision(&num("1.5e-3"), 4));
        assert!(fits_precision(&num("1.234e2"), 1));
    }
}
