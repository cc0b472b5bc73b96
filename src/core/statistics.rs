//! Min/max statistics for datasets and dataset groups.

/// Minimum and maximum of a value set. Both are NaN until a value is seen.
#[derive(Clone, Copy, Debug)]
pub struct Statistics {
    pub minimum: f64,
    pub maximum: f64,
}

impl Statistics {
    /// Statistics with no values.
    pub const EMPTY: Self = Self {
        minimum: f64::NAN,
        maximum: f64::NAN,
    };

    #[inline]
    pub const fn new(minimum: f64, maximum: f64) -> Self {
        Self { minimum, maximum }
    }

    /// Statistics of `values`, skipping NaN (no data).
    pub fn from_values(values: &[f64]) -> Self {
        let mut stats = Self::EMPTY;
        stats.add_values(values);
        stats
    }

    /// Whether at least one value has been accumulated.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.minimum.is_nan() || self.maximum.is_nan()
    }

    /// Fold a single value in. NaN is ignored.
    #[inline]
    pub fn add_value(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        if self.is_empty() {
            self.minimum = value;
            self.maximum = value;
        } else {
            self.minimum = self.minimum.min(value);
            self.maximum = self.maximum.max(value);
        }
    }

    /// Fold a slice of values in.
    pub fn add_values(&mut self, values: &[f64]) {
        for &v in values {
            self.add_value(v);
        }
    }

    /// Union of two statistics.
    pub fn combine(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self {
            minimum: self.minimum.min(other.minimum),
            maximum: self.maximum.max(other.maximum),
        }
    }
}

impl Default for Statistics {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl PartialEq for Statistics {
    /// NaN bounds compare equal to NaN bounds.
    fn eq(&self, other: &Self) -> bool {
        fn same(a: f64, b: f64) -> bool {
            a == b || (a.is_nan() && b.is_nan())
        }
        same(self.minimum, other.minimum) && same(self.maximum, other.maximum)
    }
}
