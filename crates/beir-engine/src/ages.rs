//! Exposure and attained age of the evaluated individual.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ages {
    pub exposure: f64,
    pub attained: f64,
}

impl Ages {
    #[must_use]
    pub const fn new(exposure: f64, attained: f64) -> Self {
        Self { exposure, attained }
    }

    /// Years between exposure and the risk projection.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.attained - self.exposure
    }

    /// BEIR VII age-at-exposure variable: `(e - 30) / 10` below 30, else 0.
    #[must_use]
    pub fn e_star(&self) -> f64 {
        if self.exposure < 30.0 {
            (self.exposure - 30.0) / 10.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn e_star_is_zero_from_thirty() {
        assert_eq!(Ages::new(10.0, 50.0).e_star(), -2.0);
        assert_eq!(Ages::new(30.0, 50.0).e_star(), 0.0);
        assert_eq!(Ages::new(45.0, 50.0).e_star(), 0.0);
    }

    #[test]
    fn elapsed_may_be_negative() {
        assert_eq!(Ages::new(40.0, 35.0).elapsed(), -5.0);
    }
}
