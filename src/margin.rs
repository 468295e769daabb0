use num_traits::Float;

use crate::math::defined;

/// A point estimate with its sampling uncertainty
///
/// `margin` is the half-width of the confidence interval, `z * standard_error`. Any component
/// which cannot be estimated from the sample is `None`, which is never conflated with a genuine
/// zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Estimate<E> {
    pub value: Option<E>,
    pub standard_error: Option<E>,
    pub margin: Option<E>,
}

impl<E: Float> Estimate<E> {
    /// Build an estimate from a value and its variance, scaling by the critical value `z`
    ///
    /// NaN or infinite inputs are treated as undefined, and an undefined variance leaves both the
    /// standard error and margin undefined.
    pub(crate) fn from_variance(value: E, variance: E, z: E) -> Self {
        Self::from_standard_error(value, variance.sqrt(), z)
    }

    pub(crate) fn from_standard_error(value: E, standard_error: E, z: E) -> Self {
        Self {
            value: defined(value),
            standard_error: defined(standard_error),
            margin: defined(standard_error).and_then(|se| defined(z * se)),
        }
    }

    /// A value whose sampling uncertainty cannot be estimated
    pub(crate) fn without_uncertainty(value: E) -> Self {
        Self {
            value: defined(value),
            standard_error: None,
            margin: None,
        }
    }

    /// The lower and upper bounds of the confidence interval, `value ± margin`
    #[must_use]
    pub fn interval(&self) -> Option<(E, E)> {
        let value = self.value?;
        let margin = self.margin?;
        Some((value - margin, value + margin))
    }

    #[must_use]
    pub const fn is_defined(&self) -> bool {
        self.value.is_some()
    }
}
