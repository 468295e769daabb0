use ndarray::{Array1, Array2, Axis};
use num_traits::{Float, NumCast};

/// Convert a primitive into the working float type
///
/// Conversions between float types saturate rather than fail, so this only produces NaN for
/// values which have no float representation at all.
pub(crate) fn cast<E: Float, T: NumCast>(value: T) -> E {
    E::from(value).unwrap_or_else(E::nan)
}

/// The sample total of each stratum, $n_{i \cdot} = \sum_j n_{ij}$
pub(crate) fn row_totals<E: Float>(matrix: &Array2<E>) -> Array1<E> {
    matrix.sum_axis(Axis(1))
}

/// The sum down each column, $n_{\cdot j} = \sum_i n_{ij}$
pub(crate) fn column_totals<E: Float>(matrix: &Array2<E>) -> Array1<E> {
    matrix.sum_axis(Axis(0))
}

/// Divide, mapping a zero denominator to NaN rather than to an infinity
///
/// Division by a NaN denominator is already NaN, so any undefined quantity upstream stays
/// undefined.
pub(crate) fn ratio<E: Float>(numerator: E, denominator: E) -> E {
    if denominator == E::zero() {
        E::nan()
    } else {
        numerator / denominator
    }
}

/// The sampling variance of a binomial proportion `p` estimated from `n` samples, $p (1 - p) / (n - 1)$
pub(crate) fn proportion_variance<E: Float>(p: E, n: E) -> E {
    p * (E::one() - p) / (n - E::one())
}

/// Whether a sample of size `n` supports a variance estimate
pub(crate) fn has_replication<E: Float>(n: E) -> bool {
    n > E::one()
}

/// Lift a computed value into the explicit undefined marker used in results
pub(crate) fn defined<E: Float>(value: E) -> Option<E> {
    value.is_finite().then_some(value)
}
