use ndarray::Array1;
use num_traits::Float;

use crate::math::ratio;

/// Compute the stratum weights from the number of pixels mapped to each class
///
/// Each map class is a sampling stratum, and its weight is the fraction of the map it covers
/// $W_i = A_{m,i} / \sum_k A_{m,k}$. When the map is empty every weight is NaN, which carries
/// through to every downstream estimate as an undefined value.
pub fn compute_weights<E: Float>(mapped_pixels: &Array1<E>) -> Array1<E> {
    let total = mapped_pixels.sum();
    mapped_pixels.mapv(|pixels| ratio(pixels, total))
}
