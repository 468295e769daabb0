use ndarray::{Array1, Array2, Zip};
use num_traits::Float;

use crate::math::row_totals;

/// Convert a sample error matrix into estimated population area proportions
///
/// Rows of `error_matrix` are the strata. Each row of sample counts is rescaled to sum to the
/// stratum weight,
///
/// $$
///     \hat{p}_{ij} = W_i \frac{n_{ij}}{n_{i \cdot}},
/// $$
///
/// which is the unbiased estimator of the proportion of area in cell $(i, j)$ under stratified
/// random sampling. A stratum with no samples carries no information, so every cell of its row is
/// NaN.
pub fn area_proportions<E: Float>(error_matrix: &Array2<E>, weights: &Array1<E>) -> Array2<E> {
    let row_totals = row_totals(error_matrix);
    let mut proportions = error_matrix.clone();

    Zip::from(proportions.rows_mut())
        .and(weights)
        .and(&row_totals)
        .for_each(|mut row, &weight, &total| {
            if total == E::zero() {
                row.fill(E::nan());
            } else {
                row.mapv_inplace(|count| weight * (count / total));
            }
        });

    proportions
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, arr2, Array, Array1, Axis};
    use ndarray_rand::rand::{Rng, SeedableRng};
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand_isaac::Isaac64Rng;

    use crate::weights::compute_weights;

    use super::area_proportions;

    #[test]
    fn proportions_match_hand_calculation() {
        let error_matrix = arr2(&[[70., 10.], [5., 115.]]);
        let weights = arr1(&[0.75, 0.25]);

        let proportions = area_proportions(&error_matrix, &weights);

        approx::assert_relative_eq!(proportions[[0, 0]], 0.75 * 70. / 80.);
        approx::assert_relative_eq!(proportions[[0, 1]], 0.75 * 10. / 80.);
        approx::assert_relative_eq!(proportions[[1, 0]], 0.25 * 5. / 120.);
        approx::assert_relative_eq!(proportions[[1, 1]], 0.25 * 115. / 120.);
    }

    #[test]
    fn rows_sum_to_stratum_weights() {
        let seed = 40;
        let mut rng = Isaac64Rng::seed_from_u64(seed);

        for _ in 0..20 {
            let num_classes = rng.gen_range(1..12);
            let error_matrix = Array::random_using(
                (num_classes, num_classes),
                Uniform::new(1., 200.),
                &mut rng,
            )
            .mapv(f64::round);
            let mapped = Array::random_using(num_classes, Uniform::new(1., 1e6), &mut rng);
            let weights = compute_weights(&mapped);

            let proportions = area_proportions(&error_matrix, &weights);

            for (row_sum, weight) in proportions.sum_axis(Axis(1)).iter().zip(&weights) {
                approx::assert_relative_eq!(row_sum, weight, max_relative = 1e-12);
            }
            approx::assert_relative_eq!(proportions.sum(), 1.0, max_relative = 1e-12);
        }
    }

    #[test]
    fn unsampled_stratum_yields_undefined_row() {
        let error_matrix = arr2(&[[10., 2., 0.], [0., 0., 0.], [1., 1., 8.]]);
        let weights: Array1<f64> = arr1(&[0.5, 0.3, 0.2]);

        let proportions = area_proportions(&error_matrix, &weights);

        assert!(proportions.row(1).iter().all(|p| p.is_nan()));
        assert!(proportions.row(0).iter().all(|p| p.is_finite()));
        assert!(proportions.row(2).iter().all(|p| p.is_finite()));
    }

    #[test]
    fn single_class_map_is_all_one_cell() {
        let proportions = area_proportions(&arr2(&[[12.]]), &Array1::ones(1));
        assert_eq!(proportions, arr2(&[[1.]]));
    }
}
