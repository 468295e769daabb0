use ndarray::{Array1, Array2};
use num_traits::Float;

use crate::margin::Estimate;
use crate::math::{column_totals, has_replication, row_totals};

/// Error-adjusted area of each class, $\hat{A}_j = A_{tot} \sum_i \hat{p}_{ij}$
///
/// The column sums of the area proportion matrix estimate the true proportion of each class, so
/// scaling them by the total mapped area replaces the naive pixel count area of each class.
pub fn error_adjusted_area<E: Float>(proportions: &Array2<E>, total_area: E) -> Array1<E> {
    column_totals(proportions).mapv(|proportion| total_area * proportion)
}

/// Standard errors and confidence margins of the error-adjusted areas
///
/// The standard error of the estimated proportion of class $j$ is
///
/// $$
///     S(\hat{p}_{\cdot j}) = \sqrt{\sum_i W_i^2 \frac{\frac{n_{ij}}{n_{i \cdot}} \left(1 -
///     \frac{n_{ij}}{n_{i \cdot}}\right)}{n_{i \cdot} - 1}},
/// $$
///
/// where strata with fewer than two samples contribute nothing to the sum. The area standard
/// error is this scaled by `total_area`, and the margin is `z` times that.
pub fn area_uncertainty<E: Float>(
    error_matrix: &Array2<E>,
    weights: &Array1<E>,
    adjusted_areas: &Array1<E>,
    total_area: E,
    z: E,
) -> Vec<Estimate<E>> {
    let one = E::one();
    let sample_totals = row_totals(error_matrix);

    error_matrix
        .columns()
        .into_iter()
        .zip(adjusted_areas)
        .map(|(column, &area)| {
            let variance = column
                .iter()
                .zip(weights)
                .zip(&sample_totals)
                .filter(|(_, &n)| has_replication(n))
                .fold(E::zero(), |acc, ((&count, &w), &n)| {
                    acc + w.powi(2) * (count / n) * (one - count / n) / (n - one)
                });
            Estimate::from_standard_error(area, total_area * variance.sqrt(), z)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, arr2, Array};
    use ndarray_rand::rand::{Rng, SeedableRng};
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand_isaac::Isaac64Rng;

    use crate::proportion::area_proportions;
    use crate::weights::compute_weights;

    use super::{area_uncertainty, error_adjusted_area};

    const Z_95: f64 = 1.959_963_984_540_054;

    #[test]
    fn adjusted_areas_match_hand_calculation() {
        let error_matrix = arr2(&[[70., 10.], [5., 115.]]);
        let weights = compute_weights(&arr1(&[750., 250.]));
        let proportions = area_proportions(&error_matrix, &weights);
        let total_area = 1000. * 30. * 30.;

        let areas = error_adjusted_area(&proportions, total_area);

        approx::assert_relative_eq!(
            areas[0],
            total_area * (0.75 * 70. / 80. + 0.25 * 5. / 120.),
            max_relative = 1e-12
        );
        approx::assert_relative_eq!(
            areas[1],
            total_area * (0.75 * 10. / 80. + 0.25 * 115. / 120.),
            max_relative = 1e-12
        );
    }

    #[test]
    fn adjusted_areas_conserve_total_area() {
        let seed = 40;
        let mut rng = Isaac64Rng::seed_from_u64(seed);

        for _ in 0..20 {
            let num_classes = rng.gen_range(1..15);
            let error_matrix = Array::random_using(
                (num_classes, num_classes),
                Uniform::new(1., 100.),
                &mut rng,
            )
            .mapv(f64::round);
            let mapped = Array::random_using(num_classes, Uniform::new(1., 1e6), &mut rng);
            let pixel_size: f64 = rng.gen_range(1.0..100.0);
            let total_area = mapped.sum() * pixel_size.powi(2);

            let weights = compute_weights(&mapped);
            let proportions = area_proportions(&error_matrix, &weights);
            let areas = error_adjusted_area(&proportions, total_area);

            approx::assert_relative_eq!(areas.sum(), total_area, max_relative = 1e-10);
        }
    }

    #[test]
    fn area_standard_errors_match_hand_calculation() {
        let error_matrix = arr2(&[[70., 10.], [5., 115.]]);
        let weights = compute_weights(&arr1(&[750., 250.]));
        let proportions = area_proportions(&error_matrix, &weights);
        let total_area = 900_000.;
        let areas = error_adjusted_area(&proportions, total_area);

        let estimates = area_uncertainty(&error_matrix, &weights, &areas, total_area, Z_95);

        let (a, b) = (70. / 80., 5. / 120.);
        let expected = total_area
            * (0.75_f64.powi(2) * a * (1. - a) / 79. + 0.25_f64.powi(2) * b * (1. - b) / 119.)
                .sqrt();
        approx::assert_relative_eq!(
            estimates[0].standard_error.unwrap(),
            expected,
            max_relative = 1e-12
        );
        assert_eq!(estimates[0].value, Some(areas[0]));
        assert_eq!(
            estimates[0].margin.unwrap(),
            Z_95 * estimates[0].standard_error.unwrap()
        );
    }

    #[test]
    fn sparse_strata_contribute_nothing_to_area_uncertainty() {
        let error_matrix = arr2(&[[40., 3.], [0., 1.]]);
        let weights = compute_weights(&arr1(&[3e5, 1e5]));
        let proportions = area_proportions(&error_matrix, &weights);
        let total_area = 4e5;
        let areas = error_adjusted_area(&proportions, total_area);

        let estimates = area_uncertainty(&error_matrix, &weights, &areas, total_area, Z_95);

        let a = 3. / 43.;
        let expected = total_area * (0.75_f64.powi(2) * a * (1. - a) / 42.).sqrt();
        approx::assert_relative_eq!(
            estimates[1].standard_error.unwrap(),
            expected,
            max_relative = 1e-12
        );
    }

    #[test]
    fn unsampled_stratum_makes_adjusted_areas_undefined_but_not_their_errors() {
        let error_matrix = arr2(&[[40., 3.], [0., 0.]]);
        let weights = compute_weights(&arr1(&[3e5, 1e5]));
        let proportions = area_proportions(&error_matrix, &weights);
        let total_area = 4e5;
        let areas = error_adjusted_area(&proportions, total_area);

        let estimates = area_uncertainty(&error_matrix, &weights, &areas, total_area, Z_95);

        for estimate in estimates {
            assert_eq!(estimate.value, None);
            assert!(estimate.standard_error.is_some());
        }
    }
}
