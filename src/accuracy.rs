use ndarray::{Array1, Array2};
use num_traits::Float;

use crate::margin::Estimate;
use crate::math::{column_totals, has_replication, proportion_variance, ratio, row_totals};

/// How the variance of producer's accuracy is estimated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProducerVariance {
    /// Reproduce the published reference tool.
    ///
    /// The reference tool evaluates the variance of producer's accuracy in unweighted sample
    /// counts, with the user's accuracy $U$ and sample size $n$ of the *last* stratum for every
    /// column. A last stratum with fewer than two samples therefore leaves every producer's
    /// accuracy without a standard error. This is not the estimator of Olofsson et al. (2014), but
    /// results agree with the reference output to floating-point rounding.
    #[default]
    Reference,
    /// The stratified estimator of Olofsson et al. (2014)
    ///
    /// $$
    ///     \hat{V}(P_j) = \frac{1}{\hat{p}_{\cdot j}^2} \left[ W_j^2 (1 - P_j)^2 \frac{U_j (1 -
    ///     U_j)}{n_{j \cdot} - 1} + P_j^2 \sum_{i \neq j} W_i^2 \frac{n_{ij}}{n_{i \cdot}} \left(1 -
    ///     \frac{n_{ij}}{n_{i \cdot}}\right) \frac{1}{n_{i \cdot} - 1} \right]
    /// $$
    ///
    /// Rows with fewer than two samples are left out of the sum. The standard error is undefined
    /// when the column's own stratum holds fewer than two samples.
    PerStratum,
}

/// Accuracy estimates for every class plus overall accuracy
#[derive(Clone, Debug, PartialEq)]
pub struct AccuracyResult<E> {
    /// User's accuracy of each map class, the probability a pixel mapped as the class truly is it
    pub user: Vec<Estimate<E>>,
    /// Producer's accuracy of each reference class, the probability a pixel of the class is
    /// mapped as it
    pub producer: Vec<Estimate<E>>,
    pub overall: Estimate<E>,
}

/// Estimate user's, producer's and overall accuracy with their confidence intervals
///
/// `proportions` is the estimated area proportion matrix built from `error_matrix` and `weights`,
/// and `z` the two-sided critical value for the required confidence level.
///
/// A class with no mapped (or reference) area has an undefined accuracy. A class whose stratum
/// holds fewer than two samples still reports its accuracy, but its standard error is undefined.
pub fn estimate_accuracy<E: Float>(
    proportions: &Array2<E>,
    error_matrix: &Array2<E>,
    weights: &Array1<E>,
    z: E,
    method: ProducerVariance,
) -> AccuracyResult<E> {
    let sample_totals = row_totals(error_matrix);

    let users = user_accuracies(proportions);
    let user = users
        .iter()
        .zip(&sample_totals)
        .map(|(&u, &n)| {
            if has_replication(n) {
                Estimate::from_variance(u, proportion_variance(u, n), z)
            } else {
                Estimate::without_uncertainty(u)
            }
        })
        .collect();

    let producer = producer_accuracies(proportions)
        .iter()
        .zip(&column_totals(error_matrix))
        .enumerate()
        .map(|(j, (&p, &column_total))| {
            if has_replication(column_total) {
                let variance = match method {
                    ProducerVariance::Reference => {
                        reference_producer_variance(error_matrix, &users, &sample_totals, j, p)
                    }
                    ProducerVariance::PerStratum => per_stratum_producer_variance(
                        proportions,
                        error_matrix,
                        weights,
                        &users,
                        &sample_totals,
                        j,
                        p,
                    ),
                };
                Estimate::from_variance(p, variance, z)
            } else {
                Estimate::without_uncertainty(p)
            }
        })
        .collect();

    let overall = Estimate::from_variance(
        proportions.diag().sum(),
        overall_variance(weights, &users, &sample_totals),
        z,
    );

    AccuracyResult {
        user,
        producer,
        overall,
    }
}

/// $U_i = \hat{p}_{ii} / \hat{p}_{i \cdot}$
fn user_accuracies<E: Float>(proportions: &Array2<E>) -> Array1<E> {
    proportions
        .diag()
        .iter()
        .zip(&row_totals(proportions))
        .map(|(&diagonal, &total)| ratio(diagonal, total))
        .collect()
}

/// $P_j = \hat{p}_{jj} / \hat{p}_{\cdot j}$
fn producer_accuracies<E: Float>(proportions: &Array2<E>) -> Array1<E> {
    proportions
        .diag()
        .iter()
        .zip(&column_totals(proportions))
        .map(|(&diagonal, &total)| ratio(diagonal, total))
        .collect()
}

/// The bracketed variance of producer's accuracy for column `j`,
///
/// $$
///     \frac{1}{n_{\cdot j}^2} \left[ n_{\cdot j}^2 (1 - P_j)^2 \frac{U (1 - U)}{n - 1}
///     + P_j^2 \sum_{i \neq j} \frac{n_{ij}}{n} \left(1 - \frac{n_{ij}}{n}\right) \frac{1}{n - 1}
///     \right],
/// $$
///
/// with $U$ and $n$ fixed to the last stratum.
fn reference_producer_variance<E: Float>(
    error_matrix: &Array2<E>,
    users: &Array1<E>,
    sample_totals: &Array1<E>,
    j: usize,
    p: E,
) -> E {
    let one = E::one();
    let u = users.iter().last().copied().unwrap_or_else(E::nan);
    let n = sample_totals.iter().last().copied().unwrap_or_else(E::nan);
    let column_total = error_matrix.column(j).sum();

    let off_diagonal = error_matrix
        .column(j)
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != j)
        .fold(E::zero(), |acc, (_, &count)| {
            acc + (count / n) * (one - count / n) / (n - one)
        });

    (one / column_total.powi(2))
        * (column_total.powi(2) * (one - p).powi(2) * u * (one - u) / (n - one)
            + p.powi(2) * off_diagonal)
}

/// Variance of producer's accuracy for column `j` with every stratum term weighted by its area
fn per_stratum_producer_variance<E: Float>(
    proportions: &Array2<E>,
    error_matrix: &Array2<E>,
    weights: &Array1<E>,
    users: &Array1<E>,
    sample_totals: &Array1<E>,
    j: usize,
    p: E,
) -> E {
    let one = E::one();
    let n_j = sample_totals[j];
    if !has_replication(n_j) {
        return E::nan();
    }
    let (w_j, u_j) = (weights[j], users[j]);
    let column_proportion = proportions.column(j).sum();

    let off_diagonal = error_matrix
        .column(j)
        .iter()
        .zip(weights)
        .zip(sample_totals)
        .enumerate()
        .filter(|&(i, (_, &n_i))| i != j && has_replication(n_i))
        .fold(E::zero(), |acc, (_, ((&count, &w_i), &n_i))| {
            let fraction = count / n_i;
            acc + w_i.powi(2) * fraction * (one - fraction) / (n_i - one)
        });

    (one / column_proportion.powi(2))
        * (w_j.powi(2) * (one - p).powi(2) * u_j * (one - u_j) / (n_j - one)
            + p.powi(2) * off_diagonal)
}

/// $\sum_i W_i^2 U_i (1 - U_i) / (n_{i \cdot} - 1)$ over strata with at least two samples
fn overall_variance<E: Float>(
    weights: &Array1<E>,
    users: &Array1<E>,
    sample_totals: &Array1<E>,
) -> E {
    let one = E::one();
    weights
        .iter()
        .zip(users)
        .zip(sample_totals)
        .filter(|(_, &n)| has_replication(n))
        .fold(E::zero(), |acc, ((&w, &u), &n)| {
            acc + w.powi(2) * u * (one - u) / (n - one)
        })
}
