use std::marker::PhantomData;

use itertools::izip;
use ndarray::{Array, Array1, Array2, Dimension, IntoDimension};
use num_traits::Float;

use crate::accuracy::{estimate_accuracy, ProducerVariance};
use crate::area::{area_uncertainty, error_adjusted_area};
use crate::distributions::critical_value;
use crate::margin::Estimate;
use crate::math::cast;
use crate::proportion::area_proportions;
use crate::weights::compute_weights;
use crate::{Error, Result};

pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Run a complete accuracy and area assessment
///
/// `error_matrix` holds the sample counts, with rows the reference classes and columns the map
/// classes, `mapped_pixels` the number of pixels the map assigns to each class and `pixel_size`
/// the side length of a pixel in ground units.
///
/// # Errors
/// Returns an error if the inputs are inconsistent: a non-square or empty matrix, a mismatched
/// number of mapped pixel counts, negative or non-finite values, a non-positive pixel size or a
/// confidence level outside $(0, 1)$. Statistics which are merely undefined for the sample are
/// reported as such in the result.
pub fn run_analysis<E: Float>(
    pixel_size: E,
    error_matrix: Array2<E>,
    mapped_pixels: Array1<E>,
    confidence_level: E,
) -> Result<AnalysisResult<E>> {
    let analysis = AnalysisBuilder::new(pixel_size, mapped_pixels)
        .with_confidence_level(confidence_level)
        .with_error_matrix(error_matrix)
        .build()?;
    Ok(analysis.run())
}

/// A validated set of inputs for one assessment
#[derive(Clone, Debug)]
pub struct Analysis<E> {
    pixel_size: E,
    error_matrix: Array2<E>,
    mapped_pixels: Array1<E>,
    confidence_level: E,
    critical_value: E,
    producer_variance: ProducerVariance,
}

impl<E: Float> Analysis<E> {
    pub fn num_classes(&self) -> usize {
        self.mapped_pixels.len()
    }

    pub const fn error_matrix(&self) -> &Array2<E> {
        &self.error_matrix
    }

    pub const fn mapped_pixels(&self) -> &Array1<E> {
        &self.mapped_pixels
    }

    pub fn confidence_level(&self) -> E {
        self.confidence_level
    }

    /// Area covered by the map, the number of mapped pixels times the area of one pixel
    pub fn total_area(&self) -> E {
        self.mapped_pixels.sum() * self.pixel_size.powi(2)
    }

    /// Estimate accuracy and error-adjusted area for every class
    #[must_use]
    pub fn run(&self) -> AnalysisResult<E> {
        let weights = compute_weights(&self.mapped_pixels);
        let proportions = area_proportions(&self.error_matrix, &weights);
        let total_area = self.total_area();

        let accuracy = estimate_accuracy(
            &proportions,
            &self.error_matrix,
            &weights,
            self.critical_value,
            self.producer_variance,
        );

        let adjusted_areas = error_adjusted_area(&proportions, total_area);
        let areas = area_uncertainty(
            &self.error_matrix,
            &weights,
            &adjusted_areas,
            total_area,
            self.critical_value,
        );

        let classes = izip!(accuracy.user, accuracy.producer, areas)
            .map(|(user, producer, area)| ClassResult {
                user,
                producer,
                area,
            })
            .collect();

        AnalysisResult {
            classes,
            overall: accuracy.overall,
            total_area,
            confidence_level: self.confidence_level,
            weights,
            proportions,
        }
    }
}

/// Estimates for a single class
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassResult<E> {
    pub user: Estimate<E>,
    pub producer: Estimate<E>,
    /// Error-adjusted area, in the squared units of the pixel size
    pub area: Estimate<E>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisResult<E> {
    /// One entry per class, in the order of the error matrix rows
    pub classes: Vec<ClassResult<E>>,
    pub overall: Estimate<E>,
    pub total_area: E,
    pub confidence_level: E,
    /// Stratum weights derived from the mapped pixel counts
    pub weights: Array1<E>,
    /// Estimated area proportion matrix
    pub proportions: Array2<E>,
}

pub enum Set {}
pub enum Unset {}

/// Collects the inputs of an [`Analysis`]
///
/// The error matrix must be supplied before the analysis can be built; the confidence level
/// defaults to 95% and producer's accuracy variance to [`ProducerVariance::Reference`].
pub struct AnalysisBuilder<E, N> {
    pixel_size: E,
    mapped_pixels: Array1<E>,
    error_matrix: Array2<E>,
    confidence_level: E,
    producer_variance: ProducerVariance,
    phantom_data: PhantomData<N>,
}

impl<E: Float> AnalysisBuilder<E, Unset> {
    pub fn new(pixel_size: E, mapped_pixels: Array1<E>) -> Self {
        Self {
            pixel_size,
            mapped_pixels,
            error_matrix: Array2::zeros((0, 0)),
            confidence_level: cast(DEFAULT_CONFIDENCE_LEVEL),
            producer_variance: ProducerVariance::default(),
            phantom_data: PhantomData,
        }
    }

    #[must_use]
    pub fn with_error_matrix(self, error_matrix: Array2<E>) -> AnalysisBuilder<E, Set> {
        AnalysisBuilder {
            pixel_size: self.pixel_size,
            mapped_pixels: self.mapped_pixels,
            error_matrix,
            confidence_level: self.confidence_level,
            producer_variance: self.producer_variance,
            phantom_data: PhantomData,
        }
    }
}

impl<E: Float, N> AnalysisBuilder<E, N> {
    #[must_use]
    pub fn with_confidence_level(mut self, confidence_level: E) -> Self {
        self.confidence_level = confidence_level;
        self
    }

    #[must_use]
    pub fn with_producer_variance(mut self, producer_variance: ProducerVariance) -> Self {
        self.producer_variance = producer_variance;
        self
    }
}

impl<E: Float> AnalysisBuilder<E, Set> {
    /// Validate the collected inputs
    ///
    /// # Errors
    /// Returns an error describing the first inconsistency found in the inputs.
    pub fn build(self) -> Result<Analysis<E>> {
        if !(self.pixel_size.is_finite() && self.pixel_size > E::zero()) {
            return Err(Error::InvalidPixelSize);
        }

        let (rows, columns) = self.error_matrix.dim();
        if rows == 0 && columns == 0 {
            return Err(Error::Empty);
        }
        if rows != columns {
            return Err(Error::NotSquare { rows, columns });
        }
        if self.mapped_pixels.len() != rows {
            return Err(Error::LengthMismatch {
                what: "mapped pixels",
                found: self.mapped_pixels.len(),
                expected: rows,
            });
        }

        check_counts("error matrix", &self.error_matrix)?;
        check_counts("mapped pixels", &self.mapped_pixels)?;

        let critical_value = critical_value(self.confidence_level)?;

        Ok(Analysis {
            pixel_size: self.pixel_size,
            error_matrix: self.error_matrix,
            mapped_pixels: self.mapped_pixels,
            confidence_level: self.confidence_level,
            critical_value,
            producer_variance: self.producer_variance,
        })
    }
}

/// Counts must be finite and non-negative
fn check_counts<E: Float, D: Dimension>(what: &'static str, counts: &Array<E, D>) -> Result<()> {
    for (index, &count) in counts.indexed_iter() {
        let index = || index.clone().into_dimension().slice().to_vec();
        if !count.is_finite() {
            return Err(Error::NonFinite {
                what,
                index: index(),
            });
        }
        if count < E::zero() {
            return Err(Error::NegativeValue {
                what,
                index: index(),
            });
        }
    }
    Ok(())
}
