use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

use num_traits::Float;
use serde::Serialize;

use crate::analysis::AnalysisResult;
use crate::margin::Estimate;
use crate::{Error, Result};

/// One row of the exported table
///
/// The overall accuracy is repeated on every row so the table is rectangular.
#[derive(Debug, Serialize)]
struct Record<'a> {
    #[serde(rename = "Class")]
    class: &'a str,
    #[serde(rename = "User_Accuracy")]
    user_accuracy: Option<f64>,
    #[serde(rename = "User_Accuracy_SE")]
    user_accuracy_se: Option<f64>,
    #[serde(rename = "User_Accuracy_95%CI")]
    user_accuracy_ci: Option<f64>,
    #[serde(rename = "Producer_Accuracy")]
    producer_accuracy: Option<f64>,
    #[serde(rename = "Producer_Accuracy_SE")]
    producer_accuracy_se: Option<f64>,
    #[serde(rename = "Producer_Accuracy_95%CI")]
    producer_accuracy_ci: Option<f64>,
    #[serde(rename = "Error_Adjusted_Area")]
    error_adjusted_area: Option<f64>,
    #[serde(rename = "Error_Adjusted_Area_SE")]
    error_adjusted_area_se: Option<f64>,
    #[serde(rename = "Error_Adjusted_Area_95%CI_Value")]
    error_adjusted_area_ci: Option<f64>,
    #[serde(rename = "Overall_Accuracy")]
    overall_accuracy: Option<f64>,
    #[serde(rename = "Overall_Accuracy_SE")]
    overall_accuracy_se: Option<f64>,
    #[serde(rename = "Overall_Accuracy_95%CI")]
    overall_accuracy_ci: Option<f64>,
}

/// An [`Estimate`] flattened to `f64` columns
fn columns<E: Float>(estimate: &Estimate<E>) -> (Option<f64>, Option<f64>, Option<f64>) {
    (
        estimate.value.and_then(|v| v.to_f64()),
        estimate.standard_error.and_then(|v| v.to_f64()),
        estimate.margin.and_then(|v| v.to_f64()),
    )
}

fn check_labels<E>(result: &AnalysisResult<E>, class_names: &[String]) -> Result<()> {
    if class_names.len() == result.classes.len() {
        Ok(())
    } else {
        Err(Error::LengthMismatch {
            what: "class names",
            found: class_names.len(),
            expected: result.classes.len(),
        })
    }
}

/// Write the per-class table as CSV, leaving undefined statistics empty
///
/// # Errors
/// Returns an error if the number of `class_names` differs from the number of classes, or if
/// writing fails.
pub fn write_csv<W: io::Write, E: Float>(
    writer: W,
    result: &AnalysisResult<E>,
    class_names: &[String],
) -> Result<()> {
    check_labels(result, class_names)?;

    let (overall_accuracy, overall_accuracy_se, overall_accuracy_ci) = columns(&result.overall);
    let mut wtr = csv::Writer::from_writer(writer);

    for (name, class) in class_names.iter().zip(&result.classes) {
        let (user_accuracy, user_accuracy_se, user_accuracy_ci) = columns(&class.user);
        let (producer_accuracy, producer_accuracy_se, producer_accuracy_ci) =
            columns(&class.producer);
        let (error_adjusted_area, error_adjusted_area_se, error_adjusted_area_ci) =
            columns(&class.area);

        wtr.serialize(Record {
            class: name,
            user_accuracy,
            user_accuracy_se,
            user_accuracy_ci,
            producer_accuracy,
            producer_accuracy_se,
            producer_accuracy_ci,
            error_adjusted_area,
            error_adjusted_area_se,
            error_adjusted_area_ci,
            overall_accuracy,
            overall_accuracy_se,
            overall_accuracy_ci,
        })?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Save the per-class table to `path`
///
/// Labels are checked before the file is created, so no partial table is left behind for
/// mismatched inputs.
///
/// # Errors
/// Returns an error if the labels do not match the result or the file cannot be written.
pub fn save_csv<E: Float>(
    path: &Path,
    result: &AnalysisResult<E>,
    class_names: &[String],
) -> Result<()> {
    check_labels(result, class_names)?;
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    write_csv(file, result, class_names)
}

/// Human readable summary of an [`AnalysisResult`]
pub struct Report<'a, E> {
    result: &'a AnalysisResult<E>,
    class_names: &'a [String],
}

impl<'a, E: Float> Report<'a, E> {
    /// # Errors
    /// Returns an error if the number of `class_names` differs from the number of classes.
    pub fn new(result: &'a AnalysisResult<E>, class_names: &'a [String]) -> Result<Self> {
        check_labels(result, class_names)?;
        Ok(Self {
            result,
            class_names,
        })
    }
}

struct Fixed<E>(Option<E>, usize);

impl<E: Float> fmt::Display for Fixed<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.and_then(|v| v.to_f64()) {
            Some(v) => write!(f, "{v:.prec$}", prec = self.1),
            None => write!(f, "NaN"),
        }
    }
}

fn write_estimate<E: Float>(
    f: &mut fmt::Formatter<'_>,
    estimate: &Estimate<E>,
    precision: usize,
    level: f64,
) -> fmt::Result {
    write!(
        f,
        "{}, SE={}, {level}% CI={}",
        Fixed(estimate.value, precision),
        Fixed(estimate.standard_error, precision),
        Fixed(estimate.margin, precision),
    )
}

impl<E: Float> fmt::Display for Report<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = self
            .result
            .confidence_level
            .to_f64()
            .map_or(f64::NAN, |c| (c * 1e8).round() / 1e6);

        writeln!(f, "User's Accuracy per Class:")?;
        for (name, class) in self.class_names.iter().zip(&self.result.classes) {
            write!(f, "  {name}: ")?;
            write_estimate(f, &class.user, 4, level)?;
            writeln!(f)?;
        }

        writeln!(f, "\nProducer's Accuracy per Class:")?;
        for (name, class) in self.class_names.iter().zip(&self.result.classes) {
            write!(f, "  {name}: ")?;
            write_estimate(f, &class.producer, 4, level)?;
            writeln!(f)?;
        }

        write!(f, "\nOverall Accuracy: ")?;
        write_estimate(f, &self.result.overall, 4, level)?;
        writeln!(f)?;

        writeln!(f, "\nError-Adjusted Area per Class:")?;
        for (name, class) in self.class_names.iter().zip(&self.result.classes) {
            write!(f, "  {name}: ")?;
            write_estimate(f, &class.area, 2, level)?;
            writeln!(f)?;
        }

        Ok(())
    }
}
