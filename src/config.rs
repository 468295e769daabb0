use std::fs;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2};
use num_traits::Float;
use serde::{Deserialize, Serialize};

use crate::accuracy::ProducerVariance;
use crate::analysis::{Analysis, AnalysisBuilder, DEFAULT_CONFIDENCE_LEVEL};
use crate::{Error, Result};

const fn default_confidence_level() -> f64 {
    DEFAULT_CONFIDENCE_LEVEL
}

/// On-disk description of an assessment
///
/// ```toml
/// pixel_size = 30.0
/// mapped_pixels = [750, 250]
/// error_matrix = [[70, 10], [5, 115]]
/// ```
///
/// The error matrix can instead be read from a headerless CSV file with `error_matrix_file`,
/// resolved relative to the directory of the TOML file.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Side length of a pixel, in ground units
    pub pixel_size: f64,
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
    #[serde(default)]
    pub producer_variance: ProducerVariance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_names: Option<Vec<String>>,
    pub mapped_pixels: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_matrix: Option<Vec<Vec<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_matrix_file: Option<PathBuf>,
}

impl AnalysisConfig {
    /// Read a configuration from a TOML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a valid configuration.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut config: Self = toml::from_str(&contents)?;

        if let Some(file) = config.error_matrix_file.take() {
            config.error_matrix_file = Some(match path.parent() {
                Some(parent) if file.is_relative() => parent.join(file),
                _ => file,
            });
        }

        Ok(config)
    }

    /// The error matrix, from whichever source the configuration names
    ///
    /// # Errors
    /// Returns an error unless exactly one source is given, or if the matrix is ragged or its
    /// file cannot be read.
    pub fn error_matrix(&self) -> Result<Array2<f64>> {
        match (&self.error_matrix, &self.error_matrix_file) {
            (Some(rows), None) => matrix_from_rows(rows.clone()),
            (None, Some(path)) => read_error_matrix(path),
            (Some(_), Some(_)) => Err(Error::InvalidInput(
                "give either `error_matrix` or `error_matrix_file`, not both".into(),
            )),
            (None, None) => Err(Error::InvalidInput(
                "one of `error_matrix` or `error_matrix_file` is required".into(),
            )),
        }
    }

    /// Labels for the classes, defaulting to `Class 1` to `Class q`
    ///
    /// # Errors
    /// Returns an error if names are given but their number differs from `num_classes`.
    pub fn class_names(&self, num_classes: usize) -> Result<Vec<String>> {
        match &self.class_names {
            Some(names) if names.len() != num_classes => Err(Error::LengthMismatch {
                what: "class names",
                found: names.len(),
                expected: num_classes,
            }),
            Some(names) => Ok(names.clone()),
            None => Ok(default_class_names(num_classes)),
        }
    }

    /// Validate the configuration into an [`Analysis`]
    ///
    /// # Errors
    /// Returns an error if the error matrix cannot be assembled or the inputs are inconsistent.
    pub fn to_analysis(&self) -> Result<Analysis<f64>> {
        AnalysisBuilder::new(self.pixel_size, Array1::from_vec(self.mapped_pixels.clone()))
            .with_confidence_level(self.confidence_level)
            .with_producer_variance(self.producer_variance)
            .with_error_matrix(self.error_matrix()?)
            .build()
    }
}

pub fn default_class_names(num_classes: usize) -> Vec<String> {
    (1..=num_classes).map(|ii| format!("Class {ii}")).collect()
}

/// Assemble a matrix from nested rows, rejecting rows of differing length
///
/// # Errors
/// Returns [`Error::RaggedRow`] for the first row whose length differs from the first row.
pub fn matrix_from_rows<E: Float>(rows: Vec<Vec<E>>) -> Result<Array2<E>> {
    let num_rows = rows.len();
    let num_columns = rows.first().map_or(0, Vec::len);

    if let Some((row, found)) = rows
        .iter()
        .map(Vec::len)
        .enumerate()
        .find(|(_, len)| *len != num_columns)
    {
        return Err(Error::RaggedRow {
            row,
            found,
            expected: num_columns,
        });
    }

    let flat = rows.into_iter().flatten().collect::<Vec<_>>();
    Array2::from_shape_vec((num_rows, num_columns), flat)
        .map_err(|e| Error::InvalidInput(e.to_string()))
}

/// Read an error matrix from a headerless CSV file, one matrix row per line
///
/// # Errors
/// Returns an error if the file cannot be read, a field is not a number, or rows have differing
/// lengths.
pub fn read_error_matrix(path: &Path) -> Result<Array2<f64>> {
    let file = fs::read(path).map_err(|e| Error::io(path, e))?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(&file[..]);

    let mut rows = vec![];
    for result in rdr.deserialize() {
        let row: Vec<f64> = result?;
        rows.push(row);
    }

    matrix_from_rows(rows)
}

#[cfg(test)]
mod tests {
    use ndarray::arr2;
    use tempdir::TempDir;

    use crate::accuracy::ProducerVariance;
    use crate::{Error, Result};

    use super::{matrix_from_rows, read_error_matrix, AnalysisConfig};

    #[test]
    fn inline_configuration_is_parsed_with_defaults() -> Result<()> {
        let config: AnalysisConfig = toml::from_str(
            r"
            pixel_size = 30
            mapped_pixels = [750, 250]
            error_matrix = [[70, 10], [5, 115]]
            ",
        )?;

        assert_eq!(config.confidence_level, 0.95);
        assert_eq!(config.producer_variance, ProducerVariance::Reference);
        assert_eq!(config.error_matrix()?, arr2(&[[70., 10.], [5., 115.]]));
        assert_eq!(config.class_names(2)?, vec!["Class 1", "Class 2"]);
        Ok(())
    }

    #[test]
    fn producer_variance_is_read_in_kebab_case() -> Result<()> {
        let config: AnalysisConfig = toml::from_str(
            r#"
            pixel_size = 10.0
            producer_variance = "per-stratum"
            mapped_pixels = [1]
            error_matrix = [[3]]
            "#,
        )?;
        assert_eq!(config.producer_variance, ProducerVariance::PerStratum);
        Ok(())
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let config = toml::from_str::<AnalysisConfig>(
            r"
            pixel_size = 10.0
            pixel_sise = 10.0
            mapped_pixels = [1]
            error_matrix = [[3]]
            ",
        );
        assert!(config.is_err());
    }

    #[test]
    fn mismatched_class_names_are_rejected() -> Result<()> {
        let config: AnalysisConfig = toml::from_str(
            r#"
            pixel_size = 10.0
            class_names = ["Forest"]
            mapped_pixels = [1, 2]
            error_matrix = [[3, 0], [0, 3]]
            "#,
        )?;
        assert!(matches!(
            config.class_names(2),
            Err(Error::LengthMismatch { found: 1, .. })
        ));
        Ok(())
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let rows = vec![vec![1., 2., 3.], vec![4., 5.], vec![6., 7., 8.]];
        assert!(matches!(
            matrix_from_rows(rows),
            Err(Error::RaggedRow {
                row: 1,
                found: 2,
                expected: 3
            })
        ));
    }

    #[test]
    fn matrix_is_read_from_csv() -> Result<()> {
        let tmp_dir = TempDir::new("matrix_is_read_from_csv").unwrap();
        let path = tmp_dir.path().join("matrix.csv");
        std::fs::write(&path, "70, 10, 0\n5, 115, 3\n0, 2, 40\n").unwrap();

        let matrix = read_error_matrix(&path)?;

        assert_eq!(
            matrix,
            arr2(&[[70., 10., 0.], [5., 115., 3.], [0., 2., 40.]])
        );
        Ok(())
    }

    #[test]
    fn non_numeric_csv_fields_are_rejected() {
        let tmp_dir = TempDir::new("non_numeric_csv_fields_are_rejected").unwrap();
        let path = tmp_dir.path().join("matrix.csv");
        std::fs::write(&path, "70,10\n5,abc\n").unwrap();

        assert!(matches!(read_error_matrix(&path), Err(Error::Csv(_))));
    }

    #[test]
    fn both_matrix_sources_are_rejected() -> Result<()> {
        let config: AnalysisConfig = toml::from_str(
            r#"
            pixel_size = 10.0
            mapped_pixels = [1]
            error_matrix = [[3]]
            error_matrix_file = "matrix.csv"
            "#,
        )?;
        assert!(matches!(config.error_matrix(), Err(Error::InvalidInput(_))));
        Ok(())
    }
}
