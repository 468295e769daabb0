use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use stratified_accuracy::accuracy::ProducerVariance;
use stratified_accuracy::config::AnalysisConfig;
use stratified_accuracy::report::{save_csv, Report};
use stratified_accuracy::Result;

#[derive(Parser, Debug)]
#[command(
    name = "stratified-accuracy",
    about = "Map accuracy, error-adjusted area and their confidence intervals from a stratified sample"
)]
struct Args {
    /// TOML file with the pixel size, error matrix (rows are reference classes, columns are map
    /// classes) and the number of mapped pixels of each class.
    config: PathBuf,

    /// Save the per-class results to this CSV file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Confidence level of the reported intervals, e.g. 0.9. Overrides the configuration.
    #[arg(short, long)]
    confidence_level: Option<f64>,

    /// Estimator for the variance of producer's accuracy. Overrides the configuration.
    #[arg(short, long, value_enum)]
    producer_variance: Option<VarianceMethod>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VarianceMethod {
    /// Match the published reference tool, using the last stratum for every column.
    Reference,
    /// The stratified estimator of Olofsson et al. (2014), weighting each stratum by its area.
    PerStratum,
}

impl From<VarianceMethod> for ProducerVariance {
    fn from(value: VarianceMethod) -> Self {
        match value {
            VarianceMethod::Reference => Self::Reference,
            VarianceMethod::PerStratum => Self::PerStratum,
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = AnalysisConfig::from_file(&args.config)?;
    if let Some(confidence_level) = args.confidence_level {
        config.confidence_level = confidence_level;
    }
    if let Some(method) = args.producer_variance {
        config.producer_variance = method.into();
    }

    let analysis = config.to_analysis()?;
    let class_names = config.class_names(analysis.num_classes())?;
    let result = analysis.run();

    println!("{}", Report::new(&result, &class_names)?);

    if let Some(output) = &args.output {
        save_csv(output, &result, &class_names)?;
        println!("Results saved to {}", output.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
