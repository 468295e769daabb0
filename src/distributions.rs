use num_traits::Float;

use crate::math::cast;
use crate::{Error, Result};

/// The quantile function of the standard normal distribution
///
/// Sampling errors of the stratified estimators are assumed to be normally distributed, so the
/// standard normal quantiles scale standard errors into confidence intervals.
///
/// Uses the rational approximations of Wichura (1988), algorithm AS 241, which are accurate to about
/// 1 part in $10^{16}$. Probabilities outside $(0, 1)$ map to $\mp\infty$ at the bounds and NaN
/// elsewhere.
#[allow(clippy::excessive_precision, clippy::unreadable_literal)]
pub(crate) fn standard_normal_quantile(probability: f64) -> f64 {
    if probability.is_nan() || !(0.0..=1.0).contains(&probability) {
        return f64::NAN;
    }
    if probability == 0.0 {
        return f64::NEG_INFINITY;
    }
    if probability == 1.0 {
        return f64::INFINITY;
    }

    let q = probability - 0.5;
    if q.abs() <= 0.425 {
        let r = 0.180625 - q * q;
        q * (((((((r * 2509.0809287301226727 + 33430.575583588128105) * r
            + 67265.770927008700853)
            * r
            + 45921.953931549871457)
            * r
            + 13731.693765509461125)
            * r
            + 1971.5909503065514427)
            * r
            + 133.14166789178437745)
            * r
            + 3.387132872796366608)
            / (((((((r * 5226.495278852545925 + 28729.085735721942674) * r
                + 39307.89580009271061)
                * r
                + 21213.794301586595867)
                * r
                + 5394.1960214247511077)
                * r
                + 687.1870074920579083)
                * r
                + 42.313330701600911252)
                * r
                + 1.0)
    } else {
        let tail = if q < 0.0 {
            probability
        } else {
            1.0 - probability
        };
        let r = (-tail.ln()).sqrt();
        let magnitude = if r <= 5.0 {
            let r = r - 1.6;
            (((((((r * 7.7454501427834140764e-4 + 0.0227238449892691845833) * r
                + 0.24178072517745061177)
                * r
                + 1.27045825245236838258)
                * r
                + 3.64784832476320460504)
                * r
                + 5.7694972214606914055)
                * r
                + 4.6303378461565452959)
                * r
                + 1.42343711074968357734)
                / (((((((r * 1.05075007164441684324e-9 + 5.475938084995344946e-4) * r
                    + 0.0151986665636164571966)
                    * r
                    + 0.14810397642748007459)
                    * r
                    + 0.68976733498510000455)
                    * r
                    + 1.6763848301838038494)
                    * r
                    + 2.05319162663775882187)
                    * r
                    + 1.0)
        } else {
            let r = r - 5.0;
            (((((((r * 2.01033439929228813265e-7 + 2.71155556874348757815e-5) * r
                + 0.0012426609473880784386)
                * r
                + 0.026532189526576123093)
                * r
                + 0.29656057182850489123)
                * r
                + 1.7848265399172913358)
                * r
                + 5.4637849111641143699)
                * r
                + 6.6579046435011037772)
                / (((((((r * 2.04426310338993978564e-15 + 1.4215117583164458887e-7) * r
                    + 1.8463183175100546818e-5)
                    * r
                    + 7.868691311456132591e-4)
                    * r
                    + 0.0148753612908506148525)
                    * r
                    + 0.13692988092273580531)
                    * r
                    + 0.59983220655588793769)
                    * r
                    + 1.0)
        };
        if q < 0.0 {
            -magnitude
        } else {
            magnitude
        }
    }
}

/// The two-sided critical value $z$ of the standard normal distribution for `confidence_level`
///
/// This is the quantile at $1 - (1 - c) / 2$, so that a fraction $c$ of the probability mass lies
/// within $\pm z$.
///
/// # Errors
/// Returns [`Error::InvalidConfidenceLevel`] unless `confidence_level` lies strictly between zero
/// and one.
pub fn critical_value<E: Float>(confidence_level: E) -> Result<E> {
    let confidence_level = confidence_level
        .to_f64()
        .filter(|c| *c > 0.0 && *c < 1.0)
        .ok_or(Error::InvalidConfidenceLevel)?;
    let z = standard_normal_quantile(1.0 - (1.0 - confidence_level) / 2.0);
    Ok(cast(z))
}
