use crate::utils::dot;
use crate::{Array1, Array2};
use anyhow::{anyhow, Error, Result};
use statrs::function::gamma::ln_gamma;
use std::f64::consts::PI;

/// Lower numerical floor for the noise variance. Proposals whose variance
/// falls at or below this value are rejected by returning a log-density of
/// negative infinity.
pub const SIGMA2_FLOOR: f64 = 1e-12;
/// Upper numerical ceiling for the noise variance.
pub const SIGMA2_CEILING: f64 = 1e6;

/// Prior hyperparameters: independent N(0, tau2) on each coefficient and
/// Inv-Gamma(a0, b0) on the noise variance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Priors {
    pub tau2: f64,
    pub a0: f64,
    pub b0: f64,
}

impl Default for Priors {
    fn default() -> Self {
        Priors {
            tau2: 10.0,
            a0: 2.0,
            b0: 1.0,
        }
    }
}

/// Log-density of Inv-Gamma(a0, b0) at `sigma2`:
///
/// ```text
/// log p(s^2) = a0 log b0 - log Gamma(a0) - (a0 + 1) log s^2 - b0 / s^2
/// ```
///
/// Returns negative infinity for non-positive `sigma2`. Evaluated via the
/// log-gamma function for numerical stability.
pub fn log_inv_gamma_pdf(sigma2: f64, a0: f64, b0: f64) -> f64 {
    if sigma2 <= 0.0 {
        return f64::NEG_INFINITY;
    }
    a0 * b0.ln() - ln_gamma(a0) - (a0 + 1.0) * sigma2.ln() - b0 / sigma2
}

/// Fixed regression data plus prior hyperparameters. Evaluates the
/// unnormalized log posterior of a `(beta, log sigma^2)` pair; holds only
/// owned, read-only data and is safe to share across chains.
#[derive(Debug, Clone)]
pub struct PosteriorModel {
    x: Array2,
    y: Array1,
    priors: Priors,
}

impl PosteriorModel {
    /// Creates a model from a row-wise design matrix (intercept column
    /// included) and its paired response vector.
    pub fn new(x: Array2, y: Array1, priors: Priors) -> Result<Self, Error> {
        if x.is_empty() {
            return Err(anyhow!("Design matrix must have at least one row"));
        }
        let p = x[0].len();
        if p == 0 {
            return Err(anyhow!("Design matrix must have at least one column"));
        }
        if x.iter().any(|row| row.len() != p) {
            return Err(anyhow!("Design matrix rows must all have length {}", p));
        }
        if y.len() != x.len() {
            return Err(anyhow!(
                "Response length {} does not match {} design rows",
                y.len(),
                x.len()
            ));
        }
        Ok(PosteriorModel { x, y, priors })
    }

    /// Number of observations.
    pub fn n(&self) -> usize {
        self.y.len()
    }

    /// Number of coefficients (intercept included).
    pub fn p(&self) -> usize {
        self.x[0].len()
    }

    pub fn priors(&self) -> Priors {
        self.priors
    }

    /// Log of the unnormalized joint posterior density at
    /// `(beta, log_sigma2)`, or negative infinity if the point is
    /// inadmissible.
    ///
    /// The sampler works in log-variance space, so the Inv-Gamma prior on
    /// the variance picks up the Jacobian term `+log_sigma2` for the
    /// transformation `sigma^2 = exp(log sigma^2)`. Deterministic and
    /// side-effect free.
    pub fn log_posterior(&self, beta: &[f64], log_sigma2: f64) -> f64 {
        debug_assert_eq!(beta.len(), self.p());
        let sigma2 = log_sigma2.exp();
        if sigma2 <= SIGMA2_FLOOR || sigma2 > SIGMA2_CEILING {
            return f64::NEG_INFINITY;
        }

        // Likelihood: y | X, beta, sigma2 ~ N(X beta, sigma2 I)
        let n = self.y.len() as f64;
        let mut rss = 0.0;
        for (row, &yi) in self.x.iter().zip(self.y.iter()) {
            let r = yi - dot(row, beta);
            rss += r * r;
        }
        let ll = -0.5 * n * (2.0 * PI * sigma2).ln() - 0.5 * rss / sigma2;

        // Prior on beta: N(0, tau2 I)
        let p = beta.len() as f64;
        let ss_beta: f64 = beta.iter().map(|b| b * b).sum();
        let lp_beta =
            -0.5 * p * (2.0 * PI * self.priors.tau2).ln() - 0.5 * ss_beta / self.priors.tau2;

        let lp_sigma2 = log_inv_gamma_pdf(sigma2, self.priors.a0, self.priors.b0);

        ll + lp_beta + lp_sigma2 + log_sigma2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_model() -> PosteriorModel {
        let x = vec![vec![1.0, 2.0], vec![1.0, -1.0]];
        let y = vec![1.0, 0.5];
        PosteriorModel::new(x, y, Priors::default()).unwrap()
    }

    #[test]
    fn test_log_inv_gamma_known_values() {
        // Expected values computed with scipy.special.gammaln.
        assert_abs_diff_eq!(log_inv_gamma_pdf(1.0, 2.0, 1.0), -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            log_inv_gamma_pdf(2.0, 2.0, 1.0),
            -2.5794415416798357,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            log_inv_gamma_pdf(1.0, 3.0, 2.0),
            -0.6137056388801092,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            log_inv_gamma_pdf(0.5, 2.5, 1.5),
            0.1549950317572999,
            epsilon = 1e-12
        );
        assert_eq!(log_inv_gamma_pdf(0.0, 2.0, 1.0), f64::NEG_INFINITY);
        assert_eq!(log_inv_gamma_pdf(-1.0, 2.0, 1.0), f64::NEG_INFINITY);
    }

    #[test]
    fn test_log_posterior_known_values() {
        // Single observation, flat residual: hand-computed reference value.
        let m = PosteriorModel::new(vec![vec![1.0]], vec![0.0], Priors::default()).unwrap();
        assert_abs_diff_eq!(
            m.log_posterior(&[0.0], 0.0),
            -3.9891696129063683,
            epsilon = 1e-12
        );

        // Two observations, nonzero residuals and log-variance.
        let m = toy_model();
        assert_abs_diff_eq!(
            m.log_posterior(&[0.3, -0.2], 0.4),
            -8.260702899699938,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_log_posterior_is_deterministic() {
        let m = toy_model();
        let a = m.log_posterior(&[0.1, 0.2], -0.3);
        let b = m.log_posterior(&[0.1, 0.2], -0.3);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_variance_guard_rails() {
        let m = toy_model();
        // exp(-30) is below the variance floor.
        assert_eq!(m.log_posterior(&[0.0, 0.0], -30.0), f64::NEG_INFINITY);
        // exp(20) exceeds the variance ceiling.
        assert_eq!(m.log_posterior(&[0.0, 0.0], 20.0), f64::NEG_INFINITY);
        // exp(1000) overflows to infinity and is rejected, not propagated.
        assert_eq!(m.log_posterior(&[0.0, 0.0], 1000.0), f64::NEG_INFINITY);
        assert!(m.log_posterior(&[0.0, 0.0], 0.0).is_finite());
    }

    #[test]
    fn test_shape_validation() {
        assert!(PosteriorModel::new(vec![], vec![], Priors::default()).is_err());
        assert!(PosteriorModel::new(vec![vec![]], vec![1.0], Priors::default()).is_err());
        assert!(
            PosteriorModel::new(vec![vec![1.0], vec![1.0, 2.0]], vec![1.0, 2.0], Priors::default())
                .is_err()
        );
        assert!(PosteriorModel::new(vec![vec![1.0]], vec![1.0, 2.0], Priors::default()).is_err());

        let m = toy_model();
        assert_eq!(m.n(), 2);
        assert_eq!(m.p(), 2);
        assert_abs_diff_eq!(m.priors().tau2, 10.0);
    }
}
