use crate::utils::{dot, mean, quantile};
use crate::{Array1, Array2};
use anyhow::{anyhow, bail, Error, Result};
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

/// Draws replicate responses from the posterior predictive distribution
///
/// ```text
/// y_new = X_new beta + eps,  eps ~ N(0, sigma^2)
/// ```
///
/// using `n_draws` parameter sets sampled without replacement from the
/// pooled post-burn-in draws. Each output cell gets its own Gaussian noise
/// draw. The result has shape `(n_draws, n_new)`.
///
/// Fails before any computation when `n_draws` exceeds the pooled sample
/// count, since sampling without replacement cannot be satisfied.
pub fn posterior_predictive_samples(
    beta_pool: &Array2,
    log_sigma2_pool: &[f64],
    x_new: &Array2,
    n_draws: usize,
    seed: u64,
) -> Result<Array2, Error> {
    if beta_pool.len() != log_sigma2_pool.len() {
        bail!(
            "Beta draws ({}) and log-variance draws ({}) must pair up",
            beta_pool.len(),
            log_sigma2_pool.len()
        );
    }
    if n_draws > beta_pool.len() {
        bail!(
            "Requested {} draws from a pool of {} posterior samples",
            n_draws,
            beta_pool.len()
        );
    }
    if let Some(first) = beta_pool.first() {
        let p = first.len();
        if beta_pool.iter().any(|row| row.len() != p) {
            bail!("Pooled beta draws must all have length {}", p);
        }
        if x_new.iter().any(|row| row.len() != p) {
            bail!("Rows of X_new must have length {}", p);
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let picked = index::sample(&mut rng, beta_pool.len(), n_draws);

    let mut draws: Array2 = Vec::with_capacity(n_draws);
    for i in picked {
        let beta = &beta_pool[i];
        let sigma = (log_sigma2_pool[i].exp()).sqrt();
        let row: Array1 = x_new
            .iter()
            .map(|x_row| {
                let z: f64 = rng.sample(StandardNormal);
                dot(x_row, beta) + sigma * z
            })
            .collect();
        draws.push(row);
    }
    Ok(draws)
}

/// Per-observation posterior predictive mean and credible bounds.
#[derive(Debug, Clone)]
pub struct PredictiveInterval {
    pub mean: f64,
    /// 2.5% predictive quantile.
    pub lower: f64,
    /// 97.5% predictive quantile.
    pub upper: f64,
}

/// Column-wise mean and 2.5%/97.5% bounds of a predictive sample set, one
/// entry per held-out observation.
pub fn predictive_intervals(draws: &Array2) -> Result<Vec<PredictiveInterval>, Error> {
    let first = draws
        .first()
        .ok_or_else(|| anyhow!("Can't summarize an empty set of predictive draws"))?;
    let n_new = first.len();
    if draws.iter().any(|row| row.len() != n_new) {
        bail!("Predictive draws must share a common width");
    }

    let mut intervals = Vec::with_capacity(n_new);
    for col in 0..n_new {
        let samples: Array1 = draws.iter().map(|row| row[col]).collect();
        intervals.push(PredictiveInterval {
            mean: mean(&samples)?,
            lower: quantile(&samples, 0.025)?,
            upper: quantile(&samples, 0.975)?,
        });
    }
    Ok(intervals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_pool() -> (Array2, Array1) {
        // Four posterior draws around beta = (1, 2) with tiny variance.
        let betas = vec![
            vec![1.00, 2.00],
            vec![1.05, 1.95],
            vec![0.95, 2.05],
            vec![1.02, 1.98],
        ];
        let log_sigma2 = vec![-20.0, -20.0, -20.0, -20.0];
        (betas, log_sigma2)
    }

    #[test]
    fn test_too_many_draws_is_contract_violation() {
        let (betas, log_sigma2) = toy_pool();
        let x_new = vec![vec![1.0, 0.0]];
        let result = posterior_predictive_samples(&betas, &log_sigma2, &x_new, 5, 0);
        assert!(result.is_err());

        // Mismatched pools are rejected too.
        let result = posterior_predictive_samples(&betas, &log_sigma2[..3], &x_new, 2, 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_shape() {
        let (betas, log_sigma2) = toy_pool();
        let x_new = vec![vec![1.0, 0.0], vec![1.0, 1.0], vec![1.0, -1.0]];
        let draws = posterior_predictive_samples(&betas, &log_sigma2, &x_new, 4, 0).unwrap();
        assert_eq!(draws.len(), 4);
        assert!(draws.iter().all(|row| row.len() == 3));
    }

    #[test]
    fn test_near_zero_noise_collapses_to_mean() {
        // With sigma^2 = exp(-20) the noise is ~4.5e-5, so every draw sits
        // on its own X beta line.
        let (betas, log_sigma2) = toy_pool();
        let x_new = vec![vec![1.0, 1.0]];
        let draws = posterior_predictive_samples(&betas, &log_sigma2, &x_new, 4, 0).unwrap();
        for row in &draws {
            assert!((row[0] - 3.0).abs() < 0.2, "draw {} too far from 3", row[0]);
        }
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let (betas, log_sigma2) = toy_pool();
        let x_new = vec![vec![1.0, 0.5], vec![1.0, -0.5]];
        let a = posterior_predictive_samples(&betas, &log_sigma2, &x_new, 3, 9).unwrap();
        let b = posterior_predictive_samples(&betas, &log_sigma2, &x_new, 3, 9).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_predictive_intervals() {
        // Constant column plus a spread column with known quantiles.
        let draws = vec![
            vec![1.0, 10.0],
            vec![1.0, 20.0],
            vec![1.0, 30.0],
            vec![1.0, 40.0],
        ];
        let intervals = predictive_intervals(&draws).unwrap();
        assert_eq!(intervals.len(), 2);
        assert_abs_diff_eq!(intervals[0].mean, 1.0);
        assert_abs_diff_eq!(intervals[0].lower, 1.0);
        assert_abs_diff_eq!(intervals[0].upper, 1.0);
        assert_abs_diff_eq!(intervals[1].mean, 25.0);
        assert!(intervals[1].lower < intervals[1].mean);
        assert!(intervals[1].upper > intervals[1].mean);

        assert!(predictive_intervals(&vec![]).is_err());
        assert!(predictive_intervals(&vec![vec![1.0], vec![1.0, 2.0]]).is_err());
    }
}
