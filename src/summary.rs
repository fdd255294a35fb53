use crate::diagnostics::{ess_from_acf, geweke_z, GEWEKE_FIRST, GEWEKE_LAST};
use crate::rhat::split_rhat;
use crate::sampler::{pool_post_burn, ChainRun};
use crate::utils::{mean, median, nan_max_abs, nan_mean, nan_min, quantile, sample_variance};
use crate::{Array1, Array2};
use anyhow::{anyhow, bail, Error, Result};

/// Number of leading coefficients reported in the diagnostics and MCSE
/// tables: the intercept plus the first three predictors. Models with more
/// predictors deliberately keep the same fixed reporting subset.
pub const N_REPORTED_COEFFS: usize = 4;
/// Label used for the log-variance rows.
pub const LOG_SIGMA2_LABEL: &str = "log(sigma^2)";
/// Maximum autocorrelation lag used when estimating ESS for the tables.
pub const ESS_MAX_LAG: usize = 300;

/// One row of the convergence diagnostics table: Rhat across chains plus
/// per-chain ESS and Geweke-z reduced with NaN-aware aggregations, so a
/// degenerate value from one chain does not invalidate the whole row.
#[derive(Debug, Clone)]
pub struct DiagnosticsRow {
    pub param: String,
    pub rhat: f64,
    pub ess_min: f64,
    pub ess_mean: f64,
    pub geweke_mean: f64,
    pub geweke_max_abs: f64,
}

fn diagnostics_row(param: &str, post: &Array2) -> Result<DiagnosticsRow, Error> {
    let rhat = split_rhat(post)?;
    let ess: Array1 = post.iter().map(|s| ess_from_acf(s, ESS_MAX_LAG)).collect();
    let geweke: Array1 = post
        .iter()
        .map(|s| geweke_z(s, GEWEKE_FIRST, GEWEKE_LAST))
        .collect();
    Ok(DiagnosticsRow {
        param: param.to_string(),
        rhat,
        ess_min: nan_min(&ess),
        ess_mean: nan_mean(&ess),
        geweke_mean: nan_mean(&geweke),
        geweke_max_abs: nan_max_abs(&geweke),
    })
}

fn check_names(chains: &[ChainRun], param_names: &[String]) -> Result<usize, Error> {
    let first = chains
        .first()
        .ok_or_else(|| anyhow!("Can't summarize an empty set of chains"))?;
    let (p, n_iter, burn_in) = (first.p(), first.n_iter(), first.burn_in());
    if chains
        .iter()
        .any(|c| c.p() != p || c.n_iter() != n_iter || c.burn_in() != burn_in)
    {
        bail!("Chains must share p, n_iter and burn_in to be summarized");
    }
    if param_names.len() != p {
        bail!(
            "Got {} parameter names for {} coefficients",
            param_names.len(),
            p
        );
    }
    Ok(p)
}

/// Builds the convergence diagnostics table over the post-burn-in traces of
/// all chains: one row per reported coefficient plus one for the
/// log-variance.
pub fn build_diagnostics_table(
    chains: &[ChainRun],
    param_names: &[String],
) -> Result<Vec<DiagnosticsRow>, Error> {
    let p = check_names(chains, param_names)?;

    let mut rows = Vec::new();
    for idx in 0..N_REPORTED_COEFFS.min(p) {
        let post: Array2 = chains.iter().map(|c| c.beta_post(idx).to_vec()).collect();
        rows.push(diagnostics_row(&param_names[idx], &post)?);
    }
    let post_sigma: Array2 = chains
        .iter()
        .map(|c| c.log_sigma2_post().to_vec())
        .collect();
    rows.push(diagnostics_row(LOG_SIGMA2_LABEL, &post_sigma)?);
    Ok(rows)
}

/// One row of the posterior summary table, computed over the pooled
/// post-burn-in draws of all chains.
#[derive(Debug, Clone)]
pub struct SummaryRow {
    pub param: String,
    pub post_mean: f64,
    pub post_median: f64,
    /// 2.5% posterior quantile.
    pub ci_lower: f64,
    /// 97.5% posterior quantile.
    pub ci_upper: f64,
    /// Posterior probability that the coefficient is positive.
    pub prob_positive: f64,
}

/// Posterior summary statistics for every coefficient.
pub fn posterior_summary(
    chains: &[ChainRun],
    param_names: &[String],
) -> Result<Vec<SummaryRow>, Error> {
    let p = check_names(chains, param_names)?;
    let (beta_rows, _) = pool_post_burn(chains)?;

    let mut rows = Vec::with_capacity(p);
    for j in 0..p {
        let draws: Array1 = beta_rows.iter().map(|row| row[j]).collect();
        rows.push(SummaryRow {
            param: param_names[j].clone(),
            post_mean: mean(&draws)?,
            post_median: median(&draws)?,
            ci_lower: quantile(&draws, 0.025)?,
            ci_upper: quantile(&draws, 0.975)?,
            prob_positive: draws.iter().filter(|v| **v > 0.0).count() as f64
                / draws.len() as f64,
        });
    }
    Ok(rows)
}

/// Monte Carlo standard error for one reported coefficient.
#[derive(Debug, Clone)]
pub struct McseRow {
    pub param: String,
    pub mcse: f64,
}

/// Monte Carlo standard errors for the reported subset: the pooled sample
/// standard deviation over the square root of the mean-over-chains ESS.
/// NaN when the ESS itself is undefined.
pub fn mcse_table(chains: &[ChainRun], param_names: &[String]) -> Result<Vec<McseRow>, Error> {
    let p = check_names(chains, param_names)?;
    let (beta_rows, _) = pool_post_burn(chains)?;

    let mut rows = Vec::new();
    for idx in 0..N_REPORTED_COEFFS.min(p) {
        let pooled: Array1 = beta_rows.iter().map(|row| row[idx]).collect();
        let ess: Array1 = chains
            .iter()
            .map(|c| ess_from_acf(c.beta_post(idx), ESS_MAX_LAG))
            .collect();
        let ess_mean = nan_mean(&ess);
        let mcse = if ess_mean.is_nan() || ess_mean <= 0.0 {
            f64::NAN
        } else {
            (sample_variance(&pooled)? / ess_mean).sqrt()
        };
        rows.push(McseRow {
            param: param_names[idx].clone(),
            mcse,
        });
    }
    Ok(rows)
}
