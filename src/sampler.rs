use crate::model::PosteriorModel;
use crate::{Array1, Array2};
use anyhow::{anyhow, bail, Error, Result};
use log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;

/// Settings for one Metropolis-Hastings chain: iteration and burn-in counts
/// plus the fixed Gaussian proposal step sizes for the coefficient and
/// log-variance moves.
#[derive(Debug, Clone, PartialEq)]
pub struct MhConfig {
    pub n_iter: usize,
    pub burn_in: usize,
    pub beta_step: f64,
    pub log_sigma2_step: f64,
}

impl Default for MhConfig {
    fn default() -> Self {
        MhConfig {
            n_iter: 12_000,
            burn_in: 4_000,
            beta_step: 0.02,
            log_sigma2_step: 0.05,
        }
    }
}

impl MhConfig {
    fn validate(&self) -> Result<(), Error> {
        if self.n_iter == 0 {
            bail!("n_iter must be positive");
        }
        if self.burn_in >= self.n_iter {
            bail!(
                "burn_in ({}) must be smaller than n_iter ({})",
                self.burn_in,
                self.n_iter
            );
        }
        if !self.beta_step.is_finite() || self.beta_step < 0.0 {
            bail!("beta_step must be finite and non-negative");
        }
        if !self.log_sigma2_step.is_finite() || self.log_sigma2_step < 0.0 {
            bail!("log_sigma2_step must be finite and non-negative");
        }
        Ok(())
    }
}

/// Completed output of one chain: the full coefficient and log-variance
/// traces, acceptance counts, and the configured burn-in split. Immutable
/// once sampling finishes.
///
/// Traces are stored per coefficient (`betas[j][t]`) so diagnostics can
/// borrow a single parameter's series directly as a slice.
#[derive(Debug, Clone)]
pub struct ChainRun {
    betas: Array2,
    log_sigma2: Array1,
    accepted_beta: u64,
    accepted_sigma2: u64,
    n_iter: usize,
    burn_in: usize,
}

impl ChainRun {
    /// Number of coefficients (intercept included).
    pub fn p(&self) -> usize {
        self.betas.len()
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn burn_in(&self) -> usize {
        self.burn_in
    }

    /// Number of post-burn-in draws.
    pub fn n_post(&self) -> usize {
        self.n_iter - self.burn_in
    }

    /// Full trace of coefficient `j`, burn-in included.
    ///
    /// Panics if `j >= p()`; coefficient indices come from the model shape,
    /// so an out-of-range index is a caller bug rather than a data error.
    pub fn beta_trace(&self, j: usize) -> &[f64] {
        &self.betas[j]
    }

    /// Post-burn-in trace of coefficient `j`.
    ///
    /// Panics if `j >= p()`, like [`ChainRun::beta_trace`].
    pub fn beta_post(&self, j: usize) -> &[f64] {
        &self.betas[j][self.burn_in..]
    }

    pub fn log_sigma2_trace(&self) -> &[f64] {
        &self.log_sigma2
    }

    pub fn log_sigma2_post(&self) -> &[f64] {
        &self.log_sigma2[self.burn_in..]
    }

    /// Fraction of accepted single-coefficient moves; the denominator is
    /// `n_iter * p` since every iteration proposes one move per coefficient.
    pub fn accept_rate_beta(&self) -> f64 {
        self.accepted_beta as f64 / (self.n_iter * self.p()) as f64
    }

    /// Fraction of accepted log-variance moves.
    pub fn accept_rate_sigma2(&self) -> f64 {
        self.accepted_sigma2 as f64 / self.n_iter as f64
    }
}

/// Runs one component-wise random-walk Metropolis-Hastings chain.
///
/// Each iteration sweeps the coefficients in order, giving every coordinate
/// its own symmetric Gaussian proposal and accept/reject decision (so later
/// coordinates see already-updated earlier ones), then updates the
/// log-variance the same way. The current state is recorded every iteration
/// whether or not any proposal was accepted.
///
/// `init_beta` defaults to the zero vector and `init_log_sigma2` to 0.0
/// (unit variance). Fails when the initial log-posterior is not finite --
/// a configuration error, not a transient condition; per-iteration
/// rejections are normal control flow.
pub fn run_mh_chain(
    model: &PosteriorModel,
    config: &MhConfig,
    init_beta: Option<&[f64]>,
    init_log_sigma2: Option<f64>,
    seed: u64,
) -> Result<ChainRun, Error> {
    config.validate()?;
    let p = model.p();
    let mut beta: Array1 = match init_beta {
        Some(init) => {
            if init.len() != p {
                bail!("init_beta has length {}, expected {}", init.len(), p);
            }
            init.to_vec()
        }
        None => vec![0.0; p],
    };
    let mut log_sigma2 = init_log_sigma2.unwrap_or(0.0);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let beta_noise = Normal::new(0.0, config.beta_step)?;
    let sigma_noise = Normal::new(0.0, config.log_sigma2_step)?;

    let mut current_lp = model.log_posterior(&beta, log_sigma2);
    if !current_lp.is_finite() {
        bail!("Initial log-posterior is not finite; check priors and initial state");
    }

    let mut betas: Array2 = vec![Vec::with_capacity(config.n_iter); p];
    let mut log_sigma2s: Array1 = Vec::with_capacity(config.n_iter);
    let mut accepted_beta = 0u64;
    let mut accepted_sigma2 = 0u64;

    for _ in 0..config.n_iter {
        for j in 0..p {
            let old = beta[j];
            beta[j] = old + beta_noise.sample(&mut rng);
            let prop_lp = model.log_posterior(&beta, log_sigma2);
            if rng.random::<f64>().ln() < prop_lp - current_lp {
                current_lp = prop_lp;
                accepted_beta += 1;
            } else {
                beta[j] = old;
            }
        }

        let proposal = log_sigma2 + sigma_noise.sample(&mut rng);
        let prop_lp = model.log_posterior(&beta, proposal);
        if rng.random::<f64>().ln() < prop_lp - current_lp {
            log_sigma2 = proposal;
            current_lp = prop_lp;
            accepted_sigma2 += 1;
        }

        for j in 0..p {
            betas[j].push(beta[j]);
        }
        log_sigma2s.push(log_sigma2);
    }

    Ok(ChainRun {
        betas,
        log_sigma2: log_sigma2s,
        accepted_beta,
        accepted_sigma2,
        n_iter: config.n_iter,
        burn_in: config.burn_in,
    })
}

/// Runs `n_chains` independent chains in parallel; chain `m` is seeded with
/// `base_seed + m` and starts from the default initial state. The design
/// matrix and response are shared read-only; everything else is chain-local,
/// so no locking is needed.
pub fn run_chains(
    model: &PosteriorModel,
    config: &MhConfig,
    n_chains: usize,
    base_seed: u64,
) -> Result<Vec<ChainRun>, Error> {
    if n_chains == 0 {
        bail!("Need at least one chain");
    }
    let runs: Vec<Result<ChainRun, Error>> = (0..n_chains)
        .into_par_iter()
        .map(|m| run_mh_chain(model, config, None, None, base_seed.wrapping_add(m as u64)))
        .collect();
    let chains = runs.into_iter().collect::<Result<Vec<_>, _>>()?;

    for (m, chain) in chains.iter().enumerate() {
        info!(
            "chain {}/{}: accept rate beta {:.3}, accept rate sigma2 {:.3}",
            m + 1,
            n_chains,
            chain.accept_rate_beta(),
            chain.accept_rate_sigma2()
        );
    }
    Ok(chains)
}

/// Pools the post-burn-in draws of several chains into row-wise beta draws
/// plus the matching log-variance draws. Chains must agree on the parameter
/// count, iteration count and burn-in length.
pub fn pool_post_burn(chains: &[ChainRun]) -> Result<(Array2, Array1), Error> {
    let first = chains
        .first()
        .ok_or_else(|| anyhow!("Can't pool an empty set of chains"))?;
    let (p, n_iter, burn_in) = (first.p(), first.n_iter(), first.burn_in());
    if chains
        .iter()
        .any(|c| c.p() != p || c.n_iter() != n_iter || c.burn_in() != burn_in)
    {
        bail!("Chains must share p, n_iter and burn_in to be pooled");
    }

    let n_pooled = chains.len() * (n_iter - burn_in);
    let mut beta_rows: Array2 = Vec::with_capacity(n_pooled);
    let mut log_sigma2: Array1 = Vec::with_capacity(n_pooled);
    for chain in chains {
        for t in burn_in..n_iter {
            beta_rows.push((0..p).map(|j| chain.betas[j][t]).collect());
        }
        log_sigma2.extend_from_slice(chain.log_sigma2_post());
    }
    Ok((beta_rows, log_sigma2))
}
