//! A Rust library implementing Bayesian linear regression via component-wise
//! random-walk Metropolis-Hastings, together with the MCMC convergence
//! diagnostics used to certify the resulting chains: autocorrelation,
//! effective sample size, split potential scale reduction factor (R hat),
//! and the Geweke z-score.
//!
//! The crate expects a design matrix whose first column is a constant one
//! (intercept) and whose remaining columns are standardized predictors.
//! Dataset loading, train/test splitting, plotting and persistence are left
//! to the caller; the crate itself performs no file or display I/O.
#[macro_use]
extern crate approx;

/// Autocorrelation, effective sample size and Geweke diagnostics
pub mod diagnostics;
/// Unnormalized log-posterior of the Normal-likelihood regression model
pub mod model;
/// Ordinary least squares baseline fit
pub mod ols;
/// Posterior predictive sampling for held-out design matrices
pub mod predictive;
/// Gelman-Rubin split potential scale reduction (Rhat)
pub mod rhat;
/// Component-wise Metropolis-Hastings sampler and multi-chain runner
pub mod sampler;
/// Diagnostics table, posterior summaries and Monte Carlo standard errors
pub mod summary;
/// Convenience utilities like summary statistics, quantiles and NaN-aware
/// reductions intended mostly for internal use to avoid external dependencies
pub mod utils;

/// One-dimensional vector of numeric values
pub type Array1 = Vec<f64>;
/// Two dimensional vector of vectors of numeric values
pub type Array2 = Vec<Array1>;
