use crate::utils::{mean, population_variance, sample_variance};
use crate::Array1;

/// Variance threshold below which a series is treated as degenerate
/// (numerically constant) and diagnostics return NaN sentinels.
pub(crate) const DEGENERATE_EPS: f64 = 1e-12;

/// Default fraction of the chain used for the early Geweke window.
pub const GEWEKE_FIRST: f64 = 0.1;
/// Default fraction of the chain used for the late Geweke window.
pub const GEWEKE_LAST: f64 = 0.5;

/// Autocorrelation function of `x` for lags `0..=max_lag`.
///
/// The series is centered by its mean and each lag-k numerator
/// `sum x_i * x_{i+k}` is divided by the zero-lag sum of squares, so lag 0
/// is exactly 1.0 by construction. When the centered sum of squares is
/// numerically zero the whole series is degenerate and every lag is NaN
/// rather than a division by zero.
pub fn autocorr(x: &[f64], max_lag: usize) -> Array1 {
    let n = x.len();
    let xbar = match mean(x) {
        Ok(m) => m,
        Err(_) => return vec![f64::NAN; max_lag + 1],
    };
    let centered: Array1 = x.iter().map(|v| v - xbar).collect();
    let denom: f64 = centered.iter().map(|v| v * v).sum();
    if denom < DEGENERATE_EPS {
        return vec![f64::NAN; max_lag + 1];
    }

    let mut acf = Vec::with_capacity(max_lag + 1);
    acf.push(1.0);
    for lag in 1..=max_lag {
        let num: f64 = if lag < n {
            centered[..n - lag]
                .iter()
                .zip(&centered[lag..])
                .map(|(a, b)| a * b)
                .sum()
        } else {
            0.0
        };
        acf.push(num / denom);
    }
    acf
}

/// Effective sample size of a single chain, estimated from its
/// autocorrelation function.
///
/// Positive-lag autocorrelations are summed up to the first NaN or negative
/// value (the initial-positive-sequence truncation, which keeps noisy
/// negative tail correlations from inflating the estimate). The integrated
/// autocorrelation time is `tau = 1 + 2 * sum` and ESS = N / tau. Returns
/// NaN for a numerically constant chain.
pub fn ess_from_acf(x: &[f64], max_lag: usize) -> f64 {
    let var = match population_variance(x) {
        Ok(v) => v,
        Err(_) => return f64::NAN,
    };
    if var < DEGENERATE_EPS {
        return f64::NAN;
    }
    let acf = autocorr(x, max_lag);
    if acf.iter().all(|v| v.is_nan()) {
        return f64::NAN;
    }
    let mut sum = 0.0;
    for &rho in &acf[1..] {
        if rho.is_nan() || rho < 0.0 {
            break;
        }
        sum += rho;
    }
    let tau_int = 1.0 + 2.0 * sum;
    x.len() as f64 / tau_int
}

/// Geweke convergence z-score for a single chain.
///
/// Compares the mean of an early window (first `first` fraction of the
/// chain) against a late window (last `last` fraction):
///
/// ```text
/// z = (mean(early) - mean(late)) / sqrt(var(early)/n_e + var(late)/n_l)
/// ```
///
/// Large absolute values signal non-stationarity. Returns NaN when either
/// window is too short or has numerically zero variance.
pub fn geweke_z(x: &[f64], first: f64, last: f64) -> f64 {
    let n = x.len();
    let n_first = (first * n as f64) as usize;
    let n_last = (last * n as f64) as usize;
    if n_first == 0 || n_last == 0 || n_first > n || n_last > n {
        return f64::NAN;
    }
    let early = &x[..n_first];
    let late = &x[n - n_last..];

    let var_early = match sample_variance(early) {
        Ok(v) => v,
        Err(_) => return f64::NAN,
    };
    let var_late = match sample_variance(late) {
        Ok(v) => v,
        Err(_) => return f64::NAN,
    };
    if var_early < DEGENERATE_EPS || var_late < DEGENERATE_EPS {
        return f64::NAN;
    }

    let mean_early = early.iter().sum::<f64>() / early.len() as f64;
    let mean_late = late.iter().sum::<f64>() / late.len() as f64;
    (mean_early - mean_late)
        / (var_early / early.len() as f64 + var_late / late.len() as f64).sqrt()
}
