use crate::utils::{mean, sample_variance};
use crate::{Array1, Array2};
use anyhow::{anyhow, Error, Result};

/// Splits each chain into its first and second half, treating every half as
/// an independent sub-chain. The trailing element of an odd-length chain is
/// dropped so both halves have length `len / 2`.
pub fn split_halves(chains: &Array2) -> Result<Array2, Error> {
    if chains.is_empty() {
        return Err(anyhow!("Can't split an empty set of chains"));
    }
    let mut halves = Vec::with_capacity(chains.len() * 2);
    for chain in chains {
        let half = chain.len() / 2;
        if half < 2 {
            return Err(anyhow!(
                "Chains must have at least 4 draws to split, got {}",
                chain.len()
            ));
        }
        halves.push(chain[..half].to_vec());
        halves.push(chain[half..2 * half].to_vec());
    }
    Ok(halves)
}

/// Computes the split potential scale reduction (Rhat) for one parameter
/// across all kept samples. Sub-chains are trimmed from the back to the
/// length of the shortest half.
///
/// With within-sub-chain variance `W` (mean of per-sub-chain sample
/// variances) and between-sub-chain variance `B` (variance of sub-chain
/// means scaled by the sub-chain length `n`):
///
/// ```text
/// Rhat = sqrt((((n - 1) / n) * W + B / n) / W)
/// ```
///
/// Values near 1.0 indicate the chains have mixed; the statistic is only
/// meaningful with at least two original chains. See the Stan reference
/// manual section
/// ["Potential Scale Reduction"](https://mc-stan.org/docs/reference-manual/analysis.html#potential-scale-reduction).
pub fn split_rhat(chains: &Array2) -> Result<f64, Error> {
    let halves = split_halves(chains)?;
    let n = halves.iter().map(|h| h.len()).min().unwrap();

    let mut sub_means: Array1 = Vec::with_capacity(halves.len());
    let mut sub_vars: Array1 = Vec::with_capacity(halves.len());
    for half in &halves {
        sub_means.push(mean(&half[..n])?);
        sub_vars.push(sample_variance(&half[..n])?);
    }

    let n = n as f64;
    let var_within = mean(&sub_vars)?;
    let var_between = n * sample_variance(&sub_means)?;
    let var_hat = (n - 1.0) / n * var_within + var_between / n;
    Ok((var_hat / var_within).sqrt())
}
