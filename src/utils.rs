use anyhow::{anyhow, Error, Result};

/// Compute the arithmetic mean of an array.
pub fn mean(arr: &[f64]) -> Result<f64, Error> {
    if arr.is_empty() {
        return Err(anyhow!("Can't take mean of empty array"));
    }
    let sum = arr.iter().sum::<f64>();
    let count = arr.len() as f64;
    Ok(sum / count)
}

/// Compute the sample variance of an array using Bessel's correction.
pub fn sample_variance(arr: &[f64]) -> Result<f64, Error> {
    if arr.len() < 2 {
        return Err(anyhow!("Need at least 2 values for a sample variance"));
    }
    let xbar = mean(arr)?;
    Ok(arr.iter().map(|x| (x - xbar).powi(2)).sum::<f64>() / (arr.len() as f64 - 1.0))
}

/// Compute the population (ddof = 0) variance of an array.
pub fn population_variance(arr: &[f64]) -> Result<f64, Error> {
    let xbar = mean(arr)?;
    Ok(arr.iter().map(|x| (x - xbar).powi(2)).sum::<f64>() / arr.len() as f64)
}

/// Dot product of two equal-length slices.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Compute the `q` quantile of an array with linear interpolation between
/// order statistics, matching the numpy default.
pub fn quantile(arr: &[f64], q: f64) -> Result<f64, Error> {
    if arr.is_empty() {
        return Err(anyhow!("Can't take quantile of empty array"));
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(anyhow!("Quantile must be in [0, 1], got {}", q));
    }
    let mut sorted = arr.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    Ok(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

/// Compute the median of an array.
pub fn median(arr: &[f64]) -> Result<f64, Error> {
    quantile(arr, 0.5)
}

/// Minimum over the values that are not NaN; NaN when every value is.
pub fn nan_min(arr: &[f64]) -> f64 {
    arr.iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f64::NAN, f64::min)
}

/// Mean over the values that are not NaN; NaN when every value is.
pub fn nan_mean(arr: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for &v in arr {
        if !v.is_nan() {
            sum += v;
            count += 1;
        }
    }
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Maximum absolute value over the values that are not NaN; NaN when every
/// value is.
pub fn nan_max_abs(arr: &[f64]) -> f64 {
    arr.iter()
        .filter(|v| !v.is_nan())
        .map(|v| v.abs())
        .fold(f64::NAN, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Array1;

    #[test]
    fn test_stats() {
        // Test our basic stats functions using numbers computed with numpy.
        let arr = vec![
            2.13829088,
            -1.06214379,
            -0.79265699,
            -0.21300888,
            -1.07155142,
            -0.50425317,
            0.95708854,
            -1.23854172,
            1.37124938,
            1.17658286,
        ];
        let empty: Array1 = vec![];
        assert_abs_diff_eq!(
            sample_variance(&arr).unwrap(),
            1.492596054209826,
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(mean(&arr).unwrap(), 0.07610557018217139, epsilon = 1e-6);
        assert_abs_diff_eq!(
            population_variance(&arr).unwrap(),
            1.492596054209826 * 9.0 / 10.0,
            epsilon = 1e-6
        );

        assert!(sample_variance(&empty).is_err());
        assert!(sample_variance(&[1.0]).is_err());
        assert!(mean(&empty).is_err());
        assert!(population_variance(&empty).is_err());
    }

    #[test]
    fn test_dot() {
        assert_abs_diff_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
        assert_abs_diff_eq!(dot(&[], &[]), 0.0);
    }

    #[test]
    fn test_quantile_matches_numpy() {
        // Expected values computed with np.quantile (linear interpolation).
        let arr = vec![3.0, 1.0, 4.0, 1.5, 9.0, 2.6, 5.3, 5.8, 9.7, 9.3];
        assert_abs_diff_eq!(quantile(&arr, 0.025).unwrap(), 1.1125, epsilon = 1e-12);
        assert_abs_diff_eq!(quantile(&arr, 0.5).unwrap(), 4.65, epsilon = 1e-12);
        assert_abs_diff_eq!(quantile(&arr, 0.975).unwrap(), 9.61, epsilon = 1e-12);
        assert_abs_diff_eq!(quantile(&arr, 0.0).unwrap(), 1.0);
        assert_abs_diff_eq!(quantile(&arr, 1.0).unwrap(), 9.7);

        assert_abs_diff_eq!(median(&[1.0, 2.0, 3.0, 4.0]).unwrap(), 2.5);
        assert_abs_diff_eq!(median(&[1.0, 2.0, 3.0]).unwrap(), 2.0);

        assert!(quantile(&arr, -0.1).is_err());
        assert!(quantile(&arr, 1.1).is_err());
        assert!(quantile(&[], 0.5).is_err());
    }

    #[test]
    fn test_nan_aware_reductions() {
        let with_nan = vec![f64::NAN, 2.0, 1.0, f64::NAN, 3.0];
        assert_abs_diff_eq!(nan_min(&with_nan), 1.0);
        assert_abs_diff_eq!(nan_mean(&with_nan), 2.0);
        assert_abs_diff_eq!(nan_max_abs(&[-3.0, f64::NAN, 2.0]), 3.0);

        let all_nan = vec![f64::NAN, f64::NAN];
        assert!(nan_min(&all_nan).is_nan());
        assert!(nan_mean(&all_nan).is_nan());
        assert!(nan_max_abs(&all_nan).is_nan());
        assert!(nan_min(&[]).is_nan());
    }
}
