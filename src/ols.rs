use crate::{Array1, Array2};
use anyhow::{anyhow, bail, Error, Result};
use nalgebra::{DMatrix, DVector};

/// Closed-form ordinary least squares fit on a design matrix that already
/// carries its intercept column, solving the normal equations
/// `(X^T X) beta = X^T y` via LU decomposition.
///
/// This is a comparison baseline reported alongside the posterior; the
/// sampler never consumes it.
pub fn ols_fit(x: &Array2, y: &[f64]) -> Result<Array1, Error> {
    let n = x.len();
    if n == 0 {
        bail!("Design matrix must have at least one row");
    }
    let p = x[0].len();
    if p == 0 {
        bail!("Design matrix must have at least one column");
    }
    if x.iter().any(|row| row.len() != p) {
        bail!("Design matrix rows must all have length {}", p);
    }
    if y.len() != n {
        bail!("Response length {} does not match {} design rows", y.len(), n);
    }

    // Accumulate XtX and Xty.
    let mut xtx = vec![0.0; p * p];
    let mut xty = vec![0.0; p];
    for (row, &yi) in x.iter().zip(y.iter()) {
        for a in 0..p {
            xty[a] += row[a] * yi;
            for b in 0..p {
                xtx[a * p + b] += row[a] * row[b];
            }
        }
    }

    let lhs = DMatrix::from_row_slice(p, p, &xtx);
    let rhs = DVector::from_vec(xty);
    let solution = lhs
        .lu()
        .solve(&rhs)
        .ok_or_else(|| anyhow!("OLS solve failed (singular X^T X)"))?;
    Ok(solution.iter().copied().collect())
}
