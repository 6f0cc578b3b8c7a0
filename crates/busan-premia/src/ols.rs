//! Ordinary least squares.

use crate::error::{PremiaError, Result};
use ndarray::{Array1, Array2};

/// Pivots smaller than this, relative to the largest entry, are treated as zero.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Result of an OLS fit.
#[derive(Debug, Clone)]
pub struct OlsFit {
    /// Estimated coefficients, intercept first when one was added
    pub coefficients: Array1<f64>,
    /// Residuals
    pub residuals: Array1<f64>,
    /// R-squared
    pub r_squared: f64,
}

/// Prepend a column of ones to `x`.
pub fn with_intercept(x: &Array2<f64>) -> Array2<f64> {
    let (n, p) = x.dim();
    let mut out = Array2::ones((n, p + 1));
    out.slice_mut(ndarray::s![.., 1..]).assign(x);
    out
}

/// Fit `y = X b + e` by least squares.
///
/// Solves the normal equations `X'X b = X'y`.
///
/// # Errors
/// Returns an error if dimensions mismatch, there are fewer observations than
/// regressors, or `X'X` is singular.
pub fn ols(y: &Array1<f64>, x: &Array2<f64>) -> Result<OlsFit> {
    let n = y.len();
    let p = x.ncols();

    if x.nrows() != n {
        return Err(PremiaError::DimensionMismatch {
            expected: n,
            actual: x.nrows(),
        });
    }
    if n == 0 || p == 0 {
        return Err(PremiaError::EmptyData);
    }
    if n < p {
        return Err(PremiaError::InsufficientData {
            stage: "least squares",
            required: p,
            actual: n,
        });
    }

    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);
    let coefficients = solve_linear_system(&xtx, &xty)?;

    let fitted = x.dot(&coefficients);
    let residuals = y - &fitted;

    let y_mean = y.mean().unwrap_or(0.0);
    let ss_tot: f64 = y.iter().map(|yi| (yi - y_mean).powi(2)).sum();
    let ss_res: f64 = residuals.iter().map(|r| r.powi(2)).sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    Ok(OlsFit {
        coefficients,
        residuals,
        r_squared,
    })
}

/// Solve `Ax = b` by Gaussian elimination with partial pivoting.
fn solve_linear_system(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    if n == 0 {
        return Err(PremiaError::EmptyData);
    }
    if a.ncols() != n {
        return Err(PremiaError::DimensionMismatch {
            expected: n,
            actual: a.ncols(),
        });
    }
    if b.len() != n {
        return Err(PremiaError::DimensionMismatch {
            expected: n,
            actual: b.len(),
        });
    }

    // Augmented matrix [A | b]
    let mut aug = Array2::zeros((n, n + 1));
    aug.slice_mut(ndarray::s![.., ..n]).assign(a);
    aug.column_mut(n).assign(b);

    // Scale-aware singularity threshold
    let scale = a.iter().fold(0.0_f64, |m, v| m.max(v.abs())).max(1.0);

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = aug[[col, col]].abs();
        for row in (col + 1)..n {
            if aug[[row, col]].abs() > max_val {
                max_val = aug[[row, col]].abs();
                max_row = row;
            }
        }

        if max_val < PIVOT_TOLERANCE * scale {
            return Err(PremiaError::SingularMatrix);
        }

        if max_row != col {
            for j in 0..=n {
                aug.swap([col, j], [max_row, j]);
            }
        }

        for row in (col + 1)..n {
            let factor = aug[[row, col]] / aug[[col, col]];
            for j in col..=n {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = aug[[i, n]];
        for j in (i + 1)..n {
            sum -= aug[[i, j]] * x[j];
        }
        x[i] = sum / aug[[i, i]];
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    #[test]
    fn test_exact_fit() {
        // y = 1 + 2 x1 - 3 x2
        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 1.0], [3.0, 5.0]];
        let y: Array1<f64> = x.rows().into_iter().map(|r| 1.0 + 2.0 * r[0] - 3.0 * r[1]).collect();

        let fit = ols(&y, &with_intercept(&x)).unwrap();
        assert_abs_diff_eq!(fit.coefficients[0], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(fit.coefficients[1], 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(fit.coefficients[2], -3.0, epsilon = 1e-10);
        assert_abs_diff_eq!(fit.r_squared, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_collinear_is_singular() {
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        let y = array![1.0, 2.0, 3.0];
        assert!(matches!(ols(&y, &with_intercept(&x)), Err(PremiaError::SingularMatrix)));
    }

    #[test]
    fn test_dimension_checks() {
        let x = Array2::<f64>::zeros((3, 2));
        let y = array![1.0, 2.0];
        assert!(matches!(ols(&y, &x), Err(PremiaError::DimensionMismatch { .. })));

        let x = Array2::<f64>::ones((1, 2));
        let y = array![1.0];
        assert!(matches!(ols(&y, &x), Err(PremiaError::InsufficientData { .. })));
    }

    #[test]
    fn test_with_intercept() {
        let x = array![[2.0], [3.0]];
        assert_eq!(with_intercept(&x), array![[1.0, 2.0], [1.0, 3.0]]);
    }
}
