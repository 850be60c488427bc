use itertools::Itertools;
use ndarray::{Array1, Array2};

use crate::dataset::Dataset;
use crate::errors::{MetricsError, Result};
use crate::models::{Column, RegressionResult};

// Pairwise Pearson coefficients over a chosen column set. Cells are
// Option so a constant column leaves gaps in the heatmap instead of
// sinking the whole matrix.
#[derive(Debug, Clone)]
pub(crate) struct CorrelationMatrix {
    columns: Vec<Column>,
    cells: Array2<Option<f64>>,
}

impl CorrelationMatrix {
    pub(crate) fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub(crate) fn size(&self) -> usize {
        self.columns.len()
    }

    pub(crate) fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.cells[(i, j)]
    }
}

// Sample (n-1) covariance and variances over paired columns; one pass for
// the means, one for the cross terms.
fn moments(x: &Array1<f64>, y: &Array1<f64>) -> (f64, f64, f64) {
    let n = x.len() as f64;
    let x_mean = x.mean().unwrap_or(0.0);
    let y_mean = y.mean().unwrap_or(0.0);

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        cov += (xi - x_mean) * (yi - y_mean);
        var_x += (xi - x_mean).powi(2);
        var_y += (yi - y_mean).powi(2);
    }
    (cov / (n - 1.0), var_x / (n - 1.0), var_y / (n - 1.0))
}

// Pearson correlation, cov(a,b) / (std(a) * std(b)). Self-correlation of a
// non-constant column is returned as 1.0 directly rather than through the
// formula, where sqrt rounding could nudge it off.
pub(crate) fn correlation(dataset: &Dataset, col_a: Column, col_b: Column) -> Result<f64> {
    if dataset.len() < 2 {
        return Err(MetricsError::InsufficientData(format!(
            "correlation of {} and {} needs at least 2 records, have {}",
            col_a,
            col_b,
            dataset.len()
        )));
    }

    let x = dataset.column(col_a);
    let y = dataset.column(col_b);
    let (cov, var_x, var_y) = moments(&x, &y);

    if var_x == 0.0 || var_y == 0.0 {
        let constant = if var_x == 0.0 { col_a } else { col_b };
        return Err(MetricsError::InsufficientData(format!(
            "column {} is constant, correlation is undefined",
            constant
        )));
    }

    if col_a == col_b {
        return Ok(1.0);
    }
    Ok(cov / (var_x * var_y).sqrt())
}

// Closed-form ordinary least squares. A constant x column has no defined
// slope and is an error, never a silent zero.
pub(crate) fn linear_regression(
    dataset: &Dataset,
    x_col: Column,
    y_col: Column,
) -> Result<RegressionResult> {
    if dataset.len() < 2 {
        return Err(MetricsError::InsufficientData(format!(
            "regression of {} on {} needs at least 2 records, have {}",
            y_col,
            x_col,
            dataset.len()
        )));
    }

    let x = dataset.column(x_col);
    let y = dataset.column(y_col);
    let (cov, var_x, var_y) = moments(&x, &y);

    if var_x == 0.0 {
        return Err(MetricsError::InsufficientData(format!(
            "all {} values are identical, slope is undefined",
            x_col
        )));
    }
    if var_y == 0.0 {
        return Err(MetricsError::InsufficientData(format!(
            "column {} is constant, correlation is undefined",
            y_col
        )));
    }

    let slope = cov / var_x;
    let x_mean = x.mean().unwrap_or(0.0);
    let y_mean = y.mean().unwrap_or(0.0);

    Ok(RegressionResult {
        slope,
        intercept: y_mean - slope * x_mean,
        correlation: cov / (var_x * var_y).sqrt(),
    })
}

// Full pairwise matrix. The diagonal is pinned to 1.0 without touching the
// degenerate formula; undefined off-diagonal pairs become None so callers
// can still render partial results.
pub(crate) fn correlation_matrix(dataset: &Dataset, columns: &[Column]) -> Result<CorrelationMatrix> {
    if dataset.len() < 2 {
        return Err(MetricsError::InsufficientData(format!(
            "correlation matrix needs at least 2 records, have {}",
            dataset.len()
        )));
    }

    let n = columns.len();
    let mut cells = Array2::from_elem((n, n), None);
    for i in 0..n {
        cells[(i, i)] = Some(1.0);
    }
    for ((i, &col_a), (j, &col_b)) in columns.iter().enumerate().tuple_combinations() {
        let value = correlation(dataset, col_a, col_b).ok();
        cells[(i, j)] = value;
        cells[(j, i)] = value;
    }

    Ok(CorrelationMatrix {
        columns: columns.to_vec(),
        cells,
    })
}
