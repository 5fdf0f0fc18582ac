//! Ordinary least squares fit of `value ~ intercept + w1 * lag1 + w2 * lag2`.
//!
//! The fit is done on mean-centred data: the slopes solve the 2x2 normal equations
//! `S w = t` (`S` the lag covariance, `t` the lag/value covariance) through the
//! pseudo-inverse of `S`, and the intercept absorbs the means. When `S` has full rank
//! this is the unique OLS solution; when it is rank-deficient (constant or perfectly
//! collinear lags) it is the minimum-norm slope vector, so fitting never fails on
//! such input and always returns the same coefficients for the same rows.

use crate::error::ForecastError;
use crate::model::features::FeatureRow;
use log::{debug, warn};
use serde::Serialize;
use std::fmt;

/// Eigenvalues of `S` below this fraction of the lags' raw sum of squares count as zero.
const RANK_TOLERANCE: f64 = 1e-12;

/// In-sample statistics recorded at fit time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitDiagnostics {
    /// Number of feature rows used.
    pub rows: usize,
    /// Rank of the centred lag covariance matrix (0, 1 or 2).
    pub rank: usize,
    pub r_squared: f64,
    pub rmse: f64,
}

impl FitDiagnostics {
    pub fn is_rank_deficient(&self) -> bool {
        self.rank < 2
    }
}

/// A fitted lag-2 autoregressive model. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainedModel {
    intercept: f64,
    w1: f64,
    w2: f64,
    diagnostics: Option<FitDiagnostics>,
}

impl TrainedModel {
    /// A model with known coefficients and no fit diagnostics.
    pub fn from_coefficients(intercept: f64, w1: f64, w2: f64) -> Self {
        Self {
            intercept,
            w1,
            w2,
            diagnostics: None,
        }
    }

    /// Fits the model to `rows`.
    ///
    /// # Errors
    ///
    /// * [`ForecastError::InsufficientData`] when `rows` is empty.
    /// * [`ForecastError::DegenerateInput`] when an input or resulting coefficient is not finite.
    pub fn fit(rows: &[FeatureRow]) -> Result<Self, ForecastError> {
        if rows.is_empty() {
            return Err(ForecastError::InsufficientData {
                required: 1,
                found: 0,
            });
        }
        if let Some(row) = rows
            .iter()
            .find(|r| !(r.value.is_finite() && r.lag1.is_finite() && r.lag2.is_finite()))
        {
            return Err(ForecastError::DegenerateInput(format!(
                "non-finite value in feature row for {}",
                row.date
            )));
        }

        let n = rows.len() as f64;
        let mean_y = rows.iter().map(|r| r.value).sum::<f64>() / n;
        let mean_1 = rows.iter().map(|r| r.lag1).sum::<f64>() / n;
        let mean_2 = rows.iter().map(|r| r.lag2).sum::<f64>() / n;

        let mut s11 = 0.0;
        let mut s12 = 0.0;
        let mut s22 = 0.0;
        let mut t1 = 0.0;
        let mut t2 = 0.0;
        let mut raw_scale = 0.0;
        for r in rows {
            let (d1, d2, dy) = (r.lag1 - mean_1, r.lag2 - mean_2, r.value - mean_y);
            s11 += d1 * d1;
            s12 += d1 * d2;
            s22 += d2 * d2;
            t1 += d1 * dy;
            t2 += d2 * dy;
            raw_scale += r.lag1 * r.lag1 + r.lag2 * r.lag2;
        }

        let tolerance = raw_scale.max(1.0) * RANK_TOLERANCE;
        let (w1, w2, rank) = pseudo_solve(s11, s12, s22, t1, t2, tolerance);
        let intercept = mean_y - w1 * mean_1 - w2 * mean_2;

        if !(intercept.is_finite() && w1.is_finite() && w2.is_finite()) {
            return Err(ForecastError::DegenerateInput(
                "regression produced non-finite coefficients".to_string(),
            ));
        }

        let mut model = Self::from_coefficients(intercept, w1, w2);

        let ss_res: f64 = rows
            .iter()
            .map(|r| (r.value - model.predict(r.lag1, r.lag2)).powi(2))
            .sum();
        let ss_tot: f64 = rows.iter().map(|r| (r.value - mean_y).powi(2)).sum();
        let diagnostics = FitDiagnostics {
            rows: rows.len(),
            rank,
            r_squared: if ss_tot > 1e-10 {
                1.0 - ss_res / ss_tot
            } else {
                1.0
            },
            rmse: (ss_res / n).sqrt(),
        };

        if diagnostics.is_rank_deficient() {
            warn!(
                "Lag covariance has rank {} over {} rows; using minimum-norm coefficients",
                rank,
                rows.len()
            );
        }
        debug!("Fitted {} ({:?})", model, diagnostics);

        model.diagnostics = Some(diagnostics);
        Ok(model)
    }

    /// `intercept + w1 * lag1 + w2 * lag2`.
    pub fn predict(&self, lag1: f64, lag2: f64) -> f64 {
        self.intercept + self.w1 * lag1 + self.w2 * lag2
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// `(w1, w2)`: weights on the previous day and the day before.
    pub fn weights(&self) -> (f64, f64) {
        (self.w1, self.w2)
    }

    /// `None` for models built with [`TrainedModel::from_coefficients`].
    pub fn diagnostics(&self) -> Option<&FitDiagnostics> {
        self.diagnostics.as_ref()
    }
}

impl fmt::Display for TrainedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "y(t) = {:.4} + {:.4}*y(t-1) + {:.4}*y(t-2)",
            self.intercept, self.w1, self.w2
        )
    }
}

/// Eigenvalues of the symmetric matrix `[[a, b], [b, c]]`, larger first.
///
/// The smaller one comes from the determinant rather than `half_trace - radius`,
/// which cancels catastrophically for nearly collinear lags.
fn eigenvalues(a: f64, b: f64, c: f64) -> [f64; 2] {
    let half_trace = (a + c) / 2.0;
    let radius = ((a - c) / 2.0).hypot(b);
    let larger = half_trace + radius;
    let smaller = if larger > 0.0 {
        (a * c - b * b) / larger
    } else {
        half_trace - radius
    };
    [larger, smaller]
}

/// Solves `[[a, b], [b, c]] w = t` with the pseudo-inverse, returning `(w1, w2, rank)`.
fn pseudo_solve(a: f64, b: f64, c: f64, t1: f64, t2: f64, tolerance: f64) -> (f64, f64, usize) {
    let eigenvalues = eigenvalues(a, b, c);

    // Eigenvector of the larger eigenvalue, from whichever row avoids cancellation
    let (x, y) = if a >= c {
        (eigenvalues[0] - c, b)
    } else {
        (b, eigenvalues[0] - a)
    };
    let norm = x.hypot(y);
    let first = if norm > 0.0 {
        (x / norm, y / norm)
    } else {
        (1.0, 0.0)
    };
    let eigenvectors = [first, (-first.1, first.0)];

    let mut w = (0.0, 0.0);
    let mut rank = 0;
    for (lambda, v) in eigenvalues.iter().zip(eigenvectors.iter()) {
        if *lambda > tolerance {
            let coefficient = (v.0 * t1 + v.1 * t2) / lambda;
            w.0 += coefficient * v.0;
            w.1 += coefficient * v.1;
            rank += 1;
        }
    }
    (w.0, w.1, rank)
}
