//! Emissions predictor
//!
//! Given a feature vector, return a predicted emissions value (gCO2).
//! Training is done elsewhere; [`EmissionsModel`] is the seam, and
//! [`LinearEmissionsModel`] is the default implementation.
//!
//! ## Linear model
//!
//! Ordinary least squares with intercept over the four features, in order:
//! `dataset_size`, `avg_time_sec`, `avg_cpu_percent`, `avg_memory_mb`.
//!
//! Features are standardized (z-scores) before solving the normal equations
//! with Gaussian elimination and partial pivoting; sizes around 1e4 and
//! runtimes around 1e-3 would otherwise make the system numerically singular.
//! A feature that is constant over the training rows carries no information
//! and gets a zero coefficient.
//!
//! [`LinearEmissionsModel::evaluate`] scores a fitted model with R² and MAE
//! ([`FitMetrics`]).

use crate::export::DatasetRow;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Feature names, in model order.
pub const FEATURES: [&str; 4] = [
    "dataset_size",
    "avg_time_sec",
    "avg_cpu_percent",
    "avg_memory_mb",
];

const NUM_FEATURES: usize = FEATURES.len();

/// Relative pivot threshold below which the normal equations are singular.
const SINGULAR_EPSILON: f64 = 1e-10;

/// Model input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Input size
    pub dataset_size: f64,
    /// Mean elapsed time (s)
    pub avg_time_sec: f64,
    /// Mean CPU delta (%)
    pub avg_cpu_percent: f64,
    /// Mean memory delta (MB)
    pub avg_memory_mb: f64,
}

impl FeatureVector {
    /// Values in [`FEATURES`] order.
    #[must_use]
    pub const fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.dataset_size,
            self.avg_time_sec,
            self.avg_cpu_percent,
            self.avg_memory_mb,
        ]
    }
}

impl From<&DatasetRow> for FeatureVector {
    #[allow(clippy::cast_precision_loss)]
    fn from(row: &DatasetRow) -> Self {
        Self {
            dataset_size: row.dataset_size as f64,
            avg_time_sec: row.avg_time_sec,
            avg_cpu_percent: row.avg_cpu_percent,
            avg_memory_mb: row.avg_memory_mb,
        }
    }
}

/// Forecasting component: features in, emissions out.
pub trait EmissionsModel {
    /// Train on cleaned rows; the target is `carbon_gco2`.
    ///
    /// # Errors
    /// Returns `Model` if the rows cannot support a fit.
    fn fit(&mut self, rows: &[DatasetRow]) -> Result<()>;

    /// Predict emissions (gCO2).
    ///
    /// # Errors
    /// Returns `Model` if the model is not trained, `InvalidInput` for
    /// non-finite features.
    fn predict(&self, features: &FeatureVector) -> Result<f64>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LinearFit {
    intercept: f64,
    weights: [f64; NUM_FEATURES],
    means: [f64; NUM_FEATURES],
    scales: [f64; NUM_FEATURES],
}

/// Goodness of fit over a set of rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitMetrics {
    /// Coefficient of determination
    pub r_squared: f64,
    /// Mean absolute error (gCO2)
    pub mae: f64,
}

impl FitMetrics {
    /// Compare predictions with actual targets.
    ///
    /// A constant target gives R² = 1 for a perfect fit and 0 otherwise.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the slices are empty or differ in length.
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Result<Self> {
        if actual.is_empty() || actual.len() != predicted.len() {
            return Err(Error::InvalidInput(format!(
                "cannot score {} predictions against {} targets",
                predicted.len(),
                actual.len()
            )));
        }
        let n = actual.len() as f64;
        let mean = actual.iter().sum::<f64>() / n;
        let residual: f64 = actual
            .iter()
            .zip(predicted)
            .map(|(y, p)| (y - p).powi(2))
            .sum();
        let total: f64 = actual.iter().map(|y| (y - mean).powi(2)).sum();
        let mae = actual
            .iter()
            .zip(predicted)
            .map(|(y, p)| (y - p).abs())
            .sum::<f64>()
            / n;

        let r_squared = if total > 0.0 {
            1.0 - residual / total
        } else if residual == 0.0 {
            1.0
        } else {
            0.0
        };
        Ok(Self { r_squared, mae })
    }
}

/// Least-squares linear model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearEmissionsModel {
    fit: Option<LinearFit>,
}

impl LinearEmissionsModel {
    /// Create an untrained model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the model has been trained.
    #[must_use]
    pub const fn is_fitted(&self) -> bool {
        self.fit.is_some()
    }

    /// Intercept and per-feature coefficients in raw (unstandardized) units.
    #[must_use]
    pub fn coefficients(&self) -> Option<(f64, [f64; NUM_FEATURES])> {
        let fit = self.fit.as_ref()?;
        let mut raw = [0.0; NUM_FEATURES];
        let mut intercept = fit.intercept;
        for j in 0..NUM_FEATURES {
            if fit.scales[j] > 0.0 {
                raw[j] = fit.weights[j] / fit.scales[j];
                intercept -= raw[j] * fit.means[j];
            }
        }
        Some((intercept, raw))
    }
}

impl LinearEmissionsModel {
    /// R² and MAE of the model's predictions on `rows`.
    ///
    /// # Errors
    /// Returns `Model` if the model is not trained, `InvalidInput` if `rows`
    /// is empty or holds non-finite features.
    pub fn evaluate(&self, rows: &[DatasetRow]) -> Result<FitMetrics> {
        let predicted = rows
            .iter()
            .map(|row| self.predict(&FeatureVector::from(row)))
            .collect::<Result<Vec<f64>>>()?;
        let actual: Vec<f64> = rows.iter().map(|row| row.carbon_gco2).collect();
        FitMetrics::compute(&actual, &predicted)
    }
}

impl EmissionsModel for LinearEmissionsModel {
    #[allow(
        clippy::cast_precision_loss,
        clippy::needless_range_loop,
        clippy::float_cmp
    )]
    fn fit(&mut self, rows: &[DatasetRow]) -> Result<()> {
        let samples: Vec<[f64; NUM_FEATURES]> = rows
            .iter()
            .map(|r| FeatureVector::from(r).to_array())
            .collect();
        let targets: Vec<f64> = rows.iter().map(|r| r.carbon_gco2).collect();
        if samples.iter().flatten().chain(&targets).any(|v| !v.is_finite()) {
            return Err(Error::Model("training rows contain non-finite values".into()));
        }

        let n = samples.len() as f64;
        let mut means = [0.0; NUM_FEATURES];
        let mut scales = [0.0; NUM_FEATURES];
        for j in 0..NUM_FEATURES {
            let first = samples.first().map_or(0.0, |s| s[j]);
            if samples.iter().all(|s| s[j] == first) {
                // Constant column: scale stays 0, feature is left out
                means[j] = first;
                continue;
            }
            means[j] = samples.iter().map(|s| s[j]).sum::<f64>() / n;
            let variance = samples.iter().map(|s| (s[j] - means[j]).powi(2)).sum::<f64>() / n;
            scales[j] = variance.sqrt();
        }

        // Intercept plus every feature that varies
        let active: Vec<usize> = (0..NUM_FEATURES).filter(|&j| scales[j] > 0.0).collect();
        let dim = active.len() + 1;
        if samples.len() < dim {
            return Err(Error::Model(format!(
                "need at least {dim} training rows, got {}",
                samples.len()
            )));
        }

        let design = |s: &[f64; NUM_FEATURES]| -> Vec<f64> {
            std::iter::once(1.0)
                .chain(active.iter().map(|&j| (s[j] - means[j]) / scales[j]))
                .collect()
        };

        let mut normal = vec![vec![0.0; dim]; dim];
        let mut rhs = vec![0.0; dim];
        for (sample, &target) in samples.iter().zip(&targets) {
            let x = design(sample);
            for i in 0..dim {
                rhs[i] += x[i] * target;
                for k in 0..dim {
                    normal[i][k] += x[i] * x[k];
                }
            }
        }

        let solution = solve(normal, rhs)?;
        let mut weights = [0.0; NUM_FEATURES];
        for (&j, &w) in active.iter().zip(&solution[1..]) {
            weights[j] = w;
        }

        self.fit = Some(LinearFit {
            intercept: solution[0],
            weights,
            means,
            scales,
        });
        Ok(())
    }

    #[allow(clippy::suboptimal_flops)]
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let fit = self
            .fit
            .as_ref()
            .ok_or_else(|| Error::Model("model has not been fitted".into()))?;
        let x = features.to_array();
        if x.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidInput(format!("non-finite features: {features:?}")));
        }

        Ok((0..NUM_FEATURES)
            .filter(|&j| fit.scales[j] > 0.0)
            .fold(fit.intercept, |acc, j| {
                acc + fit.weights[j] * ((x[j] - fit.means[j]) / fit.scales[j])
            }))
    }
}

/// Solve `a · x = b` by Gaussian elimination with partial pivoting.
#[allow(clippy::needless_range_loop)]
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    let scale = a
        .iter()
        .flatten()
        .fold(0.0_f64, |m, v| m.max(v.abs()))
        .max(1.0);

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &k| a[i][col].abs().total_cmp(&a[k][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < SINGULAR_EPSILON * scale {
            return Err(Error::Model(format!(
                "singular system: feature {col} is collinear with the others"
            )));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::AlgorithmCategory;

    fn row(size: usize, time: f64, cpu: f64, mem: f64, carbon: f64) -> DatasetRow {
        DatasetRow {
            algorithm: "merge_sort".into(),
            task_type: AlgorithmCategory::Sorting,
            dataset_size: size,
            avg_time_sec: time,
            avg_cpu_percent: cpu,
            avg_memory_mb: mem,
            energy_kwh: 1e-6,
            carbon_gco2: carbon,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn linear_target(size: usize, time: f64, cpu: f64, mem: f64) -> f64 {
        0.5 + 0.001 * size as f64 + 2.0 * time + 0.01 * cpu + 3.0 * mem
    }

    fn linear_rows() -> Vec<DatasetRow> {
        [
            (1000, 0.002, 10.0, 0.10),
            (5000, 0.010, 35.0, 0.40),
            (10000, 0.030, 20.0, 0.25),
            (1000, 0.004, 50.0, 0.05),
            (5000, 0.001, 80.0, 0.90),
            (10000, 0.050, 5.0, 0.60),
            (2500, 0.020, 60.0, 0.30),
        ]
        .into_iter()
        .map(|(size, time, cpu, mem)| row(size, time, cpu, mem, linear_target(size, time, cpu, mem)))
        .collect()
    }

    #[test]
    fn test_recovers_exact_linear_relation() {
        let mut model = LinearEmissionsModel::new();
        model.fit(&linear_rows()).unwrap();
        assert!(model.is_fitted());

        let features = FeatureVector {
            dataset_size: 7000.0,
            avg_time_sec: 0.015,
            avg_cpu_percent: 42.0,
            avg_memory_mb: 0.7,
        };
        let expected = linear_target(7000, 0.015, 42.0, 0.7);
        let predicted = model.predict(&features).unwrap();
        assert!((predicted - expected).abs() < 1e-6, "{predicted} vs {expected}");

        let (intercept, coefficients) = model.coefficients().unwrap();
        assert!((intercept - 0.5).abs() < 1e-6);
        assert!((coefficients[0] - 0.001).abs() < 1e-9);
        assert!((coefficients[3] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_predict_before_fit() {
        let model = LinearEmissionsModel::new();
        let features = FeatureVector::from(&linear_rows()[0]);
        assert!(matches!(model.predict(&features), Err(Error::Model(_))));
        assert!(model.coefficients().is_none());
    }

    #[test]
    fn test_too_few_rows() {
        let mut model = LinearEmissionsModel::new();
        let rows = linear_rows();
        assert!(matches!(model.fit(&rows[..3]), Err(Error::Model(_))));
        assert!(matches!(model.fit(&[]), Err(Error::Model(_))));
        assert!(!model.is_fitted());
    }

    #[test]
    fn test_collinear_features_are_singular() {
        let rows: Vec<DatasetRow> = [(1000, 1.0), (2000, 2.0), (3000, 3.0), (4000, 5.0), (5000, 8.0), (6000, 9.0)]
            .into_iter()
            .map(|(size, time)| row(size, time, time * 10.0, time * 0.5, time))
            .collect();
        let mut model = LinearEmissionsModel::new();
        assert!(matches!(model.fit(&rows), Err(Error::Model(_))));
    }

    #[test]
    fn test_constant_feature_gets_zero_weight() {
        // Only one dataset size: the size column is constant
        let rows: Vec<DatasetRow> = [(0.01, 5.0), (0.02, 15.0), (0.04, 10.0), (0.03, 30.0)]
            .into_iter()
            .map(|(time, cpu)| row(1000, time, cpu, 0.2, 1.0 + 100.0 * time + 0.1 * cpu))
            .collect();
        let mut model = LinearEmissionsModel::new();
        model.fit(&rows).unwrap();

        let (_, coefficients) = model.coefficients().unwrap();
        assert_eq!(coefficients[0], 0.0);
        assert_eq!(coefficients[3], 0.0);
        assert!((coefficients[1] - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_inputs() {
        let mut model = LinearEmissionsModel::new();
        let mut rows = linear_rows();
        rows[0].carbon_gco2 = f64::NAN;
        assert!(matches!(model.fit(&rows), Err(Error::Model(_))));

        model.fit(&linear_rows()).unwrap();
        let features = FeatureVector {
            dataset_size: f64::INFINITY,
            avg_time_sec: 0.0,
            avg_cpu_percent: 0.0,
            avg_memory_mb: 0.0,
        };
        assert!(matches!(model.predict(&features), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_evaluate_exact_fit() {
        let rows = linear_rows();
        let mut model = LinearEmissionsModel::new();
        assert!(matches!(model.evaluate(&rows), Err(Error::Model(_))));

        model.fit(&rows).unwrap();
        let metrics = model.evaluate(&rows).unwrap();
        assert!((metrics.r_squared - 1.0).abs() < 1e-9);
        assert!(metrics.mae < 1e-9);
    }

    #[test]
    fn test_fit_metrics_compute() {
        let metrics = FitMetrics::compute(&[1.0, 2.0, 3.0], &[1.0, 2.0, 4.0]).unwrap();
        // residual 1, total 2
        assert!((metrics.r_squared - 0.5).abs() < 1e-12);
        assert!((metrics.mae - 1.0 / 3.0).abs() < 1e-12);

        assert_eq!(FitMetrics::compute(&[2.0, 2.0], &[2.0, 2.0]).unwrap().r_squared, 1.0);
        assert_eq!(FitMetrics::compute(&[2.0, 2.0], &[1.0, 2.0]).unwrap().r_squared, 0.0);
        assert!(matches!(FitMetrics::compute(&[], &[]), Err(Error::InvalidInput(_))));
        assert!(matches!(
            FitMetrics::compute(&[1.0], &[1.0, 2.0]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_solve_small_system() {
        // 2x + y = 5, x + 3y = 10  ->  x = 1, y = 3
        let x = solve(vec![vec![2.0, 1.0], vec![1.0, 3.0]], vec![5.0, 10.0]).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 3.0).abs() < 1e-12);
    }
}
