use serde::{Deserialize, Serialize};

use super::{check_input, ModelError};

/// 分母接近 0 时视为常量特征，按 1 处理
const MIN_SPREAD: f64 = 1e-10;

/// 分类前的特征缩放
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum Scaler {
    /// (x - mean) / scale
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// (x - min) / (max - min)
    MinMax { min: Vec<f64>, max: Vec<f64> },
}

impl Scaler {
    pub fn kind(&self) -> &'static str {
        match self {
            Scaler::Standard { .. } => "standard",
            Scaler::MinMax { .. } => "min_max",
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Scaler::Standard { mean, .. } => mean.len(),
            Scaler::MinMax { min, .. } => min.len(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let (a, b, names) = match self {
            Scaler::Standard { mean, scale } => (mean, scale, ("mean", "scale")),
            Scaler::MinMax { min, max } => (min, max, ("min", "max")),
        };
        if a.is_empty() || a.len() != b.len() {
            return Err(ModelError::InvalidParameter(format!(
                "scaler {} has {} entries but {} has {}",
                names.0,
                a.len(),
                names.1,
                b.len()
            )));
        }
        if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidParameter(
                "scaler parameters must be finite".to_string(),
            ));
        }
        Ok(())
    }

    pub fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_input(features, self.n_features())?;

        let out: Vec<f64> = match self {
            Scaler::Standard { mean, scale } => features
                .iter()
                .zip(mean.iter().zip(scale))
                .map(|(x, (m, s))| (x - m) / spread(*s))
                .collect(),
            Scaler::MinMax { min, max } => features
                .iter()
                .zip(min.iter().zip(max))
                .map(|(x, (lo, hi))| (x - lo) / spread(hi - lo))
                .collect(),
        };

        if out.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFiniteOutput);
        }
        Ok(out)
    }
}

fn spread(value: f64) -> f64 {
    if value.abs() < MIN_SPREAD {
        1.0
    } else {
        value
    }
}
