//! Calorie regression used to cross-check AI-stated calories.
//!
//! The model maps `[carbs_g, protein_g, fat_g, sugar_g, sodium_mg]` to kcal.
//! Artifacts are JSON: either a linear model or a gradient-boosted ensemble of
//! regression trees (sklearn's `x <= threshold` goes left convention).

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub const FEATURE_COUNT: usize = 5;
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] =
    ["탄수화물(g)", "단백질(g)", "지방(g)", "당류(g)", "나트륨(mg)"];

pub type FeatureRow = [f64; FEATURE_COUNT];

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("사전 학습된 모델 파일이 없습니다: {path}")]
    NotFound { path: String },
    #[error("모델 파일을 읽을 수 없습니다: {0}")]
    Io(#[from] std::io::Error),
    #[error("모델 파일 형식이 올바르지 않습니다: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("모델 파일 내용이 올바르지 않습니다: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        value: f64,
    },
}

impl TreeNode {
    fn evaluate(&self, row: &FeatureRow) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    fn validate(&self) -> Result<(), ModelError> {
        match self {
            TreeNode::Leaf { value } if value.is_finite() => Ok(()),
            TreeNode::Leaf { .. } => Err(ModelError::Invalid("non-finite leaf value".into())),
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if *feature >= FEATURE_COUNT {
                    return Err(ModelError::Invalid(format!(
                        "split on feature {feature}, only {FEATURE_COUNT} features exist"
                    )));
                }
                if threshold.is_nan() {
                    return Err(ModelError::Invalid("NaN split threshold".into()));
                }
                left.validate()?;
                right.validate()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalorieModel {
    Linear {
        intercept: f64,
        coefficients: FeatureRow,
    },
    GradientBoosted {
        init: f64,
        learning_rate: f64,
        trees: Vec<TreeNode>,
    },
}

impl CalorieModel {
    pub fn predict(&self, row: &FeatureRow) -> f64 {
        match self {
            CalorieModel::Linear {
                intercept,
                coefficients,
            } => intercept + coefficients.iter().zip(row).map(|(c, x)| c * x).sum::<f64>(),
            CalorieModel::GradientBoosted {
                init,
                learning_rate,
                trees,
            } => init + learning_rate * trees.iter().map(|t| t.evaluate(row)).sum::<f64>(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: CalorieModel = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelError::NotFound {
                path: path.display().to_string(),
            });
        }
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<(), ModelError> {
        match self {
            CalorieModel::Linear {
                intercept,
                coefficients,
            } => {
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(ModelError::Invalid("non-finite linear coefficient".into()));
                }
                Ok(())
            }
            CalorieModel::GradientBoosted {
                init,
                learning_rate,
                trees,
            } => {
                if !init.is_finite() || !learning_rate.is_finite() {
                    return Err(ModelError::Invalid("non-finite ensemble parameter".into()));
                }
                trees.iter().try_for_each(TreeNode::validate)
            }
        }
    }
}

/// Where the loaded model came from. Bootstrap predictions are provisional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ModelSource {
    Artifact { path: String },
    Bootstrap,
}

#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub model: CalorieModel,
    pub source: ModelSource,
}

impl LoadedModel {
    pub fn is_provisional(&self) -> bool {
        self.source == ModelSource::Bootstrap
    }

    pub fn predict(&self, row: &FeatureRow) -> f64 {
        self.model.predict(row)
    }
}

/// Load the artifact at `path`. When it is missing and `bootstrap` is set,
/// fall back to a stump ensemble trained on [`BOOTSTRAP_ROWS`].
pub fn load_or_bootstrap(path: impl AsRef<Path>, bootstrap: bool) -> Result<LoadedModel, ModelError> {
    let path = path.as_ref();
    match CalorieModel::from_path(path) {
        Ok(model) => Ok(LoadedModel {
            model,
            source: ModelSource::Artifact {
                path: path.display().to_string(),
            },
        }),
        Err(ModelError::NotFound { .. }) if bootstrap => {
            tracing::warn!(
                path = %path.display(),
                "Calorie model artifact missing, training bootstrap model from built-in rows"
            );
            Ok(LoadedModel {
                model: train_bootstrap(),
                source: ModelSource::Bootstrap,
            })
        }
        Err(err) => Err(err),
    }
}

/// Hand-written training rows: features and kcal for one serving.
pub const BOOTSTRAP_ROWS: [(FeatureRow, f64); 5] = [
    ([65.0, 6.0, 1.0, 0.0, 5.0], 300.0),
    ([20.0, 35.0, 12.0, 5.0, 600.0], 330.0),
    ([80.0, 10.0, 17.0, 4.0, 1800.0], 500.0),
    ([50.0, 5.0, 18.0, 35.0, 300.0], 380.0),
    ([15.0, 20.0, 15.0, 5.0, 1500.0], 280.0),
];

const BOOTSTRAP_ESTIMATORS: usize = 50;
const BOOTSTRAP_LEARNING_RATE: f64 = 0.1;

pub fn train_bootstrap() -> CalorieModel {
    fit_stump_ensemble(&BOOTSTRAP_ROWS, BOOTSTRAP_ESTIMATORS, BOOTSTRAP_LEARNING_RATE)
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Least-squares gradient boosting with depth-one trees.
pub fn fit_stump_ensemble(
    rows: &[(FeatureRow, f64)],
    n_estimators: usize,
    learning_rate: f64,
) -> CalorieModel {
    let init = mean(rows.iter().map(|(_, y)| *y));
    let mut predictions = vec![init; rows.len()];
    let mut trees = Vec::with_capacity(n_estimators);

    for _ in 0..n_estimators {
        let residuals: Vec<f64> = rows
            .iter()
            .zip(&predictions)
            .map(|((_, y), p)| y - p)
            .collect();
        let tree = best_stump(rows, &residuals);
        for (prediction, (row, _)) in predictions.iter_mut().zip(rows) {
            *prediction += learning_rate * tree.evaluate(row);
        }
        trees.push(tree);
    }

    CalorieModel::GradientBoosted {
        init,
        learning_rate,
        trees,
    }
}

fn best_stump(rows: &[(FeatureRow, f64)], residuals: &[f64]) -> TreeNode {
    let mut best: Option<(f64, TreeNode)> = None;

    for feature in 0..FEATURE_COUNT {
        let mut values: Vec<f64> = rows.iter().map(|(x, _)| x[feature]).collect();
        values.sort_by(f64::total_cmp);
        values.dedup();

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;
            let goes_left = |row: &FeatureRow| row[feature] <= threshold;

            let left = mean(
                rows.iter()
                    .zip(residuals)
                    .filter(|((x, _), _)| goes_left(x))
                    .map(|(_, r)| *r),
            );
            let right = mean(
                rows.iter()
                    .zip(residuals)
                    .filter(|((x, _), _)| !goes_left(x))
                    .map(|(_, r)| *r),
            );
            let sse: f64 = rows
                .iter()
                .zip(residuals)
                .map(|((x, _), r)| {
                    let fitted = if goes_left(x) { left } else { right };
                    (r - fitted).powi(2)
                })
                .sum();

            if best.as_ref().is_none_or(|(best_sse, _)| sse < *best_sse) {
                best = Some((
                    sse,
                    TreeNode::Split {
                        feature,
                        threshold,
                        left: Box::new(TreeNode::Leaf { value: left }),
                        right: Box::new(TreeNode::Leaf { value: right }),
                    },
                ));
            }
        }
    }

    best.map(|(_, tree)| tree).unwrap_or(TreeNode::Leaf {
        value: mean(residuals.iter().copied()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_model_predicts_atwater_calories() {
        let model = CalorieModel::Linear {
            intercept: 0.0,
            coefficients: [4.0, 4.0, 9.0, 0.0, 0.0],
        };
        assert_eq!(model.predict(&[20.0, 35.0, 12.0, 5.0, 600.0]), 328.0);
    }

    #[test]
    fn tree_split_goes_left_on_equal_threshold() {
        let tree = TreeNode::Split {
            feature: 2,
            threshold: 10.0,
            left: Box::new(TreeNode::Leaf { value: -1.0 }),
            right: Box::new(TreeNode::Leaf { value: 1.0 }),
        };
        assert_eq!(tree.evaluate(&[0.0, 0.0, 10.0, 0.0, 0.0]), -1.0);
        assert_eq!(tree.evaluate(&[0.0, 0.0, 10.5, 0.0, 0.0]), 1.0);
    }

    #[test]
    fn gradient_boosted_artifact_from_json() {
        let json = r#"{
            "kind": "gradient_boosted",
            "init": 300.0,
            "learning_rate": 0.5,
            "trees": [
                {"feature": 2, "threshold": 10.0,
                 "left": {"value": -40.0},
                 "right": {"feature": 0, "threshold": 50.0,
                           "left": {"value": 20.0},
                           "right": {"value": 80.0}}}
            ]
        }"#;
        let model = CalorieModel::from_json(json).unwrap();
        assert_eq!(model.predict(&[20.0, 35.0, 5.0, 5.0, 600.0]), 280.0);
        assert_eq!(model.predict(&[20.0, 35.0, 12.0, 5.0, 600.0]), 310.0);
        assert_eq!(model.predict(&[80.0, 10.0, 17.0, 4.0, 1800.0]), 340.0);
    }

    #[test]
    fn invalid_feature_index_is_rejected() {
        let json = r#"{"kind": "gradient_boosted", "init": 0.0, "learning_rate": 0.1,
            "trees": [{"feature": 7, "threshold": 1.0, "left": {"value": 0.0}, "right": {"value": 1.0}}]}"#;
        assert!(matches!(
            CalorieModel::from_json(json),
            Err(ModelError::Invalid(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            CalorieModel::from_json("{\"kind\": \"linear\"}"),
            Err(ModelError::Parse(_))
        ));
    }

    #[test]
    fn missing_artifact_without_bootstrap_fails() {
        let err = load_or_bootstrap("/nonexistent/food_calorie_model.json", false).unwrap_err();
        assert!(matches!(err, ModelError::NotFound { .. }));
    }

    #[test]
    fn missing_artifact_with_bootstrap_is_provisional() {
        let loaded = load_or_bootstrap("/nonexistent/food_calorie_model.json", true).unwrap();
        assert!(loaded.is_provisional());
        assert_eq!(loaded.source, ModelSource::Bootstrap);
    }

    #[test]
    fn bootstrap_model_beats_mean_baseline_on_its_rows() {
        let model = train_bootstrap();
        let baseline = mean(BOOTSTRAP_ROWS.iter().map(|(_, y)| *y));
        let model_sse: f64 = BOOTSTRAP_ROWS
            .iter()
            .map(|(x, y)| (model.predict(x) - y).powi(2))
            .sum();
        let baseline_sse: f64 = BOOTSTRAP_ROWS.iter().map(|(_, y)| (baseline - y).powi(2)).sum();
        assert!(model_sse < baseline_sse);
        match model {
            CalorieModel::GradientBoosted { trees, .. } => {
                assert_eq!(trees.len(), BOOTSTRAP_ESTIMATORS)
            }
            other => panic!("unexpected model: {other:?}"),
        }
    }

    #[test]
    fn bootstrap_training_is_deterministic() {
        assert_eq!(train_bootstrap(), train_bootstrap());
    }

    #[test]
    fn constant_features_fall_back_to_leaf() {
        let rows = [([1.0; 5], 10.0), ([1.0; 5], 20.0)];
        let model = fit_stump_ensemble(&rows, 3, 1.0);
        assert_eq!(model.predict(&[1.0; 5]), 15.0);
    }
}
