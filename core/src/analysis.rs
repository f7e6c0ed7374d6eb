use serde::Serialize;
use utoipa::ToSchema;

use crate::extraction::{Nutrient, NutritionEstimate, parse_analysis};
use crate::regression::LoadedModel;

pub const NOT_AVAILABLE: &str = "N/A";

/// One nutrient line as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NutrientReading {
    pub nutrient: Nutrient,
    pub label: &'static str,
    pub icon: &'static str,
    pub unit: &'static str,
    pub value: Option<u32>,
    /// "350 kcal", or "N/A" when the reply did not state the value
    pub display: String,
}

impl NutrientReading {
    fn new(nutrient: Nutrient, value: Option<u32>) -> Self {
        let display = match value {
            Some(v) => format!("{v} {}", nutrient.unit()),
            None => NOT_AVAILABLE.to_string(),
        };
        Self {
            nutrient,
            label: nutrient.keyword(),
            icon: nutrient.icon(),
            unit: nutrient.unit(),
            value,
            display,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CalorieCorrection {
    Corrected {
        raw_ai_kcal: Option<u32>,
        corrected_kcal: f64,
        /// Set when the model was trained from the built-in bootstrap rows
        provisional: bool,
    },
    Unavailable {
        raw_ai_kcal: Option<u32>,
        missing: Vec<Nutrient>,
        message: String,
    },
}

impl CalorieCorrection {
    /// Never invents values for missing nutrients: any gap in the feature row
    /// makes the correction unavailable.
    pub fn compute(estimate: &NutritionEstimate, model: &LoadedModel) -> Self {
        match estimate.correction_features() {
            Ok(row) => CalorieCorrection::Corrected {
                raw_ai_kcal: estimate.calories_kcal,
                corrected_kcal: (model.predict(&row) * 10.0).round() / 10.0,
                provisional: model.is_provisional(),
            },
            Err(missing) => {
                let names: Vec<&str> = missing.iter().map(|n| n.keyword()).collect();
                CalorieCorrection::Unavailable {
                    raw_ai_kcal: estimate.calories_kcal,
                    message: format!(
                        "영양 성분({})을 추출하지 못해 칼로리 보정을 할 수 없습니다.",
                        names.join(", ")
                    ),
                    missing,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ImageAnalysis {
    pub food_name: String,
    pub nutrients: Vec<NutrientReading>,
    pub calorie_correction: CalorieCorrection,
    pub advantage: String,
    pub caution: String,
    /// Unparsed model reply, kept for display when parsing came up short
    pub raw_reply: String,
}

pub fn analyze_reply(reply: &str, model: &LoadedModel) -> ImageAnalysis {
    let parsed = parse_analysis(reply);
    let nutrients = Nutrient::ALL
        .iter()
        .map(|n| NutrientReading::new(*n, parsed.estimate.get(*n)))
        .collect();
    let calorie_correction = CalorieCorrection::compute(&parsed.estimate, model);

    ImageAnalysis {
        food_name: parsed.estimate.food_name,
        nutrients,
        calorie_correction,
        advantage: parsed.advantage,
        caution: parsed.caution,
        raw_reply: reply.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::tests::FULL_REPLY;
    use crate::regression::{CalorieModel, ModelSource};

    fn atwater() -> LoadedModel {
        LoadedModel {
            model: CalorieModel::Linear {
                intercept: 0.0,
                coefficients: [4.0, 4.0, 9.0, 0.0, 0.0],
            },
            source: ModelSource::Artifact {
                path: "test.json".into(),
            },
        }
    }

    #[test]
    fn full_reply_is_corrected() {
        let analysis = analyze_reply(FULL_REPLY, &atwater());
        assert_eq!(analysis.food_name, "닭가슴살 샐러드");
        assert_eq!(analysis.nutrients.len(), 6);
        assert_eq!(analysis.nutrients[0].display, "350 kcal");
        assert_eq!(analysis.nutrients[5].display, "600 mg");
        assert_eq!(
            analysis.calorie_correction,
            CalorieCorrection::Corrected {
                raw_ai_kcal: Some(350),
                corrected_kcal: 328.0,
                provisional: false,
            }
        );
    }

    #[test]
    fn missing_sugar_shows_na_and_skips_correction() {
        let reply = FULL_REPLY.replace("- 당류(g): 5g\n", "");
        let analysis = analyze_reply(&reply, &atwater());

        let sugar = analysis
            .nutrients
            .iter()
            .find(|r| r.nutrient == Nutrient::Sugar)
            .unwrap();
        assert_eq!(sugar.value, None);
        assert_eq!(sugar.display, NOT_AVAILABLE);

        match analysis.calorie_correction {
            CalorieCorrection::Unavailable {
                raw_ai_kcal,
                missing,
                message,
            } => {
                assert_eq!(raw_ai_kcal, Some(350));
                assert_eq!(missing, vec![Nutrient::Sugar]);
                assert!(message.contains("당류"));
            }
            other => panic!("expected unavailable correction, got {other:?}"),
        }
    }

    #[test]
    fn bootstrap_model_marks_correction_provisional() {
        let model = LoadedModel {
            model: crate::regression::train_bootstrap(),
            source: ModelSource::Bootstrap,
        };
        let analysis = analyze_reply(FULL_REPLY, &model);
        assert!(matches!(
            analysis.calorie_correction,
            CalorieCorrection::Corrected {
                provisional: true,
                ..
            }
        ));
    }

    #[test]
    fn unstructured_reply_keeps_raw_text() {
        let reply = "죄송합니다. 이미지를 분석할 수 없습니다.";
        let analysis = analyze_reply(reply, &atwater());
        assert_eq!(analysis.food_name, "");
        assert!(analysis.nutrients.iter().all(|r| r.display == NOT_AVAILABLE));
        assert_eq!(analysis.raw_reply, reply);
        assert!(matches!(
            analysis.calorie_correction,
            CalorieCorrection::Unavailable { .. }
        ));
    }
}
