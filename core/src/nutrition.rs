//! Serving-size lookup with macro-ratio feedback.
//!
//! Two sodium/sugar policies coexist here: fixed absolute triggers
//! (1500 mg / 30 g) for the feedback list, and share-of-daily-recommendation
//! badges. The multi-food intake analyzer has its own policy in `intake`.

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::foods::{FoodRecord, FoodTable};

pub const DEFAULT_SERVING_G: f64 = 100.0;
pub const SERVING_RANGE_G: (f64, f64) = (1.0, 1000.0);

pub const KCAL_PER_G_CARBS: f64 = 4.0;
pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

const SODIUM_ALERT_MG: f64 = 1500.0;
const SUGAR_ALERT_G: f64 = 30.0;

const DAILY_SODIUM_MG: f64 = 2000.0;
const DAILY_SUGAR_G: f64 = 50.0;

#[derive(Debug, Error, PartialEq)]
pub enum LookupError {
    #[error("선택한 음식의 영양 정보를 찾을 수 없습니다: {0}")]
    UnknownFood(String),
    #[error("섭취량은 1 ~ 1000 (g/ml) 사이로 입력해주세요.")]
    AmountOutOfRange(f64),
}

/// Nutrient values for the requested serving.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ScaledNutrients {
    pub energy_kcal: f64,
    pub carbs_g: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub sodium_mg: Option<f64>,
    pub sugar_g: Option<f64>,
}

impl ScaledNutrients {
    pub fn scale(record: &FoodRecord, ratio: f64) -> Self {
        Self {
            energy_kcal: record.energy_kcal * ratio,
            carbs_g: record.carbs_g * ratio,
            protein_g: record.protein_g * ratio,
            fat_g: record.fat_g * ratio,
            sodium_mg: record.sodium_mg.map(|v| v * ratio),
            sugar_g: record.sugar_g.map(|v| v * ratio),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Macro {
    Carbohydrate,
    Protein,
    Fat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MacroLevel {
    Low,
    Adequate,
    High,
}

/// Percentage of the serving's energy coming from each macronutrient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct MacroShares {
    pub carbohydrate_pct: f64,
    pub protein_pct: f64,
    pub fat_pct: f64,
}

impl MacroShares {
    /// Zero energy yields zero shares rather than a division by zero.
    pub fn from_nutrients(n: &ScaledNutrients) -> Self {
        if n.energy_kcal <= 0.0 {
            return Self {
                carbohydrate_pct: 0.0,
                protein_pct: 0.0,
                fat_pct: 0.0,
            };
        }
        Self {
            carbohydrate_pct: n.carbs_g * KCAL_PER_G_CARBS / n.energy_kcal * 100.0,
            protein_pct: n.protein_g * KCAL_PER_G_PROTEIN / n.energy_kcal * 100.0,
            fat_pct: n.fat_g * KCAL_PER_G_FAT / n.energy_kcal * 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MacroFeedback {
    pub nutrient: Macro,
    pub share_pct: f64,
    pub level: MacroLevel,
    pub message: String,
}

fn carbohydrate_feedback(share: f64) -> MacroFeedback {
    let (level, message) = if share > 60.0 {
        (MacroLevel::High, "🍚 탄수화물 비중이 높아요. 밥이나 빵류 섭취를 줄여보세요.")
    } else if share < 40.0 {
        (MacroLevel::Low, "🍞 탄수화물 비중이 낮아요. 에너지를 충분히 섭취하세요.")
    } else {
        (MacroLevel::Adequate, "✅ 탄수화물 비율이 적정합니다.")
    };
    MacroFeedback {
        nutrient: Macro::Carbohydrate,
        share_pct: share,
        level,
        message: message.to_string(),
    }
}

fn protein_feedback(share: f64) -> MacroFeedback {
    let (level, message) = if share < 15.0 {
        (MacroLevel::Low, "💪 단백질 섭취가 적습니다. 달걀, 닭가슴살, 두부를 추가해보세요.")
    } else if share > 25.0 {
        (MacroLevel::High, "🥩 단백질이 많아요. 탄수화물과의 균형을 확인해보세요.")
    } else {
        (MacroLevel::Adequate, "✅ 단백질 섭취가 적당합니다.")
    };
    MacroFeedback {
        nutrient: Macro::Protein,
        share_pct: share,
        level,
        message: message.to_string(),
    }
}

fn fat_feedback(share: f64) -> MacroFeedback {
    let (level, message) = if share > 30.0 {
        (MacroLevel::High, "🍟 지방 섭취가 높아요. 튀김이나 가공식품을 줄이세요.")
    } else if share < 10.0 {
        (MacroLevel::Low, "🥑 지방이 적어요. 견과류나 올리브유로 보충해보세요.")
    } else {
        (MacroLevel::Adequate, "✅ 지방 섭취도 적정합니다.")
    };
    MacroFeedback {
        nutrient: Macro::Fat,
        share_pct: share,
        level,
        message: message.to_string(),
    }
}

/// Traffic-light level for a share of the daily recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DailyShareLevel {
    Green,
    Orange,
    Red,
}

impl DailyShareLevel {
    fn from_pct(pct: f64) -> Self {
        if pct < 30.0 {
            DailyShareLevel::Green
        } else if pct < 70.0 {
            DailyShareLevel::Orange
        } else {
            DailyShareLevel::Red
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct DailyShare {
    pub amount: f64,
    pub daily_recommendation: f64,
    pub pct: f64,
    pub level: DailyShareLevel,
}

impl DailyShare {
    fn new(amount: f64, daily_recommendation: f64) -> Self {
        let pct = amount / daily_recommendation * 100.0;
        Self {
            amount,
            daily_recommendation,
            pct,
            level: DailyShareLevel::from_pct(pct),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NutritionLookup {
    pub food_name: String,
    pub amount_g: f64,
    pub ratio: f64,
    pub nutrients: ScaledNutrients,
    pub macro_shares: MacroShares,
    pub sodium_share: Option<DailyShare>,
    pub sugar_share: Option<DailyShare>,
    /// Macro feedback first, then any sodium/sugar alerts
    pub feedback: Vec<String>,
    pub macro_feedback: Vec<MacroFeedback>,
}

pub fn lookup(
    table: &FoodTable,
    food_name: &str,
    amount_g: Option<f64>,
) -> Result<NutritionLookup, LookupError> {
    let amount_g = amount_g.unwrap_or(DEFAULT_SERVING_G);
    if !(SERVING_RANGE_G.0..=SERVING_RANGE_G.1).contains(&amount_g) {
        return Err(LookupError::AmountOutOfRange(amount_g));
    }
    let record = table
        .get(food_name)
        .ok_or_else(|| LookupError::UnknownFood(food_name.to_string()))?;

    Ok(analyze_serving(record, amount_g))
}

/// Scale a record to `amount_g` and derive feedback. Does not range-check.
pub fn analyze_serving(record: &FoodRecord, amount_g: f64) -> NutritionLookup {
    let ratio = amount_g / 100.0;
    let nutrients = ScaledNutrients::scale(record, ratio);
    let macro_shares = MacroShares::from_nutrients(&nutrients);

    let macro_feedback = vec![
        carbohydrate_feedback(macro_shares.carbohydrate_pct),
        protein_feedback(macro_shares.protein_pct),
        fat_feedback(macro_shares.fat_pct),
    ];

    let mut feedback: Vec<String> = macro_feedback.iter().map(|f| f.message.clone()).collect();
    if nutrients.sodium_mg.is_some_and(|v| v > SODIUM_ALERT_MG) {
        feedback.push("⚠️ 나트륨이 높아요. 짠 음식 섭취를 줄이세요.".to_string());
    }
    if nutrients.sugar_g.is_some_and(|v| v > SUGAR_ALERT_G) {
        feedback.push("⚠️ 당류가 많아요. 단 음료나 디저트는 자제하세요.".to_string());
    }

    NutritionLookup {
        food_name: record.name.clone(),
        amount_g,
        ratio,
        sodium_share: nutrients.sodium_mg.map(|v| DailyShare::new(v, DAILY_SODIUM_MG)),
        sugar_share: nutrients.sugar_g.map(|v| DailyShare::new(v, DAILY_SUGAR_G)),
        nutrients,
        macro_shares,
        feedback,
        macro_feedback,
    }
}
