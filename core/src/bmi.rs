//! BMI calculation against age-banded Asian criteria.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub const HEIGHT_RANGE_CM: (f64, f64) = (140.0, 250.0);
pub const WEIGHT_RANGE_KG: (f64, f64) = (40.0, 200.0);
pub const AGE_RANGE_YEARS: (u32, u32) = (1, 100);

/// Biometric input owned by a single session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    /// Height in centimetres (140–250)
    pub height_cm: f64,
    /// Weight in kilograms (40–200)
    pub weight_kg: f64,
    /// Age in years (1–100)
    pub age_years: u32,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("키는 140cm ~ 250cm 사이로 입력해주세요.")]
    HeightOutOfRange(f64),
    #[error("몸무게는 40kg ~ 200kg 사이로 입력해주세요.")]
    WeightOutOfRange(f64),
    #[error("나이는 1세 ~ 100세 사이로 입력해주세요.")]
    AgeOutOfRange(u32),
}

impl ProfileError {
    pub fn field(&self) -> &'static str {
        match self {
            ProfileError::HeightOutOfRange(_) => "height_cm",
            ProfileError::WeightOutOfRange(_) => "weight_kg",
            ProfileError::AgeOutOfRange(_) => "age_years",
        }
    }

    pub fn received(&self) -> serde_json::Value {
        match self {
            ProfileError::HeightOutOfRange(v) | ProfileError::WeightOutOfRange(v) => {
                serde_json::json!(v)
            }
            ProfileError::AgeOutOfRange(v) => serde_json::json!(v),
        }
    }
}

impl UserProfile {
    /// Checks height, then weight, then age. NaN fails the range check.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !(HEIGHT_RANGE_CM.0..=HEIGHT_RANGE_CM.1).contains(&self.height_cm) {
            return Err(ProfileError::HeightOutOfRange(self.height_cm));
        }
        if !(WEIGHT_RANGE_KG.0..=WEIGHT_RANGE_KG.1).contains(&self.weight_kg) {
            return Err(ProfileError::WeightOutOfRange(self.weight_kg));
        }
        if !(AGE_RANGE_YEARS.0..=AGE_RANGE_YEARS.1).contains(&self.age_years) {
            return Err(ProfileError::AgeOutOfRange(self.age_years));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    /// Korean label used in prompts and cards.
    pub fn label(self) -> &'static str {
        match self {
            BmiCategory::Underweight => "저체중",
            BmiCategory::Normal => "정상",
            BmiCategory::Overweight => "과체중",
            BmiCategory::Obese => "비만",
        }
    }
}

/// Thresholds for one age band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct BmiCriteria {
    pub age_group: &'static str,
    pub underweight: f64,
    pub normal_min: f64,
    pub normal_max: f64,
    pub overweight_max: f64,
    pub description: &'static str,
}

const YOUNG_ADULT: BmiCriteria = BmiCriteria {
    age_group: "20~40대",
    underweight: 18.5,
    normal_min: 18.5,
    normal_max: 22.9,
    overweight_max: 24.9,
    description: "일반적인 아시아 기준",
};

const MIDDLE_AGED: BmiCriteria = BmiCriteria {
    age_group: "40~60대",
    underweight: 18.5,
    normal_min: 18.5,
    normal_max: 23.4,
    overweight_max: 25.4,
    description: "중년 이후 약간 높은 BMI 권장",
};

const SENIOR: BmiCriteria = BmiCriteria {
    age_group: "60대 이상",
    underweight: 18.5,
    normal_min: 18.5,
    normal_max: 24.9,
    overweight_max: 27.4,
    description: "노년층은 다소 비만 허용 범위 확대",
};

const UNDER_TWENTY: BmiCriteria = BmiCriteria {
    age_group: "20세 미만",
    underweight: 18.5,
    normal_min: 18.5,
    normal_max: 22.9,
    overweight_max: 24.9,
    description: "일반적인 아시아 기준 적용",
};

/// Every band, in lookup order. The last entry is the fallback.
pub const CRITERIA_TABLE: [BmiCriteria; 4] = [YOUNG_ADULT, MIDDLE_AGED, SENIOR, UNDER_TWENTY];

pub fn criteria_for_age(age_years: u32) -> &'static BmiCriteria {
    match age_years {
        20..=39 => &CRITERIA_TABLE[0],
        40..=59 => &CRITERIA_TABLE[1],
        60.. => &CRITERIA_TABLE[2],
        _ => &CRITERIA_TABLE[3],
    }
}

pub fn compute_bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// Half-open classification: a value equal to `normal_max` is overweight,
/// a value equal to `overweight_max` is still overweight.
pub fn classify(bmi: f64, criteria: &BmiCriteria) -> BmiCategory {
    if bmi < criteria.underweight {
        BmiCategory::Underweight
    } else if bmi < criteria.normal_max {
        BmiCategory::Normal
    } else if bmi <= criteria.overweight_max {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WeightAdvice {
    Gain,
    Maintain,
    Reduce,
    Lose,
}

impl WeightAdvice {
    fn for_category(category: BmiCategory) -> Self {
        match category {
            BmiCategory::Underweight => WeightAdvice::Gain,
            BmiCategory::Normal => WeightAdvice::Maintain,
            BmiCategory::Overweight => WeightAdvice::Reduce,
            BmiCategory::Obese => WeightAdvice::Lose,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            WeightAdvice::Gain => "증량이 필요합니다",
            WeightAdvice::Maintain => "현재 체중을 유지하세요",
            WeightAdvice::Reduce => "감량을 권장합니다",
            WeightAdvice::Lose => "감량이 필요합니다",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct IdealWeightRange {
    pub min_kg: f64,
    pub max_kg: f64,
}

impl IdealWeightRange {
    pub fn midpoint(&self) -> f64 {
        (self.min_kg + self.max_kg) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BmiResult {
    pub value: f64,
    pub category: BmiCategory,
    pub ideal_weight_range: IdealWeightRange,
    /// Target minus current weight. Positive means gain, negative means loss,
    /// zero inside the normal band.
    pub weight_delta_kg: f64,
    pub advice: WeightAdvice,
    pub advice_message: String,
    pub criteria: BmiCriteria,
}

/// Validate the profile and derive a complete result.
pub fn calculate(profile: &UserProfile) -> Result<BmiResult, ProfileError> {
    profile.validate()?;

    let bmi = compute_bmi(profile.height_cm, profile.weight_kg);
    let criteria = *criteria_for_age(profile.age_years);
    let category = classify(bmi, &criteria);

    let height_m = profile.height_cm / 100.0;
    let height_sq = height_m * height_m;
    let ideal_weight_range = IdealWeightRange {
        min_kg: criteria.normal_min * height_sq,
        max_kg: criteria.normal_max * height_sq,
    };

    let weight_delta_kg = match category {
        BmiCategory::Underweight => ideal_weight_range.midpoint() - profile.weight_kg,
        BmiCategory::Normal => 0.0,
        BmiCategory::Overweight | BmiCategory::Obese => {
            ideal_weight_range.max_kg - profile.weight_kg
        }
    };

    let advice = WeightAdvice::for_category(category);

    Ok(BmiResult {
        value: bmi,
        category,
        ideal_weight_range,
        weight_delta_kg,
        advice,
        advice_message: advice.message().to_string(),
        criteria,
    })
}
