//! Prompt construction for the AI meal-plan view.

use thiserror::Error;

use crate::bmi::{BmiCategory, classify, criteria_for_age};

#[derive(Debug, Error, PartialEq)]
pub enum MealPlanError {
    #[error(
        "BMI 및 나이 정보가 없어 식단을 생성할 수 없습니다. 'BMI 계산기' 페이지에서 정보를 입력해 주세요."
    )]
    MissingBmi,
}

/// Fixed notes shown next to every generated plan.
pub const MEAL_PLAN_DISCLAIMERS: [&str; 3] = [
    "이 식단은 참고용이며, 실제 섭취 시에는 개인의 건강 상태를 고려해주세요.",
    "특별한 건강 상태나 질환이 있다면 반드시 의사와 상담 후 섭취하세요.",
    "식단은 매일 다양하게 구성하는 것이 좋습니다.",
];

/// Split comma-separated free text into trimmed, non-empty entries.
pub fn parse_food_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct MealPlanPrompt {
    pub bmi: f64,
    pub age_years: u32,
    pub category: BmiCategory,
    pub text: String,
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "없음".to_string()
    } else {
        items.join(", ")
    }
}

/// Build the meal-plan prompt. Both BMI and age must be known before any
/// call to the model is attempted.
pub fn build_prompt(
    bmi: Option<f64>,
    age_years: Option<u32>,
    preferences: &[String],
    avoid: &[String],
) -> Result<MealPlanPrompt, MealPlanError> {
    let (Some(bmi), Some(age_years)) = (bmi, age_years) else {
        return Err(MealPlanError::MissingBmi);
    };

    let category = classify(bmi, criteria_for_age(age_years));

    let text = format!(
        "다음 조건에 맞는 하루 식단을 추천해주세요:

- BMI: {bmi:.1} ({category})
- 선호하는 음식: {preferences}
- 피해야 할 음식: {avoid}

다음 형식으로 자세히 응답해주세요:

### 🌅 아침
- 추천 식단:
- 예상 칼로리:
- 추천 이유:

### 🌞 점심
- 추천 식단:
- 예상 칼로리:
- 추천 이유:

### 🌙 저녁
- 추천 식단:
- 예상 칼로리:
- 추천 이유:

### 💡 전체적인 식단 구성 이유:

### ⚠️ 주의사항:
",
        category = category.label(),
        preferences = join_or_none(preferences),
        avoid = join_or_none(avoid),
    );

    Ok(MealPlanPrompt {
        bmi,
        age_years,
        category,
        text,
    })
}

/// User-visible message for a failed generation.
pub fn generation_failure_message(reason: &str) -> String {
    format!("식단 생성 중 오류가 발생했습니다: {reason}")
}
