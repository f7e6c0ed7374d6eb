//! Sodium and sugar totals for a set of selected foods, each counted as one
//! 300 g serving and compared against the daily limit.

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::foods::FoodTable;

pub const SERVING_SIZE_G: f64 = 300.0;
pub const DAILY_SODIUM_LIMIT_MG: f64 = 2000.0;
pub const DAILY_SUGAR_LIMIT_G: f64 = 50.0;

#[derive(Debug, Error, PartialEq)]
pub enum IntakeError {
    #[error("음식을 한 개 이상 선택해주세요.")]
    NothingSelected,
    #[error("선택한 음식의 영양 정보를 찾을 수 없습니다.")]
    NoMatches,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct IntakeItem {
    pub food_name: String,
    /// Sodium per 300 g serving, rounded to 0.1 mg
    pub sodium_mg: f64,
    /// Sugar per 300 g serving, rounded to 0.01 g
    pub sugar_g: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct IntakeTotal {
    pub consumed: f64,
    pub daily_limit: f64,
    pub pct_of_limit: f64,
    pub within_limit: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct IntakeReport {
    pub serving_size_g: f64,
    pub items: Vec<IntakeItem>,
    pub sodium: IntakeTotal,
    pub sugar: IntakeTotal,
    /// Selected names not present in the food table
    pub unmatched: Vec<String>,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn sodium_total(consumed: f64) -> IntakeTotal {
    let pct = consumed / DAILY_SODIUM_LIMIT_MG * 100.0;
    let within_limit = pct <= 100.0;
    let advice = if within_limit {
        "👍 좋아요! 하루 권장량 내에 있어요."
    } else {
        "⚠️ 짠 음식을 조금 줄여보세요."
    };
    IntakeTotal {
        consumed,
        daily_limit: DAILY_SODIUM_LIMIT_MG,
        pct_of_limit: pct,
        within_limit,
        message: format!("나트륨 섭취량: {consumed:.0}mg (하루 권장량의 {pct:.0}%) → {advice}"),
    }
}

fn sugar_total(consumed: f64) -> IntakeTotal {
    let pct = consumed / DAILY_SUGAR_LIMIT_G * 100.0;
    let within_limit = pct <= 100.0;
    let advice = if within_limit {
        "👍 좋아요! 하루 권장량 내에 있어요."
    } else {
        "⚠️ 단 음식을 조금 줄여보세요."
    };
    IntakeTotal {
        consumed,
        daily_limit: DAILY_SUGAR_LIMIT_G,
        pct_of_limit: pct,
        within_limit,
        message: format!("당류 섭취량: {consumed:.0}g (하루 권장량의 {pct:.0}%) → {advice}"),
    }
}

/// Missing sodium/sugar cells count as zero here, unlike the single-food
/// lookup which reports them as absent.
pub fn analyze(table: &FoodTable, selected: &[String]) -> Result<IntakeReport, IntakeError> {
    if selected.is_empty() {
        return Err(IntakeError::NothingSelected);
    }

    let ratio = SERVING_SIZE_G / 100.0;
    let mut items: Vec<IntakeItem> = Vec::new();
    let mut unmatched = Vec::new();

    for name in selected {
        if items.iter().any(|item| &item.food_name == name) {
            continue;
        }
        match table.get(name) {
            Some(record) => items.push(IntakeItem {
                food_name: record.name.clone(),
                sodium_mg: round_to(record.sodium_mg.unwrap_or(0.0) * ratio, 1),
                sugar_g: round_to(record.sugar_g.unwrap_or(0.0) * ratio, 2),
            }),
            None => unmatched.push(name.clone()),
        }
    }

    if items.is_empty() {
        return Err(IntakeError::NoMatches);
    }

    items.sort_by(|a, b| a.food_name.cmp(&b.food_name));
    let total_sodium: f64 = items.iter().map(|i| i.sodium_mg).sum();
    let total_sugar: f64 = items.iter().map(|i| i.sugar_g).sum();

    Ok(IntakeReport {
        serving_size_g: SERVING_SIZE_G,
        items,
        sodium: sodium_total(total_sodium),
        sugar: sugar_total(total_sugar),
        unmatched,
    })
}
