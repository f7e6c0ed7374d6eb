//! Per-session state shared between views.
//!
//! A session holds at most one profile, the BMI result derived from it, and
//! the foods picked for intake analysis. The BMI result is only ever present
//! for the profile currently stored.

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::bmi::{self, BmiResult, ProfileError, UserProfile};
use crate::foods::FoodTable;
use crate::intake::{self, IntakeError, IntakeReport};

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("음식 목록에 없는 항목입니다: {0}")]
    UnknownFood(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct SessionContext {
    pub profile: Option<UserProfile>,
    pub bmi: Option<BmiResult>,
    pub selected_foods: Vec<String>,
}

impl SessionContext {
    /// Store a validated profile. Any field change drops the BMI result.
    /// Returns whether the stored profile changed.
    pub fn update_profile(&mut self, profile: UserProfile) -> Result<bool, ProfileError> {
        profile.validate()?;
        let changed = self.profile != Some(profile);
        if changed {
            self.profile = Some(profile);
            self.bmi = None;
        }
        Ok(changed)
    }

    /// Store `profile` and derive its BMI. On validation failure the previous
    /// result is cleared and the stored profile is left as it was.
    pub fn calculate_bmi(&mut self, profile: UserProfile) -> Result<&BmiResult, ProfileError> {
        match bmi::calculate(&profile) {
            Ok(result) => {
                self.profile = Some(profile);
                Ok(&*self.bmi.insert(result))
            }
            Err(err) => {
                self.bmi = None;
                Err(err)
            }
        }
    }

    /// BMI value and age when a result exists, for the meal-plan prompt.
    pub fn meal_plan_inputs(&self) -> (Option<f64>, Option<u32>) {
        match (&self.bmi, &self.profile) {
            (Some(result), Some(profile)) => (Some(result.value), Some(profile.age_years)),
            _ => (None, None),
        }
    }

    /// Replace the selection. Every name must exist in `table`; duplicates are
    /// dropped keeping first-seen order.
    pub fn select_foods(
        &mut self,
        table: &FoodTable,
        names: Vec<String>,
    ) -> Result<(), SelectionError> {
        let mut selected: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.trim().to_string();
            if !table.contains(&name) {
                return Err(SelectionError::UnknownFood(name));
            }
            if !selected.contains(&name) {
                selected.push(name);
            }
        }
        self.selected_foods = selected;
        Ok(())
    }

    pub fn intake_report(&self, table: &FoodTable) -> Result<IntakeReport, IntakeError> {
        intake::analyze(table, &self.selected_foods)
    }
}
