pub mod analysis;
pub mod bmi;
pub mod error;
pub mod extraction;
pub mod foods;
pub mod intake;
pub mod meal_plan;
pub mod nutrition;
pub mod regression;
pub mod session;
