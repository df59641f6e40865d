// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Metabolic calculations for a body-metric snapshot.
//!
//! - BMR: Mifflin-St Jeor, `10w + 6.25h - 5a + 5` (men) or `- 161` (women)
//! - TDEE: BMR scaled by the activity factor
//! - Recommended intake: TDEE shifted by the goal offset
//! - BMI: weight / height_m²
//!
//! Rounding is half away from zero. TDEE is derived from the rounded BMR
//! and the recommended intake from the rounded TDEE.
//!
//! Inputs are expected to be validated: height must be non-zero.

use serde::{Deserialize, Serialize};

use crate::models::{ActivityLevel, Goal, Sex};

/// Derived outputs stored on every progress record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetabolicResult {
    pub bmi: f64,
    pub bmr: i64,
    pub tdee: i64,
    pub recommended_calories: i64,
}

/// Compute BMI, BMR, TDEE and recommended calories.
pub fn compute(
    weight_kg: f64,
    height_cm: f64,
    age_years: u32,
    sex: Sex,
    activity_level: ActivityLevel,
    goal: Goal,
) -> MetabolicResult {
    let bmr = mifflin_st_jeor(weight_kg, height_cm, age_years, sex).round() as i64;
    let tdee = (bmr as f64 * activity_level.factor()).round() as i64;
    let recommended_calories = tdee.saturating_add(goal.calorie_offset());

    MetabolicResult {
        bmi: compute_bmi(weight_kg, height_cm),
        bmr,
        tdee,
        recommended_calories,
    }
}

/// Body mass index rounded to 2 decimals.
pub fn compute_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    round_to_cents(weight_kg / (height_m * height_m))
}

fn mifflin_st_jeor(weight_kg: f64, height_cm: f64, age_years: u32, sex: Sex) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age_years);
    match sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
