// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progress record model and the closed input enumerations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::services::calculator::MetabolicResult;

/// Unrecognized value for one of the enumerated inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseChoiceError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseChoiceError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Physical activity level, scaling BMR into TDEE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ActivityLevel {
    #[serde(rename = "sedentaire", alias = "sedentary")]
    Sedentary,
    #[serde(rename = "leger", alias = "light")]
    Light,
    #[serde(rename = "modere", alias = "moderate")]
    Moderate,
    #[serde(rename = "intense")]
    Intense,
    #[serde(rename = "tres_intense", alias = "very_intense", alias = "very-intense")]
    VeryIntense,
}

impl ActivityLevel {
    pub fn factor(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Intense => 1.725,
            ActivityLevel::VeryIntense => 1.9,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentaire",
            ActivityLevel::Light => "leger",
            ActivityLevel::Moderate => "modere",
            ActivityLevel::Intense => "intense",
            ActivityLevel::VeryIntense => "tres_intense",
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sedentaire" | "sedentary" => Ok(ActivityLevel::Sedentary),
            "leger" | "light" => Ok(ActivityLevel::Light),
            "modere" | "moderate" => Ok(ActivityLevel::Moderate),
            "intense" => Ok(ActivityLevel::Intense),
            "tres_intense" | "very_intense" | "very-intense" => Ok(ActivityLevel::VeryIntense),
            other => Err(ParseChoiceError::new("activity level", other)),
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weight goal, shifting TDEE into the recommended intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Goal {
    #[serde(rename = "perte", alias = "lose")]
    Lose,
    #[serde(rename = "maintien", alias = "maintain")]
    Maintain,
    #[serde(rename = "prise", alias = "gain")]
    Gain,
}

impl Goal {
    /// Daily kcal added to TDEE.
    pub fn calorie_offset(self) -> i64 {
        match self {
            Goal::Lose => -500,
            Goal::Maintain => 0,
            Goal::Gain => 300,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Goal::Lose => "perte",
            Goal::Maintain => "maintien",
            Goal::Gain => "prise",
        }
    }
}

impl FromStr for Goal {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "perte" | "lose" => Ok(Goal::Lose),
            "maintien" | "maintain" => Ok(Goal::Maintain),
            "prise" | "gain" => Ok(Goal::Gain),
            other => Err(ParseChoiceError::new("goal", other)),
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Biological sex used by the BMR equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Sex {
    #[serde(rename = "H", alias = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "H",
            Sex::Female => "F",
        }
    }
}

impl FromStr for Sex {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "H" | "M" => Ok(Sex::Male),
            "F" => Ok(Sex::Female),
            other => Err(ParseChoiceError::new("gender", other)),
        }
    }
}

/// One user's body-metric snapshot for one calendar day.
///
/// Stored in the `progress_records` collection under `{user_id}_{date}`,
/// which makes the (user, day) pair unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Store-assigned identifier used in API paths
    pub id: u64,
    /// Owning user
    pub user_id: u64,
    /// Calendar day the record belongs to (immutable)
    pub date: NaiveDate,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
    /// Body mass index, 2 decimals
    pub bmi: f64,
    /// Basal metabolic rate (kcal/day)
    pub bmr: i64,
    /// Total daily energy expenditure (kcal/day)
    pub tdee: i64,
    pub recommended_calories: i64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// Overwrite the derived outputs.
    pub fn apply_metrics(&mut self, metrics: MetabolicResult) {
        self.bmi = metrics.bmi;
        self.bmr = metrics.bmr;
        self.tdee = metrics.tdee;
        self.recommended_calories = metrics.recommended_calories;
    }

    /// Document key enforcing one record per user per day.
    pub fn day_key(&self) -> String {
        day_key(self.user_id, self.date)
    }
}

pub(crate) fn day_key(user_id: u64, date: NaiveDate) -> String {
    format!("{}_{}", user_id, date.format("%Y-%m-%d"))
}

/// A validated record not yet persisted; the store assigns its id.
#[derive(Debug, Clone)]
pub struct NewProgressRecord {
    pub user_id: u64,
    pub date: NaiveDate,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
    pub metrics: MetabolicResult,
    pub created_at: DateTime<Utc>,
}

impl NewProgressRecord {
    pub fn into_record(self, id: u64) -> ProgressRecord {
        ProgressRecord {
            id,
            user_id: self.user_id,
            date: self.date,
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
            activity_level: self.activity_level,
            goal: self.goal,
            bmi: self.metrics.bmi,
            bmr: self.metrics.bmr,
            tdee: self.metrics.tdee,
            recommended_calories: self.metrics.recommended_calories,
            created_at: self.created_at,
            modified_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_level_accepts_aliases() {
        assert_eq!(
            "modere".parse::<ActivityLevel>().unwrap(),
            ActivityLevel::Moderate
        );
        assert_eq!(
            "moderate".parse::<ActivityLevel>().unwrap(),
            ActivityLevel::Moderate
        );
        assert_eq!(
            "very-intense".parse::<ActivityLevel>().unwrap(),
            ActivityLevel::VeryIntense
        );
    }

    #[test]
    fn test_unknown_activity_level_is_an_error() {
        let err = "couch".parse::<ActivityLevel>().unwrap_err();
        assert_eq!(err.kind, "activity level");
        assert_eq!(err.value, "couch");
    }

    #[test]
    fn test_goal_and_sex_parse() {
        assert_eq!("perte".parse::<Goal>().unwrap(), Goal::Lose);
        assert_eq!("gain".parse::<Goal>().unwrap(), Goal::Gain);
        assert!("bulk".parse::<Goal>().is_err());

        assert_eq!("H".parse::<Sex>().unwrap(), Sex::Male);
        assert_eq!("M".parse::<Sex>().unwrap(), Sex::Male);
        assert_eq!("F".parse::<Sex>().unwrap(), Sex::Female);
        assert!("X".parse::<Sex>().is_err());
    }

    #[test]
    fn test_enums_serialize_to_canonical_values() {
        assert_eq!(
            serde_json::to_value(ActivityLevel::VeryIntense).unwrap(),
            "tres_intense"
        );
        assert_eq!(serde_json::to_value(Goal::Maintain).unwrap(), "maintien");
        assert_eq!(serde_json::to_value(Sex::Male).unwrap(), "H");

        let level: ActivityLevel = serde_json::from_str("\"light\"").unwrap();
        assert_eq!(level, ActivityLevel::Light);
    }

    #[test]
    fn test_day_key_format() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(day_key(42, date), "42_2025-03-07");
    }
}
