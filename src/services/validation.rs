// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Input validation for progress records.
//!
//! Every applicable field error is collected, but only the first failure
//! per field is reported. Nothing is persisted unless validation passes.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use validator::Validate;

use crate::db::ProgressStore;
use crate::error::{AppError, FieldErrors};
use crate::middleware::auth::AuthUser;
use crate::models::{ActivityLevel, Goal, ProgressRecord, Sex};

pub const MIN_AGE: u32 = 10;
pub const MAX_AGE: u32 = 100;

const REQUIRED: &str = "This field is required.";
const AGE_OUT_OF_RANGE: &str = "Age must be between 10 and 100.";
const NOT_AN_OBJECT: &str = "Invalid data. Expected a dictionary.";
pub const DUPLICATE_DAY: &str =
    "A progress record already exists for today. Update it instead of creating a new one.";

/// Raw body of a record creation request.
#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct CreateRecordInput {
    #[validate(range(
        exclusive_min = 0.0,
        max = 500.0,
        message = "Weight must be greater than 0 and at most 500 kg."
    ))]
    pub weight_kg: Option<f64>,
    #[validate(range(
        exclusive_min = 0.0,
        max = 300.0,
        message = "Height must be greater than 0 and at most 300 cm."
    ))]
    pub height_cm: Option<f64>,
    pub activity_level: Option<String>,
    pub goal: Option<String>,
    /// Overrides the profile sex when present
    pub gender: Option<String>,
    /// Overrides the age derived from the profile birth date when present
    #[validate(range(min = 10, max = 100, message = "Age must be between 10 and 100."))]
    pub age: Option<i64>,
}

/// Raw body of a partial update. Keys other than these are ignored, so
/// derived values, `date` and timestamps can never be set by a client.
#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct UpdateRecordInput {
    #[validate(range(
        exclusive_min = 0.0,
        max = 500.0,
        message = "Weight must be greater than 0 and at most 500 kg."
    ))]
    pub weight_kg: Option<f64>,
    #[validate(range(
        exclusive_min = 0.0,
        max = 300.0,
        message = "Height must be greater than 0 and at most 300 cm."
    ))]
    pub height_cm: Option<f64>,
    pub activity_level: Option<String>,
    pub goal: Option<String>,
}

/// Body of the public BMI calculator.
#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct BmiInput {
    #[validate(range(
        exclusive_min = 0.0,
        max = 500.0,
        message = "Weight must be greater than 0 and at most 500 kg."
    ))]
    pub weight_kg: Option<f64>,
    #[validate(range(
        exclusive_min = 0.0,
        max = 300.0,
        message = "Height must be greater than 0 and at most 300 cm."
    ))]
    pub height_cm: Option<f64>,
}

/// Decode a JSON body into one of the input structs.
///
/// A value of the wrong type is reported against its own key instead of
/// failing the whole body, so `{"weight_kg": "abc"}` yields a `weight_kg`
/// field error. Keys the input does not know are ignored.
pub fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, FieldErrors> {
    let Value::Object(fields) = body else {
        return Err(FieldErrors::non_field(NOT_AN_OBJECT));
    };

    let mut errors = FieldErrors::new();
    for (key, value) in &fields {
        let single = Map::from_iter([(key.clone(), value.clone())]);
        if serde_json::from_value::<T>(Value::Object(single)).is_err() {
            errors.add(key.as_str(), type_error_message(key));
        }
    }
    errors.into_result()?;

    // Every key decoded on its own, so the whole object decodes too.
    serde_json::from_value(Value::Object(fields)).map_err(|e| FieldErrors::non_field(e.to_string()))
}

fn type_error_message(field: &str) -> &'static str {
    match field {
        "weight_kg" | "height_cm" => "A valid number is required.",
        "age" => "A valid integer is required.",
        _ => "Not a valid string.",
    }
}

/// Creation input after validation, with age and sex resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedRecord {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
    pub sex: Sex,
    pub age: u32,
}

/// Supplied update fields after validation.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RecordPatch {
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub goal: Option<Goal>,
}

impl RecordPatch {
    /// Overwrite the supplied inputs; everything else keeps its value.
    pub fn apply_to(&self, record: &mut ProgressRecord) {
        if let Some(weight_kg) = self.weight_kg {
            record.weight_kg = weight_kg;
        }
        if let Some(height_cm) = self.height_cm {
            record.height_cm = height_cm;
        }
        if let Some(activity_level) = self.activity_level {
            record.activity_level = activity_level;
        }
        if let Some(goal) = self.goal {
            record.goal = goal;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == RecordPatch::default()
    }
}

/// Validate a creation request against the caller's profile.
pub fn validate_create(
    input: &CreateRecordInput,
    user: &AuthUser,
    today: NaiveDate,
) -> Result<ValidatedRecord, FieldErrors> {
    let mut errors = FieldErrors::new();
    collect_range_errors(input, &mut errors);

    let weight_kg = require(input.weight_kg, "weight_kg", &mut errors);
    let height_cm = require(input.height_cm, "height_cm", &mut errors);
    let activity_level = require_choice::<ActivityLevel>(
        input.activity_level.as_deref(),
        "activity_level",
        &mut errors,
    );
    let goal = require_choice::<Goal>(input.goal.as_deref(), "goal", &mut errors);

    let sex = match input.gender.as_deref() {
        Some(raw) => parse_choice::<Sex>(raw, "gender", &mut errors),
        None => Some(user.sex),
    };

    let age = match input.age {
        Some(_) if errors.has("age") => None,
        Some(age) => Some(age as u32),
        None => {
            let derived = user.age_on(today);
            if (MIN_AGE..=MAX_AGE).contains(&derived) {
                Some(derived)
            } else {
                errors.add("age", AGE_OUT_OF_RANGE);
                None
            }
        }
    };

    match (weight_kg, height_cm, activity_level, goal, sex, age) {
        (Some(weight_kg), Some(height_cm), Some(activity_level), Some(goal), Some(sex), Some(age))
            if errors.is_empty() =>
        {
            Ok(ValidatedRecord {
                weight_kg,
                height_cm,
                activity_level,
                goal,
                sex,
                age,
            })
        }
        _ => Err(errors),
    }
}

/// Validate the fields supplied in a partial update.
pub fn validate_update(input: &UpdateRecordInput) -> Result<RecordPatch, FieldErrors> {
    let mut errors = FieldErrors::new();
    collect_range_errors(input, &mut errors);

    let activity_level = input
        .activity_level
        .as_deref()
        .and_then(|raw| parse_choice::<ActivityLevel>(raw, "activity_level", &mut errors));
    let goal = input
        .goal
        .as_deref()
        .and_then(|raw| parse_choice::<Goal>(raw, "goal", &mut errors));

    errors.into_result()?;

    Ok(RecordPatch {
        weight_kg: input.weight_kg,
        height_cm: input.height_cm,
        activity_level,
        goal,
    })
}

/// Validate the public BMI calculator input, returning `(weight_kg, height_cm)`.
pub fn validate_bmi(input: &BmiInput) -> Result<(f64, f64), FieldErrors> {
    let mut errors = FieldErrors::new();
    collect_range_errors(input, &mut errors);

    let weight_kg = require(input.weight_kg, "weight_kg", &mut errors);
    let height_cm = require(input.height_cm, "height_cm", &mut errors);

    match (weight_kg, height_cm) {
        (Some(weight_kg), Some(height_cm)) if errors.is_empty() => Ok((weight_kg, height_cm)),
        _ => Err(errors),
    }
}

/// Reject creation when the user already has a record for `today`.
///
/// The store's unique constraint is still the final guard against races.
pub async fn ensure_no_record_for_day(
    db: &dyn ProgressStore,
    user_id: u64,
    today: NaiveDate,
) -> Result<(), AppError> {
    if db.find_by_user_and_date(user_id, today).await?.is_some() {
        return Err(AppError::Validation(FieldErrors::non_field(DUPLICATE_DAY)));
    }
    Ok(())
}

/// Record the first range failure of each field reported by `validator`.
fn collect_range_errors<T: Validate>(input: &T, errors: &mut FieldErrors) {
    let Err(report) = input.validate() else {
        return;
    };

    for (field, failures) in report.field_errors() {
        let field = field.to_string();
        if errors.has(&field) {
            continue;
        }
        if let Some(first) = failures.first() {
            let message = first
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value for {}.", field));
            errors.add(field, message);
        }
    }
}

fn require<T>(value: Option<T>, field: &str, errors: &mut FieldErrors) -> Option<T> {
    if value.is_none() && !errors.has(field) {
        errors.add(field, REQUIRED);
    }
    value
}

fn require_choice<T>(raw: Option<&str>, field: &str, errors: &mut FieldErrors) -> Option<T>
where
    T: std::str::FromStr,
{
    match raw {
        Some(raw) => parse_choice(raw, field, errors),
        None => {
            errors.add(field, REQUIRED);
            None
        }
    }
}

fn parse_choice<T>(raw: &str, field: &str, errors: &mut FieldErrors) -> Option<T>
where
    T: std::str::FromStr,
{
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.add(field, format!("\"{}\" is not a valid choice.", raw));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NON_FIELD_ERRORS;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn user(birth_year: i32, sex: Sex) -> AuthUser {
        AuthUser {
            user_id: 1,
            birth_date: NaiveDate::from_ymd_opt(birth_year, 1, 1).unwrap(),
            sex,
        }
    }

    fn valid_input() -> CreateRecordInput {
        CreateRecordInput {
            weight_kg: Some(75.0),
            height_cm: Some(180.0),
            activity_level: Some("modere".to_string()),
            goal: Some("maintien".to_string()),
            gender: None,
            age: None,
        }
    }

    #[test]
    fn test_valid_input_resolves_profile_age_and_sex() {
        let validated = validate_create(&valid_input(), &user(1990, Sex::Female), today()).unwrap();

        assert_eq!(validated.age, 35);
        assert_eq!(validated.sex, Sex::Female);
        assert_eq!(validated.activity_level, ActivityLevel::Moderate);
        assert_eq!(validated.goal, Goal::Maintain);
    }

    #[test]
    fn test_body_age_and_gender_override_profile() {
        let input = CreateRecordInput {
            gender: Some("H".to_string()),
            age: Some(25),
            ..valid_input()
        };

        let validated = validate_create(&input, &user(1990, Sex::Female), today()).unwrap();
        assert_eq!(validated.age, 25);
        assert_eq!(validated.sex, Sex::Male);
    }

    #[test]
    fn test_collects_all_field_errors() {
        let input = CreateRecordInput {
            weight_kg: Some(0.0),
            height_cm: Some(-3.0),
            activity_level: Some("couch".to_string()),
            goal: None,
            gender: Some("X".to_string()),
            age: Some(7),
        };

        let errors = validate_create(&input, &user(1990, Sex::Male), today()).unwrap_err();

        assert_eq!(
            errors.get("weight_kg").unwrap(),
            ["Weight must be greater than 0 and at most 500 kg."]
        );
        assert_eq!(
            errors.get("height_cm").unwrap(),
            ["Height must be greater than 0 and at most 300 cm."]
        );
        assert_eq!(errors.get("age").unwrap(), [AGE_OUT_OF_RANGE]);
        assert_eq!(errors.get("goal").unwrap(), [REQUIRED]);
        assert!(errors.has("activity_level"));
        assert!(errors.has("gender"));
    }

    #[test]
    fn test_missing_numbers_are_required() {
        let input = CreateRecordInput {
            weight_kg: None,
            height_cm: None,
            ..valid_input()
        };

        let errors = validate_create(&input, &user(1990, Sex::Male), today()).unwrap_err();
        assert_eq!(errors.get("weight_kg").unwrap(), [REQUIRED]);
        assert_eq!(errors.get("height_cm").unwrap(), [REQUIRED]);
    }

    #[test]
    fn test_derived_age_out_of_range() {
        let errors = validate_create(&valid_input(), &user(2020, Sex::Male), today()).unwrap_err();
        assert_eq!(errors.get("age").unwrap(), [AGE_OUT_OF_RANGE]);
    }

    #[test]
    fn test_age_bounds_inclusive() {
        for age in [10, 100] {
            let input = CreateRecordInput {
                age: Some(age),
                ..valid_input()
            };
            assert!(validate_create(&input, &user(1990, Sex::Male), today()).is_ok());
        }
    }

    #[test]
    fn test_update_validates_only_supplied_fields() {
        let patch = validate_update(&UpdateRecordInput {
            weight_kg: Some(83.0),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(patch.weight_kg, Some(83.0));
        assert!(patch.height_cm.is_none());
        assert!(patch.activity_level.is_none());

        let errors = validate_update(&UpdateRecordInput {
            height_cm: Some(0.0),
            goal: Some("bulk".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(errors.has("height_cm"));
        assert!(errors.has("goal"));
        assert!(!errors.has("weight_kg"));
    }

    #[test]
    fn test_update_ignores_read_only_keys() {
        let input: UpdateRecordInput = serde_json::from_value(serde_json::json!({
            "bmr": 1,
            "date": "2020-01-01",
            "goal": "prise"
        }))
        .unwrap();

        let patch = validate_update(&input).unwrap();
        assert_eq!(patch.goal, Some(Goal::Gain));
        assert!(patch.weight_kg.is_none());
    }

    #[test]
    fn test_empty_patch() {
        assert!(validate_update(&UpdateRecordInput::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_bmi_input() {
        let ok = validate_bmi(&BmiInput {
            weight_kg: Some(70.0),
            height_cm: Some(175.0),
        })
        .unwrap();
        assert_eq!(ok, (70.0, 175.0));

        let errors = validate_bmi(&BmiInput {
            weight_kg: Some(70.0),
            height_cm: Some(0.0),
        })
        .unwrap_err();
        assert_eq!(
            errors.get("height_cm").unwrap(),
            ["Height must be greater than 0 and at most 300 cm."]
        );
    }

    #[test]
    fn test_upper_bounds_reject_absurd_values() {
        let input = CreateRecordInput {
            weight_kg: Some(1e18),
            height_cm: Some(301.0),
            ..valid_input()
        };

        let errors = validate_create(&input, &user(1990, Sex::Male), today()).unwrap_err();
        assert_eq!(
            errors.get("weight_kg").unwrap(),
            ["Weight must be greater than 0 and at most 500 kg."]
        );
        assert!(errors.has("height_cm"));

        let at_limit = CreateRecordInput {
            weight_kg: Some(500.0),
            height_cm: Some(300.0),
            ..valid_input()
        };
        assert!(validate_create(&at_limit, &user(1990, Sex::Male), today()).is_ok());
    }

    #[test]
    fn test_parse_body_reports_type_errors_per_field() {
        let errors = parse_body::<CreateRecordInput>(serde_json::json!({
            "weight_kg": "abc",
            "height_cm": 180,
            "age": 25.5,
            "goal": 3
        }))
        .unwrap_err();

        assert_eq!(
            errors.get("weight_kg").unwrap(),
            ["A valid number is required."]
        );
        assert_eq!(
            errors.get("age").unwrap(),
            ["A valid integer is required."]
        );
        assert_eq!(errors.get("goal").unwrap(), ["Not a valid string."]);
        assert!(!errors.has("height_cm"));
    }

    #[test]
    fn test_parse_body_accepts_nulls_and_unknown_keys() {
        let input: UpdateRecordInput = parse_body(serde_json::json!({
            "weight_kg": null,
            "height_cm": 170.5,
            "bmi": "ignored"
        }))
        .unwrap();

        assert!(input.weight_kg.is_none());
        assert_eq!(input.height_cm, Some(170.5));
    }

    #[test]
    fn test_parse_body_rejects_non_object() {
        let errors = parse_body::<BmiInput>(serde_json::json!([70, 175])).unwrap_err();
        assert_eq!(errors.get(NON_FIELD_ERRORS).unwrap(), [NOT_AN_OBJECT]);
    }
}
