use std::borrow::Cow;
use validator::ValidationError;

use crate::models::question::{VALID_AREAS, VALID_DIFFICULTIES};

fn one_of(value: &str, allowed: &[&str], code: &'static str) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        return Ok(());
    }
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(format!(
        "'{}' is not one of: {}",
        value,
        allowed.join(", ")
    )));
    Err(err)
}

pub fn validate_area(area: &str) -> Result<(), ValidationError> {
    one_of(area, &VALID_AREAS, "invalid_area")
}

pub fn validate_difficulty(difficulty: &str) -> Result<(), ValidationError> {
    one_of(difficulty, &VALID_DIFFICULTIES, "invalid_difficulty")
}
