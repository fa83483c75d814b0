//! Form state: the current patient attributes and per-field edits.

use std::{fmt, str::FromStr};

use shared::{
    domain::{BloodType, Gender, MedicalCondition, NumericValue},
    error::DomainError,
    protocol::FormInput,
};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Age,
    Gender,
    BloodType,
    MedicalCondition,
    DaysHospitalized,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        FormField::Age,
        FormField::Gender,
        FormField::BloodType,
        FormField::MedicalCondition,
        FormField::DaysHospitalized,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            FormField::Age => "Age",
            FormField::Gender => "Gender",
            FormField::BloodType => "Blood_Type",
            FormField::MedicalCondition => "Medical_Condition",
            FormField::DaysHospitalized => "Days_Hospitalized",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for FormField {
    type Err = FormError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        FormField::ALL
            .into_iter()
            .find(|field| field.wire_name() == name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("unknown form field '{0}'")]
    UnknownField(String),
    #[error(transparent)]
    InvalidChoice(#[from] DomainError),
    #[error("{field} must not be negative (got {value})")]
    Negative { field: FormField, value: String },
}

/// Parses a numeric edit. Anything that is not a finite number becomes NaN;
/// that value is still sent to the service as-is.
fn parse_numeric(field: FormField, raw: &str) -> Result<NumericValue, FormError> {
    let value = match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            warn!(field = %field, raw, "numeric field is not a finite number; keeping NaN");
            return Ok(NumericValue::not_a_number());
        }
    };
    if value < 0.0 {
        return Err(FormError::Negative {
            field,
            value: raw.to_string(),
        });
    }
    Ok(NumericValue(value))
}

pub trait FormInputExt: Sized {
    fn with_field(&self, field: FormField, raw: &str) -> Result<Self, FormError>;
}

impl FormInputExt for FormInput {
    fn with_field(&self, field: FormField, raw: &str) -> Result<Self, FormError> {
        let mut next = *self;
        match field {
            FormField::Age => next.age = parse_numeric(field, raw)?,
            FormField::DaysHospitalized => next.days_hospitalized = parse_numeric(field, raw)?,
            FormField::Gender => next.gender = raw.parse::<Gender>()?,
            FormField::BloodType => next.blood_type = raw.parse::<BloodType>()?,
            FormField::MedicalCondition => {
                next.medical_condition = raw.parse::<MedicalCondition>()?
            }
        }
        Ok(next)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormState {
    current: FormInput,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one edit by wire field name. A rejected edit leaves the
    /// current record untouched.
    pub fn update(&mut self, name: &str, raw: &str) -> Result<FormInput, FormError> {
        let field = name.parse::<FormField>()?;
        self.update_field(field, raw)
    }

    pub fn update_field(&mut self, field: FormField, raw: &str) -> Result<FormInput, FormError> {
        let next = self.current.with_field(field, raw)?;
        debug!(field = %field, raw, "form field updated");
        self.current = next;
        Ok(next)
    }

    pub fn snapshot(&self) -> FormInput {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = FormInput::default();
    }
}

#[cfg(test)]
#[path = "tests/form_state_tests.rs"]
mod tests;
