use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::{BloodType, Gender, MedicalCondition, NumericValue};

/// Patient attributes sent to the prediction service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormInput {
    #[serde(rename = "Age")]
    pub age: NumericValue,
    #[serde(rename = "Gender")]
    pub gender: Gender,
    #[serde(rename = "Blood_Type")]
    pub blood_type: BloodType,
    #[serde(rename = "Medical_Condition")]
    pub medical_condition: MedicalCondition,
    #[serde(rename = "Days_Hospitalized")]
    pub days_hospitalized: NumericValue,
}

impl Default for FormInput {
    fn default() -> Self {
        Self {
            age: NumericValue::from(50),
            gender: Gender::Male,
            blood_type: BloodType::APositive,
            medical_condition: MedicalCondition::Diabetes,
            days_hospitalized: NumericValue::from(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(
        serialize_with = "serialize_flag",
        deserialize_with = "deserialize_flag"
    )]
    pub readmission_prediction: bool,
    /// Probability of the high-risk class.
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

fn serialize_flag<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u8(u8::from(*value))
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Float(f64),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Int(value) => Ok(value != 0),
        Flag::Float(value) => Ok(value != 0.0),
    }
}
