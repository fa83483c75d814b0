use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

macro_rules! choice_enum {
    ($name:ident, $field:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                match raw {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(DomainError::UnknownChoice {
                        field: $field,
                        value: raw.to_string(),
                        expected: $name::ALL
                            .iter()
                            .map(|choice| choice.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    }),
                }
            }
        }
    };
}

choice_enum!(Gender, "Gender", {
    Male => "Male",
    Female => "Female",
    Other => "Other",
});

choice_enum!(BloodType, "Blood_Type", {
    APositive => "A+",
    ANegative => "A-",
    BPositive => "B+",
    BNegative => "B-",
    AbPositive => "AB+",
    AbNegative => "AB-",
    OPositive => "O+",
    ONegative => "O-",
});

choice_enum!(MedicalCondition, "Medical_Condition", {
    Diabetes => "Diabetes",
    Hypertension => "Hypertension",
    Asthma => "Asthma",
    Obesity => "Obesity",
    Arthritis => "Arthritis",
});

/// A numeric form value.
///
/// Unparseable edits are held as NaN rather than rejected. On the wire an
/// integral value is written as a JSON integer, a fractional one as a float,
/// and NaN (or any non-finite value) as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumericValue(pub f64);

impl NumericValue {
    pub fn not_a_number() -> Self {
        Self(f64::NAN)
    }

    pub fn is_nan(&self) -> bool {
        self.0.is_nan()
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<u32> for NumericValue {
    fn from(value: u32) -> Self {
        Self(f64::from(value))
    }
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_nan() {
            f.write_str("NaN")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl Serialize for NumericValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let value = self.0;
        if !value.is_finite() {
            serializer.serialize_none()
        } else if value.fract() == 0.0 && value.abs() < 9.0e15 {
            serializer.serialize_i64(value as i64)
        } else {
            serializer.serialize_f64(value)
        }
    }
}

impl<'de> Deserialize<'de> for NumericValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Option::<f64>::deserialize(deserializer)?;
        Ok(Self(value.unwrap_or(f64::NAN)))
    }
}
