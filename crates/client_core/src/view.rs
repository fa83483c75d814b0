//! Read-only view model handed to whatever renders the assessment.

use shared::protocol::{FormInput, PredictionResult};

use crate::PredictionOutcome;

pub const LOW_RISK_LABEL: &str = "Low Risk";
pub const HIGH_RISK_LABEL: &str = "High Risk";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::High => "High",
        }
    }
}

/// Two complementary fractions (low-risk, high-risk).
#[derive(Debug, Clone, PartialEq)]
pub struct ProportionSeries {
    pub labels: [&'static str; 2],
    pub values: [f64; 2],
}

impl ProportionSeries {
    pub fn from_probability(probability: f64) -> Self {
        Self {
            labels: [LOW_RISK_LABEL, HIGH_RISK_LABEL],
            values: [1.0 - probability, probability],
        }
    }

    pub fn low(&self) -> f64 {
        self.values[0]
    }

    pub fn high(&self) -> f64 {
        self.values[1]
    }
}

#[derive(Debug, Clone)]
pub struct AssessmentView {
    pub form: FormInput,
    pub in_flight: bool,
    pub outcome: PredictionOutcome,
}

impl AssessmentView {
    pub fn new(form: FormInput, in_flight: bool, outcome: PredictionOutcome) -> Self {
        Self {
            form,
            in_flight,
            outcome,
        }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.in_flight {
            "Predicting..."
        } else {
            "Assess Risk"
        }
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        self.outcome.result()
    }

    pub fn proportion_series(&self) -> Option<ProportionSeries> {
        self.result()
            .map(|result| ProportionSeries::from_probability(result.probability))
    }

    pub fn risk_level(&self) -> Option<RiskLevel> {
        self.result().map(|result| {
            if result.readmission_prediction {
                RiskLevel::High
            } else {
                RiskLevel::Low
            }
        })
    }

    pub fn probability_percent(&self) -> Option<String> {
        self.result()
            .map(|result| format!("{:.2}%", result.probability * 100.0))
    }
}
