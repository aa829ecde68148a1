//! Subject profile data read from the profile provider.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MALE" | "M" => Ok(Gender::Male),
            "FEMALE" | "F" => Ok(Gender::Female),
            _ => Err(format!("Unknown gender: {}", s)),
        }
    }
}

/// What the engine needs to know about a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectProfile {
    pub subject_id: String,
    pub gender: Gender,
    /// Current body weight.
    pub weight_kg: Option<f64>,
    /// Healthy-weight goal used as the completion threshold.
    pub target_weight_kg: Option<f64>,
    /// Weight when the program started.
    pub start_weight_kg: Option<f64>,
}

impl SubjectProfile {
    pub fn new(subject_id: impl Into<String>, gender: Gender) -> Self {
        Self {
            subject_id: subject_id.into(),
            gender,
            weight_kg: None,
            target_weight_kg: None,
            start_weight_kg: None,
        }
    }
}
