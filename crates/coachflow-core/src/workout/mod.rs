//! Exercise catalog types and the daily workout recommender.

pub mod calories;
pub mod mix;
pub mod recommender;

pub use calories::estimate_calories;
pub use mix::{Bucket, BucketFilter, MixPolicy, MixPolicyTable, MixSchedule};
pub use recommender::{CandidateFilter, Recommendation, WorkoutRecommender};

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::program::PhaseType;
use crate::subject::Gender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Cardio,
    Strength,
    Hiit,
    Mobility,
    Recovery,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Cardio => "CARDIO",
            ActivityType::Strength => "STRENGTH",
            ActivityType::Hiit => "HIIT",
            ActivityType::Mobility => "MOBILITY",
            ActivityType::Recovery => "RECOVERY",
        }
    }
}

impl std::str::FromStr for ActivityType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CARDIO" => Ok(Self::Cardio),
            "STRENGTH" => Ok(Self::Strength),
            "HIIT" => Ok(Self::Hiit),
            "MOBILITY" => Ok(Self::Mobility),
            "RECOVERY" => Ok(Self::Recovery),
            _ => Err(format!("Unknown activity type: {}", s)),
        }
    }
}

/// Ordered so that `Low < Moderate < High`; intensity caps rely on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intensity {
    Low,
    Moderate,
    High,
}

impl Intensity {
    pub fn as_str(self) -> &'static str {
        match self {
            Intensity::Low => "LOW",
            Intensity::Moderate => "MODERATE",
            Intensity::High => "HIGH",
        }
    }
}

impl std::str::FromStr for Intensity {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MODERATE" | "MEDIUM" => Ok(Self::Moderate),
            "HIGH" => Ok(Self::High),
            _ => Err(format!("Unknown intensity: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[derive(Default)]
pub enum GenderScope {
    #[default]
    All,
    Male,
    Female,
}

impl GenderScope {
    pub fn admits(self, gender: Gender) -> bool {
        match self {
            GenderScope::All => true,
            GenderScope::Male => gender == Gender::Male,
            GenderScope::Female => gender == Gender::Female,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GenderScope::All => "ALL",
            GenderScope::Male => "MALE",
            GenderScope::Female => "FEMALE",
        }
    }
}

impl std::str::FromStr for GenderScope {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALL" => Ok(Self::All),
            "MALE" => Ok(Self::Male),
            "FEMALE" => Ok(Self::Female),
            _ => Err(format!("Unknown gender scope: {}", s)),
        }
    }
}

/// Static reference entry in the exercise catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEntry {
    pub id: String,
    pub name: String,
    pub activity_type: ActivityType,
    pub intensity: Intensity,
    #[serde(default)]
    pub gender_scope: GenderScope,
    pub allowed_phases: BTreeSet<PhaseType>,
    pub met_value: f64,
}

impl ExerciseEntry {
    pub fn allows(&self, phase: PhaseType) -> bool {
        self.allowed_phases.contains(&phase)
    }
}
