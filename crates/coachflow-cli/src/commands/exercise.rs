//! Exercise catalog commands.

use std::collections::BTreeSet;

use clap::Subcommand;
use coachflow_core::{ActivityType, ExerciseEntry, GenderScope, Intensity, PhaseType, ProgramStore};

use super::{print_json, Context};

#[derive(Subcommand)]
pub enum ExerciseAction {
    /// Add or replace a catalog entry
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        /// CARDIO, STRENGTH, HIIT, MOBILITY or RECOVERY
        #[arg(long)]
        activity: String,
        /// LOW, MODERATE or HIGH
        #[arg(long)]
        intensity: String,
        /// ALL, MALE or FEMALE
        #[arg(long, default_value = "ALL")]
        gender_scope: String,
        /// Comma-separated phases; all phases when omitted
        #[arg(long, value_delimiter = ',')]
        phases: Vec<String>,
        #[arg(long)]
        met: f64,
    },
    /// List the catalog
    List,
    /// Load a small starter catalog
    Seed,
}

pub fn run(ctx: &Context, action: ExerciseAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ctx.engine()?;
    let store = engine.store();

    match action {
        ExerciseAction::Add {
            id,
            name,
            activity,
            intensity,
            gender_scope,
            phases,
            met,
        } => {
            if !met.is_finite() || met <= 0.0 {
                return Err(format!("MET value must be positive, got {met}").into());
            }
            let allowed_phases: BTreeSet<PhaseType> = if phases.is_empty() {
                PhaseType::ALL.into_iter().collect()
            } else {
                phases
                    .iter()
                    .map(|p| p.parse::<PhaseType>())
                    .collect::<Result<_, _>>()?
            };
            let entry = ExerciseEntry {
                id,
                name,
                activity_type: activity.parse()?,
                intensity: intensity.parse()?,
                gender_scope: gender_scope.parse()?,
                allowed_phases,
                met_value: met,
            };
            store.insert_exercise(&entry)?;
            print_json(&entry)?;
        }
        ExerciseAction::List => print_json(&store.exercises()?)?,
        ExerciseAction::Seed => {
            let entries = starter_catalog();
            for entry in &entries {
                store.insert_exercise(entry)?;
            }
            println!("seeded {} exercises", entries.len());
        }
    }
    Ok(())
}

fn starter_catalog() -> Vec<ExerciseEntry> {
    use ActivityType::*;
    use Intensity::*;
    use PhaseType::*;

    let rows: [(&str, &str, ActivityType, Intensity, &[PhaseType], f64); 10] = [
        ("walk-brisk", "Brisk walk", Cardio, Low, &PhaseType::ALL, 3.5),
        ("cycle-easy", "Easy cycling", Cardio, Moderate, &PhaseType::ALL, 5.8),
        ("swim-laps", "Lap swimming", Cardio, Moderate, &[DetoxPlus, Attack, Balance, Consolidation, Maintenance], 6.0),
        ("stretch-full", "Full-body stretch", Mobility, Low, &PhaseType::ALL, 2.3),
        ("yoga-restore", "Restorative yoga", Recovery, Low, &PhaseType::ALL, 2.5),
        ("intervals-run", "Running intervals", Hiit, High, &[Attack, Balance, Maintenance], 9.0),
        ("circuit-body", "Bodyweight circuit", Hiit, Moderate, &[Attack, Balance, Maintenance], 7.0),
        ("squat-goblet", "Goblet squats", Strength, Moderate, &[Attack, Balance, Consolidation, Maintenance], 5.0),
        ("deadlift", "Deadlifts", Strength, High, &[Attack, Balance, Maintenance], 6.0),
        ("bands-light", "Light band work", Strength, Low, &[Detox, DetoxPlus, Consolidation, Maintenance], 3.0),
    ];

    rows.into_iter()
        .map(|(id, name, activity_type, intensity, phases, met_value)| ExerciseEntry {
            id: id.to_string(),
            name: name.to_string(),
            activity_type,
            intensity,
            gender_scope: GenderScope::All,
            allowed_phases: phases.iter().copied().collect(),
            met_value,
        })
        .collect()
}
