//! Subject profile commands.

use clap::Subcommand;
use coachflow_core::{Gender, ProgramStore, SubjectProfile};

use super::{print_json, Context};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Create or update a profile; omitted fields keep their stored value
    Set {
        subject: String,
        /// MALE or FEMALE
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        weight: Option<f64>,
        #[arg(long)]
        target: Option<f64>,
        #[arg(long)]
        start_weight: Option<f64>,
    },
    /// Show a profile (null if none)
    Show { subject: String },
}

pub fn run(ctx: &Context, action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ctx.engine()?;
    let store = engine.store();

    match action {
        ProfileAction::Set {
            subject,
            gender,
            weight,
            target,
            start_weight,
        } => {
            let gender: Option<Gender> = gender.map(|g| g.parse()).transpose()?;
            let mut profile = match (store.profile(&subject)?, gender) {
                (Some(mut existing), gender) => {
                    if let Some(gender) = gender {
                        existing.gender = gender;
                    }
                    existing
                }
                (None, Some(gender)) => SubjectProfile::new(&subject, gender),
                (None, None) => return Err(format!("new profile for {subject} needs --gender").into()),
            };
            for (field, value) in [("weight", weight), ("target", target), ("start-weight", start_weight)] {
                if let Some(v) = value {
                    if !v.is_finite() || v <= 0.0 {
                        return Err(format!("--{field} must be a positive number, got {v}").into());
                    }
                }
            }
            profile.weight_kg = weight.or(profile.weight_kg);
            profile.target_weight_kg = target.or(profile.target_weight_kg);
            profile.start_weight_kg = start_weight.or(profile.start_weight_kg);
            store.save_profile(&profile)?;
            print_json(&profile)?;
        }
        ProfileAction::Show { subject } => print_json(&store.profile(&subject)?)?,
    }
    Ok(())
}
