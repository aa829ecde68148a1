//! Workout recommendation commands.

use clap::Subcommand;
use coachflow_core::ProgramStore;
use serde_json::json;

use super::{print_json, Context};

#[derive(Subcommand)]
pub enum WorkoutAction {
    /// Recommend today's workout
    Recommend {
        subject: String,
        /// Include bucket, draw and fallback details
        #[arg(long)]
        explain: bool,
    },
    /// Estimate calories burned for an exercise
    Calories {
        subject: String,
        exercise_id: String,
        #[arg(long, default_value_t = 30)]
        minutes: u32,
    },
}

pub fn run(ctx: &Context, action: WorkoutAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = ctx.engine()?;

    match action {
        WorkoutAction::Recommend { subject, explain } => {
            if explain {
                print_json(&engine.recommend_workout_detailed(&subject)?)?;
            } else {
                print_json(&engine.recommend_workout(&subject)?)?;
            }
        }
        WorkoutAction::Calories {
            subject,
            exercise_id,
            minutes,
        } => {
            let exercise = engine
                .store()
                .exercises()?
                .into_iter()
                .find(|e| e.id == exercise_id)
                .ok_or_else(|| format!("unknown exercise: {exercise_id}"))?;
            let calories = engine.estimate_calories(&subject, &exercise, minutes)?;
            print_json(&json!({
                "exercise_id": exercise.id,
                "minutes": minutes,
                "calories": calories,
            }))?;
        }
    }
    Ok(())
}
