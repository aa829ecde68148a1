//! Weight tracking commands.

use clap::Subcommand;
use coachflow_core::ProgramStore;
use serde_json::json;

use super::{print_json, Context};

#[derive(Subcommand)]
pub enum WeightAction {
    /// Record today's reading in kilograms
    Record { subject: String, kg: f64 },
    /// Recent readings, newest first
    History {
        subject: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Whether the last two readings hold the target weight
    Target { subject: String },
    /// Consolidation length in days
    Consolidation {
        /// Use the subject's profile start weight and latest reading
        subject: Option<String>,
        #[arg(long, requires = "current", conflicts_with = "subject")]
        start: Option<f64>,
        #[arg(long, requires = "start", conflicts_with = "subject")]
        current: Option<f64>,
    },
}

pub fn run(ctx: &Context, action: WeightAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ctx.engine()?;

    match action {
        WeightAction::Record { subject, kg } => print_json(&engine.record_weight(&subject, kg)?)?,
        WeightAction::History { subject, limit } => {
            print_json(&engine.store().latest_weights(&subject, limit)?)?
        }
        WeightAction::Target { subject } => {
            let reached = engine.is_target_reached(&subject)?;
            print_json(&json!({ "subject_id": subject, "target_reached": reached }))?;
        }
        WeightAction::Consolidation {
            subject,
            start,
            current,
        } => {
            let days = match (subject, start, current) {
                (Some(subject), _, _) => engine.consolidation_days_for(&subject)?,
                (None, Some(start), Some(current)) => {
                    Some(engine.estimate_consolidation_days(start, current))
                }
                _ => return Err("pass a subject or both --start and --current".into()),
            };
            print_json(&json!({ "consolidation_days": days }))?;
        }
    }
    Ok(())
}
