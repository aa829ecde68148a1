//! Phase resolution commands.

use clap::Subcommand;
use coachflow_core::PhaseType;

use super::{print_json, Context};

#[derive(Subcommand)]
pub enum PhaseAction {
    /// Session active today (null if none)
    Active { subject: String },
    /// Session starting today
    Starting { subject: String },
    /// Session whose last day is today
    Ending { subject: String },
    /// Session starting at the configured look-ahead
    Approaching { subject: String },
    /// Replace one session's phase type, keeping its dates
    Override {
        subject: String,
        session_number: u32,
        /// DETOX, DETOX_PLUS, ATTACK, BALANCE, CONSOLIDATION or MAINTENANCE
        phase: String,
    },
}

pub fn run(ctx: &Context, action: PhaseAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ctx.engine()?;

    match action {
        PhaseAction::Active { subject } => print_json(&engine.resolve_active_phase(&subject)?)?,
        PhaseAction::Starting { subject } => print_json(&engine.resolve_starting_today(&subject)?)?,
        PhaseAction::Ending { subject } => print_json(&engine.resolve_ending_today(&subject)?)?,
        PhaseAction::Approaching { subject } => print_json(&engine.resolve_approaching(&subject)?)?,
        PhaseAction::Override {
            subject,
            session_number,
            phase,
        } => {
            let phase: PhaseType = phase.parse()?;
            engine.override_phase(&subject, session_number, phase)?;
            println!("ok");
        }
    }
    Ok(())
}
