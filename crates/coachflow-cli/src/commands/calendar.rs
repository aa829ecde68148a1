//! Program calendar commands.

use chrono::NaiveDate;
use clap::Subcommand;
use coachflow_core::{ProgramStore, SubscriptionTier};
use serde::Serialize;

use super::{print_json, Context};

#[derive(Subcommand)]
pub enum CalendarAction {
    /// Generate (or regenerate) a subject's program
    Generate {
        subject: String,
        /// DISCOVERY, ESSENTIAL, PREMIUM or CLASSIC
        #[arg(long)]
        tier: String,
        /// First day of the program (YYYY-MM-DD); defaults to today
        #[arg(long)]
        start: Option<NaiveDate>,
    },
    /// Show a subject's sessions
    Show { subject: String },
    /// List tiers and their phase segments
    Tiers,
}

#[derive(Serialize)]
struct TierView {
    tier: SubscriptionTier,
    total_days: u32,
    segments: Vec<coachflow_core::PhaseSegment>,
}

pub fn run(ctx: &Context, action: CalendarAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ctx.engine()?;

    match action {
        CalendarAction::Generate {
            subject,
            tier,
            start,
        } => {
            let tier: SubscriptionTier = tier.parse()?;
            let start = start.unwrap_or_else(|| engine.today());
            let sessions = engine.generate_calendar(&subject, tier, start)?;
            print_json(&sessions)?;
        }
        CalendarAction::Show { subject } => {
            let mut sessions = engine.store().sessions(&subject)?;
            let today = engine.today();
            for session in &mut sessions {
                session.status = session.status_on(today);
            }
            print_json(&sessions)?;
        }
        CalendarAction::Tiers => {
            let catalog = engine.catalog();
            let tiers = catalog
                .tiers()
                .map(|tier| {
                    Ok(TierView {
                        tier,
                        total_days: catalog.total_days(tier)?,
                        segments: catalog.segments(tier)?.to_vec(),
                    })
                })
                .collect::<Result<Vec<_>, coachflow_core::CoreError>>()?;
            print_json(&tiers)?;
        }
    }
    Ok(())
}
