//! Notification commands.

use chrono::NaiveTime;
use clap::Subcommand;
use coachflow_core::{Category, NotificationPreferences, Priority, ProgramStore, QuietHours, SqliteStore};
use serde_json::json;

use super::{print_json, Context};

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Submit a notification through the gate (several subjects = one batch)
    Submit {
        #[arg(required = true)]
        subjects: Vec<String>,
        #[arg(long)]
        title: String,
        #[arg(long)]
        message: String,
        /// PROGRAM, WEIGH_IN, LIFESTYLE, WELLNESS or COACH
        #[arg(long)]
        category: String,
        /// HIGH, MEDIUM, LOW or GENTLE
        #[arg(long, default_value = "MEDIUM")]
        priority: String,
    },
    /// Run the phase transition check for a subject
    Tick { subject: String },
    /// List a subject's notifications, newest first
    List {
        subject: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Mark a notification read
    Read { id: i64 },
    /// Delivery preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Show a subject's preferences (defaults if never set)
    Show { subject: String },
    /// Update a subject's preferences
    Set {
        subject: String,
        /// Categories to enable (comma-separated)
        #[arg(long, value_delimiter = ',')]
        enable: Vec<String>,
        /// Categories to disable (comma-separated)
        #[arg(long, value_delimiter = ',')]
        disable: Vec<String>,
        /// Quiet window as HH:MM-HH:MM (enables quiet hours)
        #[arg(long, conflicts_with = "no_quiet_hours")]
        quiet_hours: Option<String>,
        /// Turn quiet hours off
        #[arg(long)]
        no_quiet_hours: bool,
    },
}

pub fn run(ctx: &Context, action: NotifyAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ctx.engine()?;

    match action {
        NotifyAction::Submit {
            subjects,
            title,
            message,
            category,
            priority,
        } => {
            let category: Category = category.parse()?;
            let priority: Priority = priority.parse()?;
            if let [subject] = subjects.as_slice() {
                let outcome = engine.submit_notification(subject, &title, &message, category, priority)?;
                print_json(&outcome)?;
            } else {
                let outcomes = engine.submit_batch(&subjects, &title, &message, category, priority)?;
                let report: Vec<_> = outcomes
                    .into_iter()
                    .map(|(subject_id, outcome)| json!({ "subject_id": subject_id, "result": outcome }))
                    .collect();
                print_json(&report)?;
            }
        }
        NotifyAction::Tick { subject } => print_json(&engine.run_phase_transition_check(&subject)?)?,
        NotifyAction::List { subject, limit } => {
            print_json(&engine.store().notifications(&subject, limit)?)?
        }
        NotifyAction::Read { id } => {
            if !engine.store().mark_read(id)? {
                return Err(format!("notification not found: {id}").into());
            }
            println!("ok");
        }
        NotifyAction::Prefs { action } => run_prefs(engine.store(), action)?,
    }
    Ok(())
}

fn run_prefs(store: &SqliteStore, action: PrefsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PrefsAction::Show { subject } => {
            let prefs = store
                .preferences(&subject)?
                .unwrap_or_else(|| NotificationPreferences::defaults_for(&subject));
            print_json(&prefs)?;
        }
        PrefsAction::Set {
            subject,
            enable,
            disable,
            quiet_hours,
            no_quiet_hours,
        } => {
            let mut prefs = store
                .preferences(&subject)?
                .unwrap_or_else(|| NotificationPreferences::defaults_for(&subject));
            for name in &enable {
                prefs.set_category(name.parse()?, true);
            }
            for name in &disable {
                prefs.set_category(name.parse()?, false);
            }
            if let Some(window) = quiet_hours {
                prefs.quiet_hours = parse_window(&window)?;
                prefs.quiet_hours_enabled = true;
            }
            if no_quiet_hours {
                prefs.quiet_hours_enabled = false;
            }
            store.save_preferences(&prefs)?;
            print_json(&prefs)?;
        }
    }
    Ok(())
}

fn parse_window(window: &str) -> Result<QuietHours, String> {
    let (start, end) = window
        .split_once('-')
        .ok_or_else(|| format!("expected HH:MM-HH:MM, got '{window}'"))?;
    let parse = |s: &str| {
        NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|e| format!("invalid time '{s}': {e}"))
    };
    Ok(QuietHours::new(parse(start)?, parse(end)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wrapping_window() {
        let q = parse_window("22:00-07:30").unwrap();
        assert_eq!(q.start, NaiveTime::from_hms_opt(22, 0, 0).unwrap());
        assert_eq!(q.end, NaiveTime::from_hms_opt(7, 30, 0).unwrap());
    }

    #[test]
    fn rejects_malformed_window() {
        assert!(parse_window("22:00").is_err());
        assert!(parse_window("25:00-07:00").is_err());
    }
}
