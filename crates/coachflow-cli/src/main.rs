use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "coachflow", version, about = "Coaching program engine CLI")]
struct Cli {
    /// Evaluate as if it were this instant (RFC 3339), instead of now
    #[arg(long, global = true, value_parser = parse_instant)]
    now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Program calendar generation and inspection
    Calendar {
        #[command(subcommand)]
        action: commands::calendar::CalendarAction,
    },
    /// Phase resolution and coach overrides
    Phase {
        #[command(subcommand)]
        action: commands::phase::PhaseAction,
    },
    /// Workout recommendations
    Workout {
        #[command(subcommand)]
        action: commands::workout::WorkoutAction,
    },
    /// Exercise catalog management
    Exercise {
        #[command(subcommand)]
        action: commands::exercise::ExerciseAction,
    },
    /// Notifications and delivery preferences
    Notify {
        #[command(subcommand)]
        action: commands::notify::NotifyAction,
    },
    /// Weight readings and progress checks
    Weight {
        #[command(subcommand)]
        action: commands::weight::WeightAction,
    },
    /// Subject profiles
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp '{s}': {e}"))
}

fn main() {
    let env_filter = EnvFilter::try_from_env("COACHFLOW_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let ctx = commands::Context::new(cli.now);
    let result = match cli.command {
        Commands::Calendar { action } => commands::calendar::run(&ctx, action),
        Commands::Phase { action } => commands::phase::run(&ctx, action),
        Commands::Workout { action } => commands::workout::run(&ctx, action),
        Commands::Exercise { action } => commands::exercise::run(&ctx, action),
        Commands::Notify { action } => commands::notify::run(&ctx, action),
        Commands::Weight { action } => commands::weight::run(&ctx, action),
        Commands::Profile { action } => commands::profile::run(&ctx, action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
