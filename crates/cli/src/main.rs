//! Goalpace CLI - sales goals, territories and pacing.

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use goalpace_core::{
    compute_progress_with, Clock, FixedClock, Goal, GoalFilter, GoalId, GoalMetric, GoalPeriod,
    GoalProgress, GoalStatus, GoalUpdate, GoalpaceConfig, NewGoal, NewTerritory, PolicyKind,
    StatusPolicy, SystemClock, TerritoryId,
};
use goalpace_progress::{BasicProgressTracker, DashboardSummary, GoalManager, ProgressTracker};
use goalpace_storage::{JsonStorage, MemoryStorage, Storage};

#[derive(Parser)]
#[command(name = "goalpace")]
#[command(about = "Sales goal tracking and pacing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Storage directory (overrides the config file)
    #[arg(short, long, global = true)]
    storage: Option<PathBuf>,

    /// Use a throwaway in-memory store
    #[arg(long, global = true)]
    memory: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Status policy: threshold, schedule_variance or deadline (overrides the config file)
    #[arg(long, global = true)]
    policy: Option<String>,

    /// Evaluate progress as of this date instead of now
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage goals
    Goal {
        #[command(subcommand)]
        command: GoalCommand,
    },
    /// Manage territories
    Territory {
        #[command(subcommand)]
        command: TerritoryCommand,
    },
    /// Show the progress dashboard
    Dashboard {
        /// Only goals in this territory
        #[arg(long)]
        territory: Option<TerritoryId>,
        /// One section per territory
        #[arg(long, conflicts_with = "territory")]
        by_territory: bool,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GoalCommand {
    /// Add a new goal
    Add {
        /// Goal title
        title: String,
        /// Value to reach
        #[arg(long)]
        target: f64,
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        /// Value reached so far
        #[arg(long, default_value = "0")]
        current: f64,
        /// monthly, quarterly, yearly or custom
        #[arg(long, default_value = "quarterly")]
        period: GoalPeriod,
        /// revenue, units, deals or any custom label
        #[arg(long, default_value = "revenue")]
        metric: GoalMetric,
        /// Owning territory
        #[arg(long)]
        territory: Option<TerritoryId>,
        /// Description
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List goals
    List {
        /// Filter by territory
        #[arg(long)]
        territory: Option<TerritoryId>,
        /// Filter by period
        #[arg(long)]
        period: Option<GoalPeriod>,
        /// Only goals whose window contains this date
        #[arg(long)]
        active_on: Option<NaiveDate>,
    },
    /// Show goal details and progress
    Show {
        /// Goal ID
        id: GoalId,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Change goal fields
    Update {
        /// Goal ID
        id: GoalId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        target: Option<f64>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        period: Option<GoalPeriod>,
        #[arg(long)]
        metric: Option<GoalMetric>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        territory: Option<TerritoryId>,
        /// Detach from its territory
        #[arg(long, conflicts_with = "territory")]
        clear_territory: bool,
    },
    /// Record the current value of a goal
    Record {
        /// Goal ID
        id: GoalId,
        /// New current value
        value: f64,
    },
    /// Delete a goal
    Delete {
        /// Goal ID
        id: GoalId,
    },
    /// Print the forecast series of a goal
    Forecast {
        /// Goal ID
        id: GoalId,
        /// Days between samples (defaults to the config value)
        #[arg(long)]
        step: Option<u32>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum TerritoryCommand {
    /// Add a territory
    Add {
        /// Territory name
        name: String,
        #[arg(long, default_value = "")]
        region: String,
        #[arg(long)]
        manager: Option<String>,
    },
    /// List territories
    List,
    /// Delete a territory with no goals
    Delete {
        /// Territory ID
        id: TerritoryId,
    },
}

/// Settings resolved from the config file and flags.
struct Settings {
    config: GoalpaceConfig,
    clock: Arc<dyn Clock>,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => GoalpaceConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GoalpaceConfig::default(),
    };
    if let Some(path) = cli.storage {
        config.storage_path = path;
    }
    if let Some(name) = &cli.policy {
        config.policy = PolicyKind::from_name(name)
            .with_context(|| format!("unknown status policy '{}'", name))?;
    }

    let clock: Arc<dyn Clock> = match cli.today {
        Some(date) => Arc::new(FixedClock::on(date)),
        None => Arc::new(SystemClock),
    };
    debug!("Using {} policy", config.policy.name());

    let settings = Settings { config, clock };

    if cli.memory {
        info!("Using in-memory storage; nothing will be saved");
        run(cli.command, MemoryStorage::new(), &settings).await
    } else {
        let storage = JsonStorage::new(&settings.config.storage_path)
            .await
            .with_context(|| format!("opening storage {}", settings.config.storage_path.display()))?;
        run(cli.command, storage, &settings).await
    }
}

async fn run<S: Storage + 'static>(command: Commands, storage: S, settings: &Settings) -> Result<()> {
    match command {
        Commands::Goal { command } => run_goal(command, storage, settings).await,
        Commands::Territory { command } => run_territory(command, storage).await,
        Commands::Dashboard { territory, by_territory, json } => {
            let tracker = tracker(storage, settings);
            if by_territory {
                let summaries = tracker.territory_summary().await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&summaries)?);
                    return Ok(());
                }
                for summary in summaries {
                    let name = summary
                        .territory
                        .as_ref()
                        .map(|t| t.name.as_str())
                        .unwrap_or("(unassigned)");
                    println!("== {}", name);
                    print_dashboard(&summary.dashboard);
                }
            } else {
                let filter = GoalFilter { territory_id: territory, ..Default::default() };
                let dashboard = tracker.dashboard(&filter).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&dashboard)?);
                } else {
                    print_dashboard(&dashboard);
                }
            }
            Ok(())
        }
    }
}

async fn run_goal<S: Storage + 'static>(command: GoalCommand, storage: S, settings: &Settings) -> Result<()> {
    let mut manager = GoalManager::new(storage);

    match command {
        GoalCommand::Add {
            title, target, start, end, current, period, metric, territory, description,
        } => {
            let goal = manager
                .create_goal(NewGoal {
                    title,
                    description,
                    metric,
                    period,
                    target_value: target,
                    current_value: current,
                    start_date: start,
                    end_date: end,
                    territory_id: territory,
                })
                .await?;
            println!("Added goal: {} - {}", goal.id, goal.title);
        }
        GoalCommand::List { territory, period, active_on } => {
            let filter = GoalFilter { territory_id: territory, period, active_on };
            let goals = manager.list_goals(&filter).await?;
            let now = settings.clock.now();

            println!("Goals ({})", goals.len());
            for goal in goals {
                let progress = compute_progress_with(&goal, now, &settings.config.policy);
                println!(
                    "  {} | {:<9} | {:>6.1}% | {} - {}",
                    goal.id,
                    format_status(progress.status),
                    progress.percentage,
                    goal.end_date,
                    goal.title,
                );
            }
        }
        GoalCommand::Show { id, json } => {
            let goal = manager.get_goal(id).await?;
            let progress = compute_progress_with(&goal, settings.clock.now(), &settings.config.policy);
            if json {
                let out = serde_json::json!({ "goal": goal, "progress": progress });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print_goal(&goal, &progress);
            }
        }
        GoalCommand::Update {
            id, title, target, start, end, period, metric, description, territory, clear_territory,
        } => {
            let territory_id = if clear_territory {
                Some(None)
            } else {
                territory.map(Some)
            };
            let goal = manager
                .update_goal(id, GoalUpdate {
                    title,
                    description,
                    metric,
                    period,
                    target_value: target,
                    current_value: None,
                    start_date: start,
                    end_date: end,
                    territory_id,
                })
                .await?;
            println!("Updated goal: {} - {}", goal.id, goal.title);
        }
        GoalCommand::Record { id, value } => {
            let goal = manager.record_progress(id, value).await?;
            let progress = compute_progress_with(&goal, settings.clock.now(), &settings.config.policy);
            println!(
                "{}: {} of {} ({:.1}%, {})",
                goal.title,
                format_amount(goal.current_value),
                format_amount(goal.target_value),
                progress.percentage,
                format_status(progress.status),
            );
        }
        GoalCommand::Delete { id } => {
            manager.delete_goal(id).await?;
            println!("Deleted goal: {}", id);
        }
        GoalCommand::Forecast { id, step, json } => {
            let step = step.unwrap_or(settings.config.forecast_step_days);
            let tracker = tracker(manager.into_storage(), settings);
            let series = tracker
                .forecast(id, step)
                .await?
                .with_context(|| format!("Goal not found: {}", id))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&series)?);
                return Ok(());
            }
            println!("{:<10}  {:>14}  {:>14}  {:>14}", "date", "target pace", "actual", "projected");
            for point in series {
                println!(
                    "{:<10}  {:>14}  {:>14}  {:>14}",
                    point.date,
                    format_amount(point.target_pace),
                    point.actual.map(format_amount).unwrap_or_default(),
                    point.projected.map(format_amount).unwrap_or_default(),
                );
            }
        }
    }

    Ok(())
}

async fn run_territory<S: Storage + 'static>(command: TerritoryCommand, storage: S) -> Result<()> {
    let mut manager = GoalManager::new(storage);

    match command {
        TerritoryCommand::Add { name, region, manager: owner } => {
            let territory = manager
                .create_territory(NewTerritory {
                    name,
                    region,
                    manager: owner,
                    description: String::new(),
                })
                .await?;
            println!("Added territory: {} - {}", territory.id, territory.name);
        }
        TerritoryCommand::List => {
            let territories = manager.list_territories().await?;
            println!("Territories ({})", territories.len());
            for territory in territories {
                println!(
                    "  {} | {} | {} | {}",
                    territory.id,
                    territory.name,
                    territory.region,
                    territory.manager.as_deref().unwrap_or("-"),
                );
            }
        }
        TerritoryCommand::Delete { id } => {
            manager.delete_territory(id).await?;
            println!("Deleted territory: {}", id);
        }
    }

    Ok(())
}

fn tracker<S: Storage>(storage: S, settings: &Settings) -> BasicProgressTracker<S> {
    BasicProgressTracker::new(storage)
        .with_clock(settings.clock.clone())
        .with_policy(settings.config.policy)
}

fn print_goal(goal: &Goal, progress: &GoalProgress) {
    println!("Goal: {}", goal.id);
    println!("  Title: {}", goal.title);
    if !goal.description.is_empty() {
        println!("  Description: {}", goal.description);
    }
    println!("  Metric: {} ({})", goal.metric, goal.period.as_str());
    println!("  Window: {} .. {}", goal.start_date, goal.end_date);
    if let Some(territory) = goal.territory_id {
        println!("  Territory: {}", territory);
    }
    println!(
        "  Progress: {} of {} {} {:.1}%",
        format_amount(goal.current_value),
        format_amount(goal.target_value),
        format_bar(progress),
        progress.percentage,
    );
    println!("  Expected by now: {:.1}%", progress.expected_progress);
    println!("  Status: {}", format_status(progress.status));
    println!(
        "  Days: {} elapsed, {} remaining of {}",
        progress.time_elapsed, progress.time_remaining, progress.days_total,
    );
    println!("  Remaining: {}", format_amount(progress.remaining));
    match progress.projected_value {
        Some(projected) => println!("  Projected: {}", format_amount(projected)),
        None => println!("  Projected: -"),
    }
}

fn print_dashboard(dashboard: &DashboardSummary) {
    println!("  Goals: {}", dashboard.total_goals);
    for status in GoalStatus::ALL {
        println!("    {:<9} {}", format_status(status), dashboard.count(status));
    }
    println!(
        "  Total: {} of {} ({:.1}%)",
        format_amount(dashboard.total_current),
        format_amount(dashboard.total_target),
        dashboard.overall_percentage,
    );
    if !dashboard.needs_attention.is_empty() {
        println!("  Needs attention:");
        for id in &dashboard.needs_attention {
            println!("    {}", id);
        }
    }
}

fn format_status(status: GoalStatus) -> &'static str {
    match status {
        GoalStatus::Completed => "COMPLETED",
        GoalStatus::OnTrack => "ON TRACK",
        GoalStatus::AtRisk => "AT RISK",
        GoalStatus::Behind => "BEHIND",
    }
}

fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}

fn format_bar(progress: &GoalProgress) -> String {
    const WIDTH: usize = 20;
    let filled = (progress.bar_width() / 100.0 * WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(WIDTH - filled))
}
