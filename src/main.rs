mod analytics;
mod config;
mod error;
mod keywords;
mod models;
mod registry;
mod tracker;

use analytics::{Analytics, CsvSchema};
use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::Config;
use models::{Decision, RoundResult, RoundStatus};
use std::io::Read;
use std::path::PathBuf;
use tracker::{NewApplication, NewRound, RoundUpdate, TimelineFormat, Tracker};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

#[derive(Parser)]
#[command(name = "intel")]
#[command(about = "Interview intel - track applications, interview rounds, and job descriptions")]
struct Cli {
    /// Base directory holding one folder per company
    #[arg(long, global = true, env = "INTEL_HOME")]
    base: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track one company's application and interview rounds
    Track {
        #[command(subcommand)]
        command: TrackCommands,
    },

    /// Aggregate statistics across all companies
    Analytics {
        #[command(subcommand)]
        command: AnalyticsCommands,
    },

    /// Analyze a job description (reads stdin when no file is given)
    Keywords {
        /// Path to job description text
        file: Option<PathBuf>,
    },
}

/// Which company folder a tracking command operates on.
#[derive(Args)]
struct Target {
    /// Path to the company folder
    #[arg(long)]
    company_path: Option<PathBuf>,

    /// Company folder name under the base directory
    #[arg(long, conflicts_with = "company_path")]
    company: Option<String>,
}

impl Target {
    fn resolve(&self, config: &Config) -> Result<PathBuf> {
        if let Some(path) = &self.company_path {
            return Ok(path.clone());
        }
        match &self.company {
            Some(name) => Ok(config.company_dir(name)),
            None => Err(anyhow!("Specify --company-path or --company")),
        }
    }
}

#[derive(Subcommand)]
enum TrackCommands {
    /// Start tracking an application
    Init {
        /// Path to the company folder (defaults to <base>/<company>)
        #[arg(long)]
        company_path: Option<PathBuf>,

        /// Company name, also the folder name under the base directory
        #[arg(long)]
        company: String,

        /// Role title
        #[arg(long)]
        role: String,

        /// Resume version used for the application
        #[arg(long)]
        resume: String,

        /// Path to the job description file
        #[arg(long)]
        jd: Option<String>,

        /// How the application was submitted
        #[arg(long)]
        method: Option<String>,

        /// Application date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Add a timeline event
    Event {
        #[command(flatten)]
        target: Target,

        #[arg(long)]
        date: NaiveDate,

        /// Event label
        #[arg(long)]
        event: String,

        /// Status tag
        #[arg(long)]
        status: String,
    },

    /// Schedule an interview round
    AddRound {
        #[command(flatten)]
        target: Target,

        /// Round number
        #[arg(long)]
        round: u32,

        /// Round name (e.g. "Phone Screen")
        #[arg(long)]
        name: String,

        #[arg(long)]
        date: NaiveDate,

        #[arg(long, default_value = "")]
        time: String,

        /// Expected duration in minutes
        #[arg(long, default_value = "0")]
        duration: u32,

        /// Format (video, phone, in-person)
        #[arg(long, default_value = "video")]
        format: String,

        /// Platform (Zoom, Teams, ...)
        #[arg(long, default_value = "")]
        platform: String,

        #[arg(long, default_value = "")]
        interviewer: String,

        /// Interviewer's title
        #[arg(long, default_value = "")]
        title: String,

        /// Comma-separated focus areas
        #[arg(long, value_delimiter = ',')]
        focus: Vec<String>,
    },

    /// Record the outcome of a round
    Update {
        #[command(flatten)]
        target: Target,

        #[arg(long)]
        round: u32,

        #[arg(long)]
        status: Option<RoundStatus>,

        #[arg(long)]
        result: Option<RoundResult>,

        /// Difficulty rating (1-5)
        #[arg(long)]
        difficulty: Option<u8>,

        /// Confidence rating (1-5)
        #[arg(long)]
        confidence: Option<u8>,

        /// Comma-separated positive feedback
        #[arg(long, value_delimiter = ',')]
        positive: Option<Vec<String>>,

        /// Comma-separated areas to improve
        #[arg(long, value_delimiter = ',')]
        improve: Option<Vec<String>>,

        #[arg(long)]
        questions_asked: Option<u32>,

        #[arg(long)]
        answered_well: Option<u32>,
    },

    /// Record follow-up actions for a round
    FollowUp {
        #[command(flatten)]
        target: Target,

        #[arg(long)]
        round: u32,

        /// Thank-you note sent
        #[arg(long)]
        sent: bool,

        /// Date the thank-you note was sent
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Comma-separated connections made
        #[arg(long, value_delimiter = ',')]
        connections: Option<Vec<String>>,
    },

    /// Record the final decision
    Decision {
        #[command(flatten)]
        target: Target,

        decision: Decision,

        /// Decision date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Offer details as a JSON object
        #[arg(long)]
        offer: Option<String>,
    },

    /// Show current status
    Status {
        #[command(flatten)]
        target: Target,
    },

    /// Show the timeline
    Timeline {
        #[command(flatten)]
        target: Target,

        #[arg(long, value_enum, default_value = "text")]
        format: TimelineFormat,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scope {
    Global,
    Company,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Csv,
}

#[derive(Subcommand)]
enum AnalyticsCommands {
    /// Generate statistics
    Generate {
        #[arg(long, value_enum, default_value = "global")]
        scope: Scope,

        /// Company folder name (required for --scope company)
        #[arg(long)]
        company: Option<String>,
    },

    /// Export all interview rounds as a flat table
    Export {
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// File name under .analytics/exports
        #[arg(long, default_value = "interview_data.csv")]
        output: String,

        /// Header columns: first-row (legacy) or union of all rows
        #[arg(long, value_enum, default_value = "first-row")]
        schema: CsvSchema,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "intel=debug" } else { "intel=warn" };
    Registry::default()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::resolve(cli.base);

    match cli.command {
        Commands::Track { command } => run_track(&config, command),
        Commands::Analytics { command } => run_analytics(&config, command),
        Commands::Keywords { file } => run_keywords(file),
    }
}

fn run_track(config: &Config, command: TrackCommands) -> Result<()> {
    match command {
        TrackCommands::Init {
            company_path,
            company,
            role,
            resume,
            jd,
            method,
            date,
        } => {
            let dir = company_path.unwrap_or_else(|| config.company_dir(&company));
            let mut tracker = Tracker::open(&dir)?;
            let doc = tracker.init(NewApplication {
                company,
                role,
                resume_version: resume,
                jd_file: jd,
                application_method: method,
                application_date: date,
            })?;
            let app = &doc.application;
            println!("Initialized tracking for {}", app.company);
            println!("Role: {}", app.role);
            println!("Resume version: {}", app.resume_version_used);
            if let Some(date) = app.application_date {
                println!("Application date: {}", date);
            }
            println!("Tracking file: {}", tracker.path().display());
        }

        TrackCommands::Event {
            target,
            date,
            event,
            status,
        } => {
            let mut tracker = Tracker::open(&target.resolve(config)?)?;
            tracker.add_timeline_event(date, &event, &status)?;
            println!("Added event: {} - {}", date, event);
        }

        TrackCommands::AddRound {
            target,
            round,
            name,
            date,
            time,
            duration,
            format,
            platform,
            interviewer,
            title,
            focus,
        } => {
            let mut tracker = Tracker::open(&target.resolve(config)?)?;
            let added = tracker.add_round(NewRound {
                round,
                name,
                date,
                time,
                duration_minutes: duration,
                format,
                platform,
                interviewer_name: interviewer,
                interviewer_title: title,
                focus_areas: focus.into_iter().map(|f| f.trim().to_string()).collect(),
            })?;
            println!("Added Round {}: {}", added.round, added.round_name);
            println!("Date: {}", added.date);
            println!("Format: {}", added.format);
        }

        TrackCommands::Update {
            target,
            round,
            status,
            result,
            difficulty,
            confidence,
            positive,
            improve,
            questions_asked,
            answered_well,
        } => {
            let mut tracker = Tracker::open(&target.resolve(config)?)?;
            tracker.update_round(
                round,
                RoundUpdate {
                    status,
                    result,
                    difficulty,
                    confidence,
                    positive_feedback: positive,
                    improvement_areas: improve,
                    questions_asked,
                    questions_answered_well: answered_well,
                },
            )?;
            println!("Updated Round {}", round);
            if let Some(result) = result {
                println!("Result: {}", result);
            }
        }

        TrackCommands::FollowUp {
            target,
            round,
            sent,
            date,
            connections,
        } => {
            let mut tracker = Tracker::open(&target.resolve(config)?)?;
            tracker.update_follow_up(round, sent, date, connections)?;
            println!("Updated follow-up for Round {}", round);
        }

        TrackCommands::Decision {
            target,
            decision,
            date,
            offer,
        } => {
            let offer_details = offer
                .map(|raw| serde_json::from_str::<serde_json::Value>(&raw).context("--offer must be valid JSON"))
                .transpose()?;
            let mut tracker = Tracker::open(&target.resolve(config)?)?;
            tracker.update_decision(decision, date, offer_details)?;
            println!("Recorded decision: {}", decision.as_str().to_uppercase());
        }

        TrackCommands::Status { target } => {
            let tracker = Tracker::open(&target.resolve(config)?)?;
            let status = tracker.status()?;
            println!("\nStatus for {} - {}\n", status.company, status.role);
            println!("Overall Status: {}", status.overall_status.to_uppercase());
            println!("Current Stage: {}", status.current_stage);
            println!("Total Rounds: {}", status.total_rounds);
            println!("Completed: {}", status.rounds_completed);
            println!("Pass Rate: {}", percent(status.pass_rate, 0));
            if let Some(decision) = status.decision {
                println!("Decision: {}", decision.as_str().to_uppercase());
            }
        }

        TrackCommands::Timeline { target, format } => {
            let tracker = Tracker::open(&target.resolve(config)?)?;
            println!("{}", tracker.render_timeline(format)?);
        }
    }

    Ok(())
}

fn run_analytics(config: &Config, command: AnalyticsCommands) -> Result<()> {
    let analytics = Analytics::new(config.clone())?;

    match command {
        AnalyticsCommands::Generate {
            scope: Scope::Global,
            ..
        } => {
            let (stats, path) = analytics.generate_global_stats()?;
            let summary = &stats.summary;
            let perf = &stats.interview_performance;
            println!("\nGlobal Statistics Generated\n");
            println!("Total Applications: {}", summary.total_applications);
            println!("Response Rate: {}", percent(summary.response_rate, 1));
            println!("Interviews Completed: {}", summary.total_interviews_completed);
            println!("Interview Pass Rate: {}", percent(perf.pass_rate, 1));
            println!("Offers: {}", summary.total_offers);
            println!("Offer Rate: {}", percent(summary.offer_rate, 1));
            println!("Active Processes: {}", summary.active_processes);

            if !stats.by_resume_version.is_empty() {
                println!(
                    "\n{:<16} {:>6} {:>10} {:>11} {:>7}",
                    "RESUME", "APPS", "RESPONSES", "INTERVIEWS", "OFFERS"
                );
                println!("{}", "-".repeat(54));
                for (version, v) in &stats.by_resume_version {
                    println!(
                        "{:<16} {:>6} {:>10} {:>11} {:>7}",
                        truncate(version, 14),
                        v.applications,
                        v.responses,
                        v.interviews,
                        v.offers
                    );
                }
            }
            println!("\nSaved to {}", path.display());
        }

        AnalyticsCommands::Generate {
            scope: Scope::Company,
            company,
        } => {
            let Some(company) = company else {
                bail!("--company is required for --scope company");
            };
            let stats = analytics.company_stats(&company)?;
            println!("\nStatistics for {} - {}\n", stats.company, stats.role);
            println!("Status: {}", stats.overall_status.to_uppercase());
            println!("Total Rounds: {}", stats.total_rounds);
            println!("Completed: {}", stats.completed_rounds);
            println!("Pass Rate: {}", percent(stats.pass_rate, 0));

            if !stats.interviews.is_empty() {
                println!(
                    "\n{:<6} {:<24} {:<12} {:<11} {:<8} {:>4} {:>4}",
                    "ROUND", "NAME", "DATE", "STATUS", "RESULT", "DIFF", "CONF"
                );
                println!("{}", "-".repeat(75));
                for round in &stats.interviews {
                    println!(
                        "{:<6} {:<24} {:<12} {:<11} {:<8} {:>4} {:>4}",
                        round.round,
                        truncate(&round.name, 22),
                        round.date,
                        round.status,
                        round.result.as_deref().unwrap_or("-"),
                        round.difficulty,
                        round.confidence
                    );
                }
            }
        }

        AnalyticsCommands::Export {
            format: ExportFormat::Csv,
            output,
            schema,
        } => match analytics.export_csv(&output, schema)? {
            Some(path) => println!("Exported to {}", path.display()),
            None => println!("No data to export."),
        },
    }

    Ok(())
}

fn run_keywords(file: Option<PathBuf>) -> Result<()> {
    let text = match &file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job description: {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read job description from stdin")?;
            buf
        }
    };

    if text.trim().is_empty() {
        bail!("No input provided");
    }

    println!("{}", keywords::format_report(&keywords::analyze(&text)));
    Ok(())
}

fn percent(rate: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, rate * 100.0)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
