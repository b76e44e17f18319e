use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{self, Config};
use crate::error::AnalyticsError;
use crate::models::{Decision, RoundResult, TrackingDocument};
use crate::registry::ResumeRegistry;
use crate::tracker::load_document;

type Result<T> = std::result::Result<T, AnalyticsError>;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub total_companies_applied: usize,
    pub total_applications: usize,
    pub companies_with_response: usize,
    pub response_rate: f64,
    pub average_response_time_days: f64,
    pub total_interviews_scheduled: usize,
    pub total_interviews_completed: usize,
    pub total_offers: usize,
    pub offer_rate: f64,
    pub active_processes: usize,
    pub rejected: usize,
    pub withdrawn: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VersionStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub applications: usize,
    pub responses: usize,
    pub interviews: usize,
    pub offers: usize,
}

/// Only `applications` is computed; the other fields are placeholders.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PositionStats {
    pub applications: usize,
    pub average_rounds: f64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TimelineStats {
    pub first_application: Option<NaiveDate>,
    pub last_application: Option<NaiveDate>,
    pub duration_days: i64,
    pub applications_per_week: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InterviewPerformance {
    pub total_interviews: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
    pub average_difficulty: f64,
    pub average_confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GlobalStats {
    pub generated_at: String,
    pub summary: Summary,
    pub by_resume_version: BTreeMap<String, VersionStats>,
    pub by_position_type: BTreeMap<String, PositionStats>,
    pub timeline: TimelineStats,
    pub interview_performance: InterviewPerformance,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundSummary {
    pub round: u32,
    pub name: String,
    pub date: NaiveDate,
    pub status: String,
    pub result: Option<String>,
    pub difficulty: u8,
    pub confidence: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyStats {
    pub company: String,
    pub role: String,
    pub application_date: Option<NaiveDate>,
    pub resume_version: String,
    pub overall_status: String,
    pub current_stage: String,
    pub total_rounds: usize,
    pub completed_rounds: u32,
    pub pass_rate: f64,
    pub decision: Option<Decision>,
    pub timeline_events: usize,
    pub interviews: Vec<RoundSummary>,
}

/// Column set used when writing a ragged row list as CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CsvSchema {
    /// Header fixed from the first row; later extra columns are dropped.
    #[default]
    FirstRow,
    /// Header is the union of every row's columns, in first-seen order.
    Union,
}

/// One flattened export row: application fields, plus round fields when present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportRow(pub Vec<(&'static str, String)>);

impl ExportRow {
    fn push(&mut self, key: &'static str, value: impl ToString) {
        self.0.push((key, value.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|(k, _)| *k)
    }
}

/// Read-only aggregation over every company folder under a base directory.
pub struct Analytics {
    config: Config,
    registry: ResumeRegistry,
}

impl Analytics {
    pub fn new(config: Config) -> Result<Self> {
        let registry = ResumeRegistry::load(&config.resume_registry_path())?;
        Ok(Self { config, registry })
    }

    /// Immediate subfolders with an `interviews/` directory, sorted by name.
    fn company_folders(&self) -> Result<Vec<PathBuf>> {
        let base = self.config.base();
        let entries = fs::read_dir(base).map_err(|source| AnalyticsError::Io {
            path: base.to_path_buf(),
            source,
        })?;

        let mut folders = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| AnalyticsError::Io {
                path: base.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if !path.is_dir() || config::is_reserved(&name) {
                continue;
            }
            if path.join(config::INTERVIEWS_DIR).is_dir() {
                folders.push(path);
            } else {
                debug!(folder = %name, "skipping folder without interviews/");
            }
        }
        folders.sort();
        Ok(folders)
    }

    fn load_all(&self) -> Result<(usize, Vec<TrackingDocument>)> {
        let folders = self.company_folders()?;
        let mut docs = Vec::new();
        for folder in &folders {
            match load_document(&config::tracking_path(folder))? {
                Some(doc) => docs.push(doc),
                None => debug!(folder = %folder.display(), "no tracking document"),
            }
        }
        Ok((folders.len(), docs))
    }

    pub fn global_stats(&self) -> Result<GlobalStats> {
        let (folder_count, docs) = self.load_all()?;
        let mut stats = fold_global_stats(&docs, &self.registry);
        stats.summary.total_companies_applied = folder_count;
        Ok(stats)
    }

    /// Compute global stats and write them to `.analytics/global_stats.json`.
    pub fn generate_global_stats(&self) -> Result<(GlobalStats, PathBuf)> {
        let stats = self.global_stats()?;
        let dir = self.config.analytics_dir();
        fs::create_dir_all(&dir).map_err(|source| AnalyticsError::Io {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join("global_stats.json");
        let json = serde_json::to_string_pretty(&stats).map_err(|source| AnalyticsError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| AnalyticsError::Io {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), applications = stats.summary.total_applications, "wrote global stats");
        Ok((stats, path))
    }

    pub fn company_stats(&self, company: &str) -> Result<CompanyStats> {
        let dir = self.config.company_dir(company);
        match load_document(&config::tracking_path(&dir))? {
            Some(doc) => Ok(company_stats_of(&doc)),
            None => Err(AnalyticsError::NotFound {
                company: company.to_string(),
                suggestion: self.closest_company(company),
            }),
        }
    }

    fn closest_company(&self, company: &str) -> Option<String> {
        let folders = self.company_folders().ok()?;
        let wanted = company.to_lowercase();
        folders
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .map(|name| (strsim::jaro_winkler(&wanted, &name.to_lowercase()), name))
            .filter(|(score, _)| *score >= 0.8)
            .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(_, name)| name)
    }

    pub fn export_rows(&self) -> Result<Vec<ExportRow>> {
        let (_, docs) = self.load_all()?;
        Ok(docs.iter().flat_map(rows_for).collect())
    }

    /// Write every export row to `.analytics/exports/<file_name>`.
    /// Returns `None` when there is nothing to export.
    pub fn export_csv(&self, file_name: &str, schema: CsvSchema) -> Result<Option<PathBuf>> {
        let rows = self.export_rows()?;
        if rows.is_empty() {
            return Ok(None);
        }

        let dir = self.config.exports_dir();
        fs::create_dir_all(&dir).map_err(|source| AnalyticsError::Io {
            path: dir.clone(),
            source,
        })?;
        let path = dir.join(file_name);
        write_csv(&path, &rows, schema)?;
        info!(path = %path.display(), rows = rows.len(), "exported csv");
        Ok(Some(path))
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub fn fold_global_stats(docs: &[TrackingDocument], registry: &ResumeRegistry) -> GlobalStats {
    let mut summary = Summary::default();
    let mut performance = InterviewPerformance::default();
    let mut by_resume_version: BTreeMap<String, VersionStats> = BTreeMap::new();
    let mut by_position_type: BTreeMap<String, PositionStats> = BTreeMap::new();
    let mut app_dates: Vec<NaiveDate> = Vec::new();
    let (mut difficulty_sum, mut difficulty_count) = (0u32, 0usize);
    let (mut confidence_sum, mut confidence_count) = (0u32, 0usize);

    for doc in docs {
        summary.total_applications += 1;
        if let Some(date) = doc.application.application_date {
            app_dates.push(date);
        }

        let interviews = &doc.interviews;
        let responded = !interviews.is_empty();
        if responded {
            summary.companies_with_response += 1;
        }
        summary.total_interviews_scheduled += interviews.len();

        for round in interviews.iter().filter(|r| r.is_completed()) {
            summary.total_interviews_completed += 1;
            if round.difficulty > 0 {
                difficulty_sum += u32::from(round.difficulty);
                difficulty_count += 1;
            }
            if round.confidence > 0 {
                confidence_sum += u32::from(round.confidence);
                confidence_count += 1;
            }
            if round.has_result(RoundResult::Passed) {
                performance.passed += 1;
            } else if round.has_result(RoundResult::Failed) {
                performance.failed += 1;
            }
        }

        match doc.decision {
            Some(Decision::Offer) => summary.total_offers += 1,
            Some(Decision::Rejected) => summary.rejected += 1,
            Some(Decision::Withdrew) => summary.withdrawn += 1,
            None => summary.active_processes += 1,
        }

        let version = &doc.application.resume_version_used;
        let entry = by_resume_version.entry(version.clone()).or_insert_with(|| VersionStats {
            description: registry.resolve(version).map(|v| v.description.clone()),
            ..VersionStats::default()
        });
        entry.applications += 1;
        if responded {
            entry.responses += 1;
            entry.interviews += interviews.len();
        }
        if doc.decision == Some(Decision::Offer) {
            entry.offers += 1;
        }

        let role = if doc.application.role.is_empty() {
            "Unknown".to_string()
        } else {
            doc.application.role.clone()
        };
        by_position_type.entry(role).or_default().applications += 1;
    }

    summary.response_rate = ratio(summary.companies_with_response, summary.total_applications);
    summary.offer_rate = ratio(summary.total_offers, summary.total_applications);

    performance.total_interviews = summary.total_interviews_completed;
    performance.pass_rate = ratio(performance.passed, summary.total_interviews_completed);
    performance.average_difficulty = ratio(difficulty_sum as usize, difficulty_count);
    performance.average_confidence = ratio(confidence_sum as usize, confidence_count);

    GlobalStats {
        generated_at: Local::now().to_rfc3339(),
        summary,
        by_resume_version,
        by_position_type,
        timeline: timeline_stats(app_dates),
        interview_performance: performance,
    }
}

fn timeline_stats(mut dates: Vec<NaiveDate>) -> TimelineStats {
    dates.sort();
    let (Some(first), Some(last)) = (dates.first().copied(), dates.last().copied()) else {
        return TimelineStats::default();
    };

    let duration_days = (last - first).num_days();
    let applications_per_week = if duration_days > 0 {
        dates.len() as f64 / (duration_days as f64 / 7.0)
    } else {
        0.0
    };

    TimelineStats {
        first_application: Some(first),
        last_application: Some(last),
        duration_days,
        applications_per_week,
    }
}

pub fn company_stats_of(doc: &TrackingDocument) -> CompanyStats {
    CompanyStats {
        company: doc.application.company.clone(),
        role: doc.application.role.clone(),
        application_date: doc.application.application_date,
        resume_version: doc.application.resume_version_used.clone(),
        overall_status: doc.overall_status.clone(),
        current_stage: doc.current_stage.clone(),
        total_rounds: doc.interviews.len(),
        completed_rounds: doc.total_rounds_completed,
        pass_rate: doc.pass_rate,
        decision: doc.decision,
        timeline_events: doc.timeline.len(),
        interviews: doc
            .interviews
            .iter()
            .map(|r| RoundSummary {
                round: r.round,
                name: r.round_name.clone(),
                date: r.date,
                status: r.status.to_string(),
                result: r.result.as_ref().map(|v| v.to_string()),
                difficulty: r.difficulty,
                confidence: r.confidence,
            })
            .collect(),
    }
}

fn opt_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// One row per round; a document without rounds still yields one row.
pub fn rows_for(doc: &TrackingDocument) -> Vec<ExportRow> {
    let app = &doc.application;
    let mut base = ExportRow::default();
    base.push("company", &app.company);
    base.push("role", &app.role);
    base.push("application_date", opt_string(app.application_date));
    base.push("application_method", &app.application_method);
    base.push("resume_version", &app.resume_version_used);
    base.push("overall_status", &doc.overall_status);
    base.push("decision", opt_string(doc.decision));
    base.push("total_rounds", doc.interviews.len());
    base.push("completed_rounds", doc.total_rounds_completed);
    base.push("pass_rate", doc.pass_rate);

    if doc.interviews.is_empty() {
        return vec![base];
    }

    doc.interviews
        .iter()
        .map(|round| {
            let mut row = base.clone();
            row.push("round_number", round.round);
            row.push("round_name", &round.round_name);
            row.push("interview_date", round.date);
            row.push("interview_status", &round.status);
            row.push("interview_result", opt_string(round.result.as_ref()));
            row.push("difficulty", round.difficulty);
            row.push("confidence", round.confidence);
            row.push("interviewer", &round.interviewer.name);
            row
        })
        .collect()
}

pub fn csv_columns(rows: &[ExportRow], schema: CsvSchema) -> Vec<&'static str> {
    match schema {
        CsvSchema::FirstRow => rows.first().map(|r| r.keys().collect()).unwrap_or_default(),
        CsvSchema::Union => {
            let mut columns: Vec<&'static str> = Vec::new();
            for key in rows.iter().flat_map(|r| r.keys()) {
                if !columns.contains(&key) {
                    columns.push(key);
                }
            }
            columns
        }
    }
}

pub fn write_csv(path: &Path, rows: &[ExportRow], schema: CsvSchema) -> Result<()> {
    let columns = csv_columns(rows, schema);
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&columns)?;
    for row in rows {
        writer.write_record(columns.iter().map(|c| row.get(c).unwrap_or("")))?;
    }
    writer.flush().map_err(|source| AnalyticsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
