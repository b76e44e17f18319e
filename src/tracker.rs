use chrono::{Local, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config;
use crate::error::TrackerError;
use crate::models::{
    ApplicationRecord, Decision, Feedback, FollowUp, InterviewRound, Interviewer, RoundResult,
    RoundStatus, StatusSummary, TimelineEvent, TrackingDocument,
};

type Result<T> = std::result::Result<T, TrackerError>;

/// Arguments for `Tracker::init`.
#[derive(Debug, Clone, Default)]
pub struct NewApplication {
    pub company: String,
    pub role: String,
    pub resume_version: String,
    pub jd_file: Option<String>,
    pub application_method: Option<String>,
    pub application_date: Option<NaiveDate>,
}

/// Arguments for `Tracker::add_round`.
#[derive(Debug, Clone)]
pub struct NewRound {
    pub round: u32,
    pub name: String,
    pub date: NaiveDate,
    pub time: String,
    pub duration_minutes: u32,
    pub format: String,
    pub platform: String,
    pub interviewer_name: String,
    pub interviewer_title: String,
    pub focus_areas: Vec<String>,
}

impl NewRound {
    #[cfg(test)]
    pub fn new(round: u32, name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            round,
            name: name.into(),
            date,
            time: String::new(),
            duration_minutes: 0,
            format: "video".to_string(),
            platform: String::new(),
            interviewer_name: String::new(),
            interviewer_title: String::new(),
            focus_areas: Vec::new(),
        }
    }
}

/// Partial update for a round. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct RoundUpdate {
    pub status: Option<RoundStatus>,
    pub result: Option<RoundResult>,
    pub difficulty: Option<u8>,
    pub confidence: Option<u8>,
    pub positive_feedback: Option<Vec<String>>,
    pub improvement_areas: Option<Vec<String>>,
    pub questions_asked: Option<u32>,
    pub questions_answered_well: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TimelineFormat {
    Text,
    Json,
}

/// Per-company tracking store backed by `interviews/tracking.json`.
///
/// Every mutation works on a copy of the document, persists it, and only
/// then replaces the in-memory state, so a failed call leaves both the file
/// and the tracker exactly as they were.
pub struct Tracker {
    path: PathBuf,
    doc: Option<TrackingDocument>,
}

impl Tracker {
    pub fn open(company_dir: &Path) -> Result<Self> {
        let path = config::tracking_path(company_dir);
        let doc = load_document(&path)?;
        debug!(path = %path.display(), initialized = doc.is_some(), "opened tracker");
        Ok(Self { path, doc })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    #[cfg(test)]
    pub fn document(&self) -> Option<&TrackingDocument> {
        self.doc.as_ref()
    }

    fn ensure_initialized(&self) -> Result<&TrackingDocument> {
        self.doc
            .as_ref()
            .ok_or_else(|| TrackerError::NotInitialized(self.path.clone()))
    }

    /// Apply `f` to a copy of the document, persist, then commit.
    fn mutate<T>(&mut self, f: impl FnOnce(&mut TrackingDocument) -> Result<T>) -> Result<T> {
        let mut doc = self.ensure_initialized()?.clone();
        let value = f(&mut doc)?;
        save_document(&self.path, &doc)?;
        self.doc = Some(doc);
        Ok(value)
    }

    pub fn init(&mut self, app: NewApplication) -> Result<&TrackingDocument> {
        if self.doc.is_some() {
            return Err(TrackerError::AlreadyInitialized(self.path.clone()));
        }

        let app_date = app.application_date.unwrap_or_else(today);
        let doc = TrackingDocument {
            application: ApplicationRecord {
                company: app.company,
                role: app.role,
                application_date: Some(app_date),
                application_method: app.application_method.unwrap_or_default(),
                referral: None,
                resume_version_used: app.resume_version,
                cover_letter: false,
                jd_file: app.jd_file.unwrap_or_default(),
            },
            timeline: vec![TimelineEvent {
                date: app_date,
                event: "Application Submitted".to_string(),
                status: "submitted".to_string(),
            }],
            interviews: Vec::new(),
            overall_status: "submitted".to_string(),
            current_stage: "application_submitted".to_string(),
            total_rounds_expected: 0,
            total_rounds_completed: 0,
            pass_rate: 0.0,
            decision: None,
            decision_date: None,
            offer_details: None,
        };

        save_document(&self.path, &doc)?;
        info!(company = %doc.application.company, role = %doc.application.role, "initialized tracking");
        Ok(&*self.doc.insert(doc))
    }

    pub fn add_timeline_event(&mut self, date: NaiveDate, event: &str, status: &str) -> Result<()> {
        self.mutate(|doc| {
            push_event(doc, date, event.to_string(), status);
            Ok(())
        })
    }

    pub fn add_round(&mut self, new: NewRound) -> Result<InterviewRound> {
        let round = self.mutate(|doc| {
            if doc.find_round(new.round).is_some() {
                return Err(TrackerError::DuplicateRound(new.round));
            }

            let round = InterviewRound {
                round: new.round,
                round_name: new.name,
                date: new.date,
                time: new.time,
                duration_minutes: new.duration_minutes,
                format: new.format,
                platform: new.platform,
                interviewer: Interviewer {
                    name: new.interviewer_name,
                    title: new.interviewer_title,
                    ..Interviewer::default()
                },
                focus_areas: new.focus_areas,
                status: RoundStatus::Scheduled.into(),
                result: None,
                difficulty: 0,
                confidence: 0,
                feedback: Feedback::default(),
                notes_file: format!("interviews/round_{}_notes.md", new.round),
                follow_up: FollowUp::default(),
            };

            if doc.decision.is_none() {
                doc.overall_status = "interviewing".to_string();
                doc.current_stage = format!("round_{}", round.round);
            }
            push_event(
                doc,
                round.date,
                format!("Round {}: {} scheduled", round.round, round.round_name),
                "scheduled",
            );
            doc.interviews.push(round.clone());
            Ok(round)
        })?;

        info!(round = round.round, name = %round.round_name, "added interview round");
        Ok(round)
    }

    pub fn update_round(&mut self, round_num: u32, update: RoundUpdate) -> Result<()> {
        validate_rating("difficulty", update.difficulty)?;
        validate_rating("confidence", update.confidence)?;

        self.mutate(|doc| {
            let round = doc
                .find_round_mut(round_num)
                .ok_or(TrackerError::RoundNotFound(round_num))?;

            if let Some(status) = update.status {
                round.status = status.into();
            }
            if let Some(result) = update.result {
                round.result = Some(result.into());
            }
            if let Some(difficulty) = update.difficulty {
                round.difficulty = difficulty;
            }
            if let Some(confidence) = update.confidence {
                round.confidence = confidence;
            }
            if let Some(positive) = update.positive_feedback {
                round.feedback.positive = positive;
            }
            if let Some(areas) = update.improvement_areas {
                round.feedback.areas_to_improve = areas;
            }
            if let Some(asked) = update.questions_asked {
                round.feedback.questions_asked = asked;
            }
            if let Some(well) = update.questions_answered_well {
                round.feedback.questions_answered_well = well;
            }

            doc.recompute_stats();

            if let (Some(RoundStatus::Completed), Some(result)) = (update.status, update.result) {
                push_event(
                    doc,
                    today(),
                    format!("Round {} completed - {}", round_num, result),
                    result.as_str(),
                );
            }
            Ok(())
        })?;

        debug!(round = round_num, "updated interview round");
        Ok(())
    }

    pub fn update_follow_up(
        &mut self,
        round_num: u32,
        thank_you_sent: bool,
        thank_you_date: Option<NaiveDate>,
        connections: Option<Vec<String>>,
    ) -> Result<()> {
        self.mutate(|doc| {
            let round = doc
                .find_round_mut(round_num)
                .ok_or(TrackerError::RoundNotFound(round_num))?;

            round.follow_up.thank_you_sent = thank_you_sent;
            if let Some(date) = thank_you_date {
                round.follow_up.thank_you_date = Some(date);
            }
            if let Some(connections) = connections {
                round.follow_up.connections_made = connections;
            }
            Ok(())
        })
    }

    pub fn update_decision(
        &mut self,
        decision: Decision,
        decision_date: Option<NaiveDate>,
        offer_details: Option<serde_json::Value>,
    ) -> Result<()> {
        self.mutate(|doc| {
            let date = decision_date.unwrap_or_else(today);
            doc.decision = Some(decision);
            doc.decision_date = Some(date);
            doc.overall_status = decision.as_str().to_string();
            if offer_details.is_some() {
                doc.offer_details = offer_details;
            }
            push_event(doc, date, format!("Decision: {}", decision), decision.as_str());
            Ok(())
        })?;

        info!(decision = %decision, "recorded decision");
        Ok(())
    }

    pub fn status(&self) -> Result<StatusSummary> {
        let doc = self.ensure_initialized()?;
        Ok(status_of(doc))
    }

    pub fn render_timeline(&self, format: TimelineFormat) -> Result<String> {
        let doc = self.ensure_initialized()?;
        match format {
            TimelineFormat::Json => serde_json::to_string_pretty(&doc.timeline).map_err(|source| {
                TrackerError::Json {
                    path: self.path.clone(),
                    source,
                }
            }),
            TimelineFormat::Text => Ok(render_timeline_text(doc)),
        }
    }
}

pub fn status_of(doc: &TrackingDocument) -> StatusSummary {
    StatusSummary {
        company: doc.application.company.clone(),
        role: doc.application.role.clone(),
        overall_status: doc.overall_status.clone(),
        current_stage: doc.current_stage.clone(),
        total_rounds: doc.interviews.len(),
        rounds_completed: doc.total_rounds_completed,
        pass_rate: doc.pass_rate,
        decision: doc.decision,
    }
}

fn render_timeline_text(doc: &TrackingDocument) -> String {
    let rule = "=".repeat(60);
    let mut out = String::new();

    out.push_str(&format!("\n📅 Interview Timeline - {}\n\n", doc.application.company));
    out.push_str(&rule);
    out.push('\n');
    for event in &doc.timeline {
        out.push_str(&format!(
            "\n{} {} - {}\n",
            status_icon(&event.status),
            event.date,
            event.event
        ));
    }
    out.push('\n');
    out.push_str(&rule);
    out.push_str(&format!(
        "\n\nCurrent Status: {}",
        doc.overall_status.to_uppercase()
    ));
    out
}

fn status_icon(status: &str) -> &'static str {
    match status {
        "submitted" => "📤",
        "scheduled" => "📆",
        "completed" | "passed" => "✅",
        "failed" | "rejected" => "❌",
        "offer" => "🎉",
        _ => "📌",
    }
}

fn push_event(doc: &mut TrackingDocument, date: NaiveDate, event: String, status: &str) {
    doc.timeline.push(TimelineEvent {
        date,
        event,
        status: status.to_string(),
    });
}

fn validate_rating(field: &'static str, value: Option<u8>) -> Result<()> {
    match value {
        Some(v) if v > 5 => Err(TrackerError::InvalidRating { field, value: v }),
        _ => Ok(()),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn load_document(path: &Path) -> Result<Option<TrackingDocument>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| TrackerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = serde_json::from_str(&content).map_err(|source| TrackerError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(doc))
}

/// Write the document to a sibling temp file, then rename it into place.
fn save_document(path: &Path, doc: &TrackingDocument) -> Result<()> {
    let io_err = |source| TrackerError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(doc).map_err(|source| TrackerError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json).map_err(io_err)?;
    fs::rename(&tmp_path, path).map_err(io_err)?;
    debug!(path = %path.display(), "saved tracking document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OpenValue;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn init_tracker(dir: &TempDir) -> Tracker {
        let mut tracker = Tracker::open(dir.path()).unwrap();
        tracker
            .init(NewApplication {
                company: "Acme".to_string(),
                role: "Backend Engineer".to_string(),
                resume_version: "v2.0".to_string(),
                application_date: Some(date("2026-01-10")),
                ..NewApplication::default()
            })
            .unwrap();
        tracker
    }

    fn complete(tracker: &mut Tracker, round: u32, result: RoundResult) {
        tracker
            .update_round(
                round,
                RoundUpdate {
                    status: Some(RoundStatus::Completed),
                    result: Some(result),
                    ..RoundUpdate::default()
                },
            )
            .unwrap();
    }

    #[test]
    fn test_init_creates_seed_event() {
        let dir = TempDir::new().unwrap();
        let tracker = init_tracker(&dir);
        let doc = tracker.document().unwrap();

        assert_eq!(doc.timeline.len(), 1);
        assert_eq!(doc.timeline[0].event, "Application Submitted");
        assert_eq!(doc.timeline[0].status, "submitted");
        assert_eq!(doc.overall_status, "submitted");
        assert!(tracker.path().exists());
    }

    #[test]
    fn test_double_init_fails_and_keeps_document() {
        let dir = TempDir::new().unwrap();
        let tracker = init_tracker(&dir);
        let before = fs::read_to_string(tracker.path()).unwrap();

        let mut again = Tracker::open(dir.path()).unwrap();
        let err = again
            .init(NewApplication {
                company: "Other".to_string(),
                ..NewApplication::default()
            })
            .unwrap_err();
        assert!(matches!(err, TrackerError::AlreadyInitialized(_)));
        assert_eq!(fs::read_to_string(tracker.path()).unwrap(), before);
    }

    #[test]
    fn test_mutation_before_init_fails() {
        let dir = TempDir::new().unwrap();
        let mut tracker = Tracker::open(dir.path()).unwrap();

        let err = tracker
            .add_round(NewRound::new(1, "Phone Screen", date("2026-01-20")))
            .unwrap_err();
        assert!(matches!(err, TrackerError::NotInitialized(_)));
        assert!(matches!(
            tracker.add_timeline_event(date("2026-01-20"), "Note", "note"),
            Err(TrackerError::NotInitialized(_))
        ));
        assert!(!tracker.path().exists());
    }

    #[test]
    fn test_add_round_appends_scheduled_event() {
        let dir = TempDir::new().unwrap();
        let mut tracker = init_tracker(&dir);

        let round = tracker
            .add_round(NewRound::new(1, "Phone Screen", date("2026-01-20")))
            .unwrap();
        assert!(round.status.is(RoundStatus::Scheduled));
        assert_eq!(round.notes_file, "interviews/round_1_notes.md");

        let doc = tracker.document().unwrap();
        assert_eq!(doc.overall_status, "interviewing");
        assert_eq!(doc.current_stage, "round_1");
        let last = doc.timeline.last().unwrap();
        assert_eq!(last.event, "Round 1: Phone Screen scheduled");
        assert_eq!(last.status, "scheduled");
        assert_eq!(last.date, date("2026-01-20"));
    }

    #[test]
    fn test_duplicate_round_rejected() {
        let dir = TempDir::new().unwrap();
        let mut tracker = init_tracker(&dir);
        tracker
            .add_round(NewRound::new(1, "Phone Screen", date("2026-01-20")))
            .unwrap();

        let err = tracker
            .add_round(NewRound::new(1, "Technical", date("2026-01-25")))
            .unwrap_err();
        assert!(matches!(err, TrackerError::DuplicateRound(1)));
        assert_eq!(tracker.document().unwrap().interviews.len(), 1);
    }

    #[test]
    fn test_pass_rate_tracks_completed_rounds() {
        let dir = TempDir::new().unwrap();
        let mut tracker = init_tracker(&dir);
        for n in 1..=4 {
            tracker
                .add_round(NewRound::new(n, format!("Round {}", n), date("2026-01-20")))
                .unwrap();
        }
        assert_eq!(tracker.document().unwrap().pass_rate, 0.0);

        complete(&mut tracker, 1, RoundResult::Passed);
        complete(&mut tracker, 2, RoundResult::Failed);
        complete(&mut tracker, 3, RoundResult::Passed);

        let doc = tracker.document().unwrap();
        assert_eq!(doc.total_rounds_completed, 3);
        assert!((doc.pass_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(doc.timeline.last().unwrap().event, "Round 3 completed - passed");
    }

    #[test]
    fn test_partial_update_leaves_other_fields() {
        let dir = TempDir::new().unwrap();
        let mut tracker = init_tracker(&dir);
        tracker
            .add_round(NewRound::new(1, "Phone Screen", date("2026-01-20")))
            .unwrap();
        tracker
            .update_round(
                1,
                RoundUpdate {
                    difficulty: Some(4),
                    positive_feedback: Some(vec!["clear communication".to_string()]),
                    ..RoundUpdate::default()
                },
            )
            .unwrap();
        let events_before = tracker.document().unwrap().timeline.len();

        tracker
            .update_round(
                1,
                RoundUpdate {
                    confidence: Some(3),
                    ..RoundUpdate::default()
                },
            )
            .unwrap();

        let doc = tracker.document().unwrap();
        let round = doc.find_round(1).unwrap();
        assert_eq!(round.difficulty, 4);
        assert_eq!(round.confidence, 3);
        assert_eq!(round.feedback.positive, vec!["clear communication".to_string()]);
        assert!(round.status.is(RoundStatus::Scheduled));
        assert_eq!(doc.timeline.len(), events_before);
    }

    #[test]
    fn test_update_unknown_round_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut tracker = init_tracker(&dir);
        tracker
            .add_round(NewRound::new(1, "Phone Screen", date("2026-01-20")))
            .unwrap();
        let before = tracker.document().unwrap().clone();

        let err = tracker
            .update_round(
                7,
                RoundUpdate {
                    status: Some(RoundStatus::Completed),
                    result: Some(RoundResult::Passed),
                    ..RoundUpdate::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, TrackerError::RoundNotFound(7)));
        assert_eq!(tracker.document().unwrap(), &before);

        let reloaded = Tracker::open(dir.path()).unwrap();
        assert_eq!(reloaded.document().unwrap(), &before);
    }

    #[test]
    fn test_invalid_rating_rejected() {
        let dir = TempDir::new().unwrap();
        let mut tracker = init_tracker(&dir);
        tracker
            .add_round(NewRound::new(1, "Phone Screen", date("2026-01-20")))
            .unwrap();

        let err = tracker
            .update_round(
                1,
                RoundUpdate {
                    difficulty: Some(9),
                    ..RoundUpdate::default()
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            TrackerError::InvalidRating { field: "difficulty", value: 9 }
        ));
    }

    #[test]
    fn test_follow_up_unknown_round_fails() {
        let dir = TempDir::new().unwrap();
        let mut tracker = init_tracker(&dir);
        tracker
            .add_round(NewRound::new(1, "Phone Screen", date("2026-01-20")))
            .unwrap();

        assert!(matches!(
            tracker.update_follow_up(2, true, None, None),
            Err(TrackerError::RoundNotFound(2))
        ));

        tracker
            .update_follow_up(1, true, Some(date("2026-01-21")), Some(vec!["Jane".to_string()]))
            .unwrap();
        let follow_up = &tracker.document().unwrap().find_round(1).unwrap().follow_up;
        assert!(follow_up.thank_you_sent);
        assert_eq!(follow_up.thank_you_date, Some(date("2026-01-21")));
        assert_eq!(follow_up.connections_made, vec!["Jane".to_string()]);
    }

    #[test]
    fn test_decision_mirrors_overall_status() {
        let dir = TempDir::new().unwrap();
        let mut tracker = init_tracker(&dir);
        tracker
            .update_decision(
                Decision::Offer,
                Some(date("2026-02-01")),
                Some(serde_json::json!({"base": 180000})),
            )
            .unwrap();

        let doc = tracker.document().unwrap();
        assert_eq!(doc.overall_status, "offer");
        assert_eq!(doc.decision, Some(Decision::Offer));
        assert_eq!(doc.decision_date, Some(date("2026-02-01")));
        assert_eq!(doc.offer_details, Some(serde_json::json!({"base": 180000})));
        assert_eq!(doc.timeline.last().unwrap().event, "Decision: offer");

        let status = tracker.status().unwrap();
        assert_eq!(status.decision, Some(Decision::Offer));
        assert_eq!(status.company, "Acme");
    }

    #[test]
    fn test_round_trip_preserves_non_ascii() {
        let dir = TempDir::new().unwrap();
        let mut tracker = Tracker::open(dir.path()).unwrap();
        tracker
            .init(NewApplication {
                company: "Zürich Café".to_string(),
                role: "Ingénieur".to_string(),
                resume_version: "v1".to_string(),
                ..NewApplication::default()
            })
            .unwrap();
        tracker
            .add_round(NewRound::new(1, "Entretien téléphonique", date("2026-01-20")))
            .unwrap();
        complete(&mut tracker, 1, RoundResult::Passed);

        let raw = fs::read_to_string(tracker.path()).unwrap();
        assert!(raw.contains("Zürich Café"));

        let reloaded = Tracker::open(dir.path()).unwrap();
        assert_eq!(reloaded.document(), tracker.document());
    }

    #[test]
    fn test_render_timeline() {
        let dir = TempDir::new().unwrap();
        let mut tracker = init_tracker(&dir);
        tracker
            .add_round(NewRound::new(1, "Phone Screen", date("2026-01-20")))
            .unwrap();

        let text = tracker.render_timeline(TimelineFormat::Text).unwrap();
        assert!(text.contains("Interview Timeline - Acme"));
        assert!(text.contains("📤 2026-01-10 - Application Submitted"));
        assert!(text.contains("📆 2026-01-20 - Round 1: Phone Screen scheduled"));
        assert!(text.ends_with("Current Status: INTERVIEWING"));

        let json = tracker.render_timeline(TimelineFormat::Json).unwrap();
        let events: Vec<TimelineEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_unknown_round_status_survives_update() {
        let dir = TempDir::new().unwrap();
        let mut tracker = init_tracker(&dir);
        tracker
            .add_round(NewRound::new(1, "Phone Screen", date("2026-01-20")))
            .unwrap();

        // Hand-edited value outside the known set.
        let raw = fs::read_to_string(tracker.path()).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        value["interviews"][0]["status"] = "no-show".into();
        value["interviews"][0]["result"] = "inconclusive".into();
        fs::write(tracker.path(), serde_json::to_string_pretty(&value).unwrap()).unwrap();

        let mut tracker = Tracker::open(dir.path()).unwrap();
        let round = tracker.document().unwrap().find_round(1).unwrap();
        assert_eq!(round.status, OpenValue::Other("no-show".to_string()));
        assert_eq!(round.status.to_string(), "no-show");
        assert!(!round.is_completed());

        tracker
            .update_round(
                1,
                RoundUpdate {
                    confidence: Some(2),
                    ..RoundUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(tracker.document().unwrap().total_rounds_completed, 0);

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(tracker.path()).unwrap()).unwrap();
        assert_eq!(saved["interviews"][0]["status"], "no-show");
        assert_eq!(saved["interviews"][0]["result"], "inconclusive");
        assert_eq!(saved["interviews"][0]["confidence"], 2);
    }
}
