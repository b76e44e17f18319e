use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub company: String,
    pub role: String,
    pub application_date: Option<NaiveDate>,
    #[serde(default)]
    pub application_method: String,
    #[serde(default)]
    pub referral: Option<String>,
    #[serde(default = "unknown_version")]
    pub resume_version_used: String,
    #[serde(default)]
    pub cover_letter: bool,
    #[serde(default)]
    pub jd_file: String,
}

fn unknown_version() -> String {
    "unknown".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub date: NaiveDate,
    pub event: String,
    pub status: String, // "submitted", "scheduled", "passed", "failed", or a decision
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Scheduled,
    Completed,
    Cancelled,
    Rescheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RoundResult {
    Passed,
    Failed,
    Pending,
}

/// A stored status or result: one of the known values, or any other string
/// written by hand or by older tools, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpenValue<T> {
    Known(T),
    Other(String),
}

impl<T: PartialEq> OpenValue<T> {
    pub fn is(&self, known: T) -> bool {
        matches!(self, OpenValue::Known(v) if *v == known)
    }
}

impl<T> From<T> for OpenValue<T> {
    fn from(value: T) -> Self {
        OpenValue::Known(value)
    }
}

impl<T: fmt::Display> fmt::Display for OpenValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenValue::Known(v) => v.fmt(f),
            OpenValue::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Offer,
    Rejected,
    #[serde(alias = "withdrawn")]
    #[value(alias = "withdrawn")]
    Withdrew,
}

impl RoundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundStatus::Scheduled => "scheduled",
            RoundStatus::Completed => "completed",
            RoundStatus::Cancelled => "cancelled",
            RoundStatus::Rescheduled => "rescheduled",
        }
    }
}

impl RoundResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundResult::Passed => "passed",
            RoundResult::Failed => "failed",
            RoundResult::Pending => "pending",
        }
    }
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Offer => "offer",
            Decision::Rejected => "rejected",
            Decision::Withdrew => "withdrew",
        }
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RoundResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interviewer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default)]
    pub positive: Vec<String>,
    #[serde(default)]
    pub areas_to_improve: Vec<String>,
    #[serde(default)]
    pub questions_asked: u32,
    #[serde(default)]
    pub questions_answered_well: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FollowUp {
    #[serde(default)]
    pub thank_you_sent: bool,
    #[serde(default)]
    pub thank_you_date: Option<NaiveDate>,
    #[serde(default)]
    pub connections_made: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewRound {
    pub round: u32,
    pub round_name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub format: String, // "video", "phone", "in-person"
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub interviewer: Interviewer,
    #[serde(default)]
    pub focus_areas: Vec<String>,
    pub status: OpenValue<RoundStatus>,
    #[serde(default)]
    pub result: Option<OpenValue<RoundResult>>,
    #[serde(default)]
    pub difficulty: u8, // 0 = unset, otherwise 1-5
    #[serde(default)]
    pub confidence: u8,
    #[serde(default)]
    pub feedback: Feedback,
    #[serde(default)]
    pub notes_file: String,
    #[serde(default)]
    pub follow_up: FollowUp,
}

impl InterviewRound {
    pub fn is_completed(&self) -> bool {
        self.status.is(RoundStatus::Completed)
    }

    pub fn has_result(&self, result: RoundResult) -> bool {
        self.result.as_ref().is_some_and(|r| r.is(result))
    }

    pub fn is_passed(&self) -> bool {
        self.is_completed() && self.has_result(RoundResult::Passed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingDocument {
    pub application: ApplicationRecord,
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
    #[serde(default)]
    pub interviews: Vec<InterviewRound>,
    pub overall_status: String, // "submitted", "interviewing", or the decision
    #[serde(default)]
    pub current_stage: String,
    #[serde(default)]
    pub total_rounds_expected: u32,
    #[serde(default)]
    pub total_rounds_completed: u32,
    #[serde(default)]
    pub pass_rate: f64,
    #[serde(default)]
    pub decision: Option<Decision>,
    #[serde(default)]
    pub decision_date: Option<NaiveDate>,
    #[serde(default)]
    pub offer_details: Option<serde_json::Value>,
}

impl TrackingDocument {
    /// First round with the given number, in insertion order.
    pub fn find_round(&self, round: u32) -> Option<&InterviewRound> {
        self.interviews.iter().find(|r| r.round == round)
    }

    pub fn find_round_mut(&mut self, round: u32) -> Option<&mut InterviewRound> {
        self.interviews.iter_mut().find(|r| r.round == round)
    }

    /// Recompute `total_rounds_completed` and `pass_rate` from the round list.
    pub fn recompute_stats(&mut self) {
        let completed = self.interviews.iter().filter(|r| r.is_completed()).count();
        let passed = self.interviews.iter().filter(|r| r.is_passed()).count();
        self.total_rounds_completed = completed as u32;
        self.pass_rate = if completed > 0 {
            passed as f64 / completed as f64
        } else {
            0.0
        };
    }
}

/// Read-only projection returned by `Tracker::status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub company: String,
    pub role: String,
    pub overall_status: String,
    pub current_stage: String,
    pub total_rounds: usize,
    pub rounds_completed: u32,
    pub pass_rate: f64,
    pub decision: Option<Decision>,
}
