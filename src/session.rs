use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{TriageError, TriageResult};
use crate::media::VideoSource;
use crate::triage::{self, Alert};
use crate::types::{AlertKind, AnalysisResult, AnalysisStatus, IncidentReport, StatusTone};

/// Session shared between the pipeline and its callers
pub type SharedSession = Arc<Mutex<Session>>;

/// Issued when an analysis starts; must be handed back to `Session::complete`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTicket {
    pub generation: u64,
    pub source: VideoSource,
}

/// What `Session::complete` did with a pipeline outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied(AnalysisStatus),
    /// The session moved on (new video or newer analysis) and the outcome was dropped
    Stale,
}

/// Kept for diagnostics after a failed analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: String,
    pub message: String,
}

impl From<&TriageError> for ErrorRecord {
    fn from(err: &TriageError) -> Self {
        ErrorRecord {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Owned copy of the active alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertSnapshot {
    pub index: usize,
    pub kind: AlertKind,
    pub title: String,
    pub incident: IncidentReport,
}

impl From<Alert<'_>> for AlertSnapshot {
    fn from(alert: Alert<'_>) -> Self {
        AlertSnapshot {
            index: alert.index,
            kind: alert.kind,
            title: alert.title.to_string(),
            incident: alert.incident.clone(),
        }
    }
}

/// Point-in-time view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub status: AnalysisStatus,
    pub label: &'static str,
    pub tone: StatusTone,
    pub source: Option<VideoSource>,
    pub incidents: Vec<IncidentReport>,
    pub alert: Option<AlertSnapshot>,
    pub generation: u64,
    pub last_error: Option<ErrorRecord>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Analysis session state machine
///
/// Holds the status, the incidents of the last successful analysis and
/// the active alert together, so every transition updates all three at once.
#[derive(Debug)]
pub struct Session {
    source: Option<VideoSource>,
    status: AnalysisStatus,
    incidents: AnalysisResult,
    active_alert: Option<usize>,
    generation: u64,
    last_error: Option<ErrorRecord>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create new session in Idle state
    pub fn new() -> Self {
        Session {
            source: None,
            status: AnalysisStatus::Idle,
            incidents: Vec::new(),
            active_alert: None,
            generation: 0,
            last_error: None,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn shared() -> SharedSession {
        Arc::new(Mutex::new(Session::new()))
    }

    pub fn status(&self) -> AnalysisStatus {
        self.status
    }

    pub fn incidents(&self) -> &[IncidentReport] {
        &self.incidents
    }

    pub fn source(&self) -> Option<&VideoSource> {
        self.source.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_error(&self) -> Option<&ErrorRecord> {
        self.last_error.as_ref()
    }

    pub fn is_analyzing(&self) -> bool {
        self.status == AnalysisStatus::Analyzing
    }

    pub fn active_alert(&self) -> Option<Alert<'_>> {
        self.active_alert
            .and_then(|index| triage::alert_at(&self.incidents, index))
    }

    /// Select a new source video (any state → Idle).
    ///
    /// Also invalidates any analysis still in flight. Returns the source it
    /// replaced, if any.
    pub fn select_video(&mut self, source: VideoSource) -> Option<VideoSource> {
        let previous = self.source.replace(source);
        self.generation += 1;
        self.reset(AnalysisStatus::Idle);
        self.started_at = None;
        previous
    }

    /// Transition to Analyzing (Idle | Success | Error → Analyzing)
    pub fn begin_analysis(&mut self) -> TriageResult<AnalysisTicket> {
        let source = match (&self.source, self.status) {
            (_, AnalysisStatus::Analyzing) => return Err(TriageError::AnalysisInFlight),
            (None, _) => return Err(TriageError::NoVideoSelected),
            (Some(source), AnalysisStatus::Idle)
            | (Some(source), AnalysisStatus::Success)
            | (Some(source), AnalysisStatus::Error) => source.clone(),
        };

        self.generation += 1;
        self.reset(AnalysisStatus::Analyzing);
        self.started_at = Some(Utc::now());

        Ok(AnalysisTicket {
            generation: self.generation,
            source,
        })
    }

    /// Apply the pipeline outcome for `ticket` (Analyzing → Success | Error).
    ///
    /// Outcomes for a ticket that no longer matches the session are dropped.
    pub fn complete(
        &mut self,
        ticket: &AnalysisTicket,
        outcome: TriageResult<AnalysisResult>,
    ) -> Completion {
        if self.status != AnalysisStatus::Analyzing || ticket.generation != self.generation {
            return Completion::Stale;
        }

        match outcome {
            Ok(incidents) => {
                self.active_alert = triage::select_alert(&incidents);
                self.incidents = incidents;
                self.status = AnalysisStatus::Success;
            }
            Err(err) => {
                self.reset(AnalysisStatus::Error);
                self.last_error = Some(ErrorRecord::from(&err));
            }
        }
        self.finished_at = Some(Utc::now());

        Completion::Applied(self.status)
    }

    /// Dismiss the active alert. Returns false if there was none.
    pub fn acknowledge_alert(&mut self) -> bool {
        self.active_alert.take().is_some()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            label: self.status.label(),
            tone: self.status.tone(),
            source: self.source.clone(),
            incidents: self.incidents.clone(),
            alert: self.active_alert().map(AlertSnapshot::from),
            generation: self.generation,
            last_error: self.last_error.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }

    fn reset(&mut self, status: AnalysisStatus) {
        self.status = status;
        self.incidents = Vec::new();
        self.active_alert = None;
        self.last_error = None;
        self.finished_at = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
