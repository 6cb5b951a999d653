use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Analysis lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// No analysis run for the current video
    Idle,
    /// Waiting on the delegate
    Analyzing,
    Success,
    Error,
}

/// Display tone for a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Neutral,
    Pending,
    Positive,
    Negative,
}

impl AnalysisStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisStatus::Idle => "Awaiting video file",
            AnalysisStatus::Analyzing => "Analyzing footage...",
            AnalysisStatus::Success => "Analysis Complete",
            AnalysisStatus::Error => "An error occurred during analysis",
        }
    }

    pub fn tone(&self) -> StatusTone {
        match self {
            AnalysisStatus::Idle => StatusTone::Neutral,
            AnalysisStatus::Analyzing => StatusTone::Pending,
            AnalysisStatus::Success => StatusTone::Positive,
            AnalysisStatus::Error => StatusTone::Negative,
        }
    }
}

impl Display for AnalysisStatus {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentType {
    #[serde(rename = "None")]
    None,
    #[serde(rename = "Robbery")]
    Robbery,
    #[serde(rename = "Medical Emergency")]
    MedicalEmergency,
    #[serde(rename = "Altercation/Fight")]
    Fight,
    #[serde(rename = "Vandalism")]
    Vandalism,
    #[serde(rename = "Other")]
    Other,
}

impl IncidentType {
    pub const ALL: [IncidentType; 6] = [
        IncidentType::None,
        IncidentType::Robbery,
        IncidentType::MedicalEmergency,
        IncidentType::Fight,
        IncidentType::Vandalism,
        IncidentType::Other,
    ];

    /// Wire value, as it appears in the response schema
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentType::None => "None",
            IncidentType::Robbery => "Robbery",
            IncidentType::MedicalEmergency => "Medical Emergency",
            IncidentType::Fight => "Altercation/Fight",
            IncidentType::Vandalism => "Vandalism",
            IncidentType::Other => "Other",
        }
    }
}

impl Display for IncidentType {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecommendedAction {
    #[serde(rename = "None")]
    None,
    #[serde(rename = "Notify Authorities")]
    NotifyAuthorities,
    #[serde(rename = "Notify Paramedics")]
    NotifyParamedics,
    #[serde(rename = "Continue Monitoring")]
    Monitor,
}

/// Icon shown next to an incident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponderIcon {
    Police,
    Paramedic,
    Caution,
}

/// Which responders a blocking alert is raised for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Authorities,
    Paramedics,
}

impl AlertKind {
    pub fn title(&self) -> &'static str {
        match self {
            AlertKind::Authorities => "AUTHORITIES ALERTED",
            AlertKind::Paramedics => "PARAMEDICS ALERTED",
        }
    }
}

impl RecommendedAction {
    pub const ALL: [RecommendedAction; 4] = [
        RecommendedAction::None,
        RecommendedAction::NotifyAuthorities,
        RecommendedAction::NotifyParamedics,
        RecommendedAction::Monitor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendedAction::None => "None",
            RecommendedAction::NotifyAuthorities => "Notify Authorities",
            RecommendedAction::NotifyParamedics => "Notify Paramedics",
            RecommendedAction::Monitor => "Continue Monitoring",
        }
    }

    /// Alert raised for this action, if it is critical
    pub fn alert_kind(&self) -> Option<AlertKind> {
        match self {
            RecommendedAction::NotifyAuthorities => Some(AlertKind::Authorities),
            RecommendedAction::NotifyParamedics => Some(AlertKind::Paramedics),
            RecommendedAction::None | RecommendedAction::Monitor => None,
        }
    }

    pub fn is_critical(&self) -> bool {
        self.alert_kind().is_some()
    }

    pub fn icon(&self) -> ResponderIcon {
        match self {
            RecommendedAction::NotifyAuthorities => ResponderIcon::Police,
            RecommendedAction::NotifyParamedics => ResponderIcon::Paramedic,
            RecommendedAction::None | RecommendedAction::Monitor => ResponderIcon::Caution,
        }
    }
}

impl Display for RecommendedAction {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One incident reported by the delegate, in the order it was returned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IncidentReport {
    pub timestamp: String, // free-form, e.g. "00:45"
    pub incident_type: IncidentType,
    pub description: String,
    pub recommended_action: RecommendedAction,
}

/// Incidents from one successful analysis
pub type AnalysisResult = Vec<IncidentReport>;
