use crate::session::Session;
use crate::types::{AnalysisStatus, IncidentReport, ResponderIcon, StatusTone};

fn icon_glyph(icon: ResponderIcon) -> &'static str {
    match icon {
        ResponderIcon::Police => "🚓",
        ResponderIcon::Paramedic => "🚑",
        ResponderIcon::Caution => "⚠️",
    }
}

fn tone_marker(tone: StatusTone) -> &'static str {
    match tone {
        StatusTone::Neutral => "·",
        StatusTone::Pending => "…",
        StatusTone::Positive => "✓",
        StatusTone::Negative => "✗",
    }
}

pub fn format_incident(incident: &IncidentReport) -> String {
    format!(
        "{} {} @{} - {} (Action: {})",
        icon_glyph(incident.recommended_action.icon()),
        incident.incident_type,
        incident.timestamp,
        incident.description,
        incident.recommended_action
    )
}

/// Plain-text rendering of a session for the terminal
pub fn render(session: &Session) -> String {
    let status = session.status();
    let mut out = format!("[{}] {}\n", tone_marker(status.tone()), status.label());

    if let Some(error) = session.last_error() {
        out.push_str(&format!("  {}: {}\n", error.kind, error.message));
    }

    if status == AnalysisStatus::Success {
        if session.incidents().is_empty() {
            out.push_str("  No incidents detected.\n");
        }
        for incident in session.incidents() {
            out.push_str(&format!("  {}\n", format_incident(incident)));
        }
    }

    if let Some(alert) = session.active_alert() {
        out.push_str(&format!(
            "\n!!! {} !!!\n{} detected at timestamp @{}.\n{}\n",
            alert.title,
            alert.incident.incident_type,
            alert.incident.timestamp,
            alert.incident.description
        ));
    }

    out
}
