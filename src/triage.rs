use serde::Serialize;

use crate::types::{AlertKind, IncidentReport};

/// Blocking alert raised for one incident of the current result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert<'a> {
    pub index: usize,
    pub kind: AlertKind,
    pub title: &'static str,
    pub incident: &'a IncidentReport,
}

/// Index of the first incident that needs authorities or paramedics.
///
/// First match in received order, not a severity ranking.
pub fn select_alert(incidents: &[IncidentReport]) -> Option<usize> {
    incidents
        .iter()
        .position(|incident| incident.recommended_action.is_critical())
}

/// Build the alert view for `index`, if that incident is critical
pub fn alert_at(incidents: &[IncidentReport], index: usize) -> Option<Alert<'_>> {
    let incident = incidents.get(index)?;
    let kind = incident.recommended_action.alert_kind()?;
    Some(Alert {
        index,
        kind,
        title: kind.title(),
        incident,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IncidentType, RecommendedAction};

    fn incident(kind: IncidentType, action: RecommendedAction) -> IncidentReport {
        IncidentReport {
            timestamp: "00:00".to_string(),
            incident_type: kind,
            description: format!("{} seen", kind),
            recommended_action: action,
        }
    }

    #[test]
    fn test_first_critical_wins() {
        let incidents = vec![
            incident(IncidentType::Other, RecommendedAction::Monitor),
            incident(IncidentType::MedicalEmergency, RecommendedAction::NotifyParamedics),
            incident(IncidentType::Robbery, RecommendedAction::NotifyAuthorities),
        ];
        assert_eq!(select_alert(&incidents), Some(1));

        let alert = alert_at(&incidents, 1).unwrap();
        assert_eq!(alert.kind, AlertKind::Paramedics);
        assert_eq!(alert.title, "PARAMEDICS ALERTED");
    }

    #[test]
    fn test_monitor_does_not_block_later_robbery() {
        let incidents = vec![
            incident(IncidentType::Vandalism, RecommendedAction::Monitor),
            incident(IncidentType::None, RecommendedAction::None),
            incident(IncidentType::Robbery, RecommendedAction::NotifyAuthorities),
        ];
        assert_eq!(select_alert(&incidents), Some(2));
    }

    #[test]
    fn test_no_critical_incident() {
        assert_eq!(select_alert(&[]), None);
        let incidents = vec![incident(IncidentType::Fight, RecommendedAction::Monitor)];
        assert_eq!(select_alert(&incidents), None);
        assert!(alert_at(&incidents, 0).is_none());
        assert!(alert_at(&incidents, 5).is_none());
    }
}
