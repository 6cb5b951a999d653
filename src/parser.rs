use serde_json::Value;

use crate::error::{FormatViolation, TriageResult};
use crate::types::{AnalysisResult, IncidentReport};

/// Validate a raw delegate reply and turn it into incident reports.
///
/// The reply is untrusted: it must be an object holding only an
/// `incidents` array, and every element must match `IncidentReport`
/// exactly. One bad element rejects the whole batch. Order is kept as
/// received.
pub fn parse_incidents(raw: &str) -> TriageResult<AnalysisResult> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| FormatViolation::MalformedJson(e.to_string()))?;

    let object = value.as_object().ok_or(FormatViolation::NotAnObject)?;

    if let Some(extra) = object.keys().find(|k| k.as_str() != "incidents") {
        return Err(FormatViolation::UnexpectedField(extra.clone()).into());
    }

    let items = object
        .get("incidents")
        .ok_or(FormatViolation::MissingIncidents)?
        .as_array()
        .ok_or(FormatViolation::IncidentsNotArray)?;

    let incidents = items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_incident(index, item))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(incidents)
}

fn parse_incident(index: usize, item: &Value) -> Result<IncidentReport, FormatViolation> {
    let incident: IncidentReport =
        serde_json::from_value(item.clone()).map_err(|e| FormatViolation::Incident {
            index,
            reason: e.to_string(),
        })?;

    if incident.description.trim().is_empty() {
        return Err(FormatViolation::Incident {
            index,
            reason: "description is empty".to_string(),
        });
    }

    Ok(incident)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TriageError;
    use crate::types::{IncidentType, RecommendedAction};

    fn violation(raw: &str) -> FormatViolation {
        match parse_incidents(raw) {
            Err(TriageError::ResponseFormat(v)) => v,
            other => panic!("expected format violation, got {:?}", other),
        }
    }

    #[test]
    fn test_parses_in_received_order() {
        let raw = r#"
            {"incidents": [
                {"timestamp": "01:10", "incidentType": "Robbery",
                 "description": "Masked person takes cash drawer",
                 "recommendedAction": "Notify Authorities"},
                {"timestamp": "00:05", "incidentType": "None",
                 "description": "Customer browsing",
                 "recommendedAction": "Continue Monitoring"},
                {"timestamp": "01:10", "incidentType": "Robbery",
                 "description": "Masked person takes cash drawer",
                 "recommendedAction": "Notify Authorities"}
            ]}
        "#;

        let incidents = parse_incidents(raw).unwrap();
        assert_eq!(incidents.len(), 3);
        assert_eq!(incidents[0].timestamp, "01:10");
        assert_eq!(incidents[0].incident_type, IncidentType::Robbery);
        assert_eq!(incidents[1].timestamp, "00:05");
        assert_eq!(incidents[1].recommended_action, RecommendedAction::Monitor);
        assert_eq!(incidents[0], incidents[2]);
    }

    #[test]
    fn test_empty_incidents() {
        assert!(parse_incidents("  {\"incidents\": []}\n").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            violation("```json\n{\"incidents\": []}\n```"),
            FormatViolation::MalformedJson(_)
        ));
        assert!(matches!(violation(""), FormatViolation::MalformedJson(_)));
    }

    #[test]
    fn test_top_level_shape() {
        assert_eq!(violation("[]"), FormatViolation::NotAnObject);
        assert_eq!(violation("{}"), FormatViolation::MissingIncidents);
        assert_eq!(
            violation(r#"{"incidents": {}}"#),
            FormatViolation::IncidentsNotArray
        );
        assert_eq!(
            violation(r#"{"incidents": [], "summary": "quiet"}"#),
            FormatViolation::UnexpectedField("summary".to_string())
        );
    }

    #[test]
    fn test_missing_field_rejects_whole_batch() {
        let raw = r#"{"incidents": [
            {"timestamp": "00:01", "incidentType": "Fight",
             "description": "Two people shoving", "recommendedAction": "Notify Authorities"},
            {"timestamp": "00:09", "incidentType": "Vandalism",
             "recommendedAction": "Continue Monitoring"}
        ]}"#;

        match violation(raw) {
            FormatViolation::Incident { index, reason } => {
                assert_eq!(index, 1);
                assert!(reason.contains("description"));
            }
            other => panic!("unexpected violation {:?}", other),
        }
    }

    #[test]
    fn test_unknown_enum_value() {
        let raw = r#"{"incidents": [
            {"timestamp": "00:01", "incidentType": "Arson",
             "description": "Fire near door", "recommendedAction": "Notify Authorities"}
        ]}"#;
        assert!(matches!(violation(raw), FormatViolation::Incident { index: 0, .. }));

        let raw = r#"{"incidents": [
            {"timestamp": "00:01", "incidentType": "Other",
             "description": "Fire near door", "recommendedAction": "Call Fire Brigade"}
        ]}"#;
        assert!(matches!(violation(raw), FormatViolation::Incident { index: 0, .. }));
    }

    #[test]
    fn test_wrong_type_and_extra_field() {
        let raw = r#"{"incidents": [
            {"timestamp": 45, "incidentType": "Other",
             "description": "Loitering", "recommendedAction": "Continue Monitoring"}
        ]}"#;
        assert!(matches!(violation(raw), FormatViolation::Incident { index: 0, .. }));

        let raw = r#"{"incidents": [
            {"timestamp": "00:45", "incidentType": "Other", "confidence": 0.9,
             "description": "Loitering", "recommendedAction": "Continue Monitoring"}
        ]}"#;
        assert!(matches!(violation(raw), FormatViolation::Incident { index: 0, .. }));
    }

    #[test]
    fn test_blank_description() {
        let raw = r#"{"incidents": [
            {"timestamp": "00:45", "incidentType": "Other",
             "description": "   ", "recommendedAction": "None"}
        ]}"#;
        assert_eq!(
            violation(raw),
            FormatViolation::Incident {
                index: 0,
                reason: "description is empty".to_string()
            }
        );
    }
}
