use serde::Serialize;
use serde_json::{json, Value};

use crate::media::EncodedMedia;
use crate::types::{IncidentType, RecommendedAction};

/// Fixed instruction sent with every clip
pub const ANALYSIS_PROMPT: &str = "You are an expert security AI system. Analyze this video footage. \
Identify any security incidents like robberies, medical emergencies, fights, or vandalism. \
For each incident, provide its timestamp, a description, classify its type, and recommend an action. \
If there are no incidents, return an empty 'incidents' array. \
Respond ONLY with a JSON object adhering to the provided schema.";

pub const RESPONSE_MIME_TYPE: &str = "application/json";

/// Body of a `generateContent` call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: Value,
}

/// Schema the delegate is asked to follow
///
/// The delegate is only instructed to honour it; `parser::parse_incidents`
/// enforces the same shape on the reply.
pub fn response_schema() -> Value {
    let incident_types: Vec<&str> = IncidentType::ALL.iter().map(|t| t.as_str()).collect();
    let actions: Vec<&str> = RecommendedAction::ALL.iter().map(|a| a.as_str()).collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "incidents": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "timestamp": {
                            "type": "STRING",
                            "description": "The approximate time in the video when the incident occurred (e.g., '00:45')."
                        },
                        "incidentType": {
                            "type": "STRING",
                            "enum": incident_types
                        },
                        "description": {
                            "type": "STRING",
                            "description": "A brief, clear description of the incident."
                        },
                        "recommendedAction": {
                            "type": "STRING",
                            "enum": actions
                        }
                    },
                    "required": ["timestamp", "incidentType", "description", "recommendedAction"]
                }
            }
        },
        "required": ["incidents"]
    })
}

/// Combine prompt, media and schema into one request
pub fn build_request(media: EncodedMedia) -> AnalysisRequest {
    AnalysisRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text {
                    text: ANALYSIS_PROMPT.to_string(),
                },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: media.mime_type,
                        data: media.data,
                    },
                },
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: RESPONSE_MIME_TYPE.to_string(),
            response_schema: response_schema(),
        },
    }
}
