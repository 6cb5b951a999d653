use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{TriageError, TriageResult};
use crate::types::IncidentReport;

/// Body accepted by the notification relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayMessage {
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
}

/// Relay reply on success
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayReceipt {
    pub success: bool,
    pub message: Option<String>,
    pub recipient: Option<String>,
    pub message_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RelayFailure {
    error: Option<String>,
}

/// Carriers with an email-to-SMS gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Carrier {
    Att,
    TMobile,
    Verizon,
    Sprint,
}

impl Carrier {
    pub fn gateway_domain(&self) -> &'static str {
        match self {
            Carrier::Att => "txt.att.net",
            Carrier::TMobile => "tmomail.net",
            Carrier::Verizon => "vtext.com",
            Carrier::Sprint => "messaging.sprintpcs.com",
        }
    }
}

impl FromStr for Carrier {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "att" => Ok(Carrier::Att),
            "tmobile" => Ok(Carrier::TMobile),
            "verizon" => Ok(Carrier::Verizon),
            "sprint" => Ok(Carrier::Sprint),
            other => Err(TriageError::Config(format!(
                "unsupported carrier '{}' (supported: att, tmobile, verizon, sprint)",
                other
            ))),
        }
    }
}

impl Display for Carrier {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let name = match self {
            Carrier::Att => "att",
            Carrier::TMobile => "tmobile",
            Carrier::Verizon => "verizon",
            Carrier::Sprint => "sprint",
        };
        f.write_str(name)
    }
}

/// Email address that delivers to `number` as an SMS
pub fn sms_gateway_address(number: &str, carrier: Carrier) -> TriageResult<String> {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(TriageError::Config(format!(
            "'{}' is not a phone number",
            number
        )));
    }
    Ok(format!("{}@{}", digits, carrier.gateway_domain()))
}

/// Relay message describing an incident
pub fn alert_message(to: &str, incident: &IncidentReport) -> RelayMessage {
    RelayMessage {
        to: to.to_string(),
        subject: Some("Alert".to_string()),
        message: format!(
            "{} - {} at {}: {}",
            incident.recommended_action,
            incident.incident_type,
            incident.timestamp,
            incident.description
        ),
    }
}

/// Client for the notification relay endpoint
///
/// Never called by triage itself; alerts are forwarded only on request.
pub struct RelayClient {
    client: reqwest::Client,
    url: String,
}

impl RelayClient {
    pub fn new(url: &str) -> TriageResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TriageError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(RelayClient {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn send(&self, message: &RelayMessage) -> TriageResult<RelayReceipt> {
        log::info!("Forwarding alert to {} via {}", message.to, self.url);

        let response = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TriageError::Relay("relay timed out".to_string())
                } else {
                    TriageError::Relay(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TriageError::Relay(format!("failed to read relay reply: {}", e)))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<RelayFailure>(&body)
                .ok()
                .and_then(|f| f.error)
                .unwrap_or(body);
            return Err(TriageError::Relay(format!(
                "HTTP {}: {}",
                status.as_u16(),
                detail
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| TriageError::Relay(format!("unreadable relay reply: {}", e)))
    }
}
