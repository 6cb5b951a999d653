use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::{InferenceFailure, TriageResult};
use crate::inference::InferenceClient;
use crate::media::{self, VideoSource};
use crate::parser::parse_incidents;
use crate::request::build_request;
use crate::session::{AnalysisTicket, Completion, Session};
use crate::types::AnalysisResult;

/// Runs encode → build → call → parse for one analysis and applies the
/// outcome to the session it came from.
pub struct Analyzer {
    client: Arc<dyn InferenceClient>,
    timeout: Option<Duration>,
}

impl Analyzer {
    pub fn new(client: Arc<dyn InferenceClient>, timeout: Option<Duration>) -> Self {
        Analyzer { client, timeout }
    }

    /// Pipeline without any session bookkeeping
    pub async fn run(&self, source: &VideoSource) -> TriageResult<AnalysisResult> {
        let media = media::encode(source).await?;
        let request = build_request(media);

        let raw = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.client.generate(&request))
                .await
                .map_err(|_| InferenceFailure::Timeout)??,
            None => self.client.generate(&request).await?,
        };

        parse_incidents(&raw)
    }

    /// Start an analysis on `session` and drive it to completion.
    ///
    /// Fails only when the session refuses to start (no video, or one
    /// already in flight); pipeline failures end up as `AnalysisStatus::Error`.
    pub async fn analyze(&self, session: &Mutex<Session>) -> TriageResult<Completion> {
        let ticket = session.lock().await.begin_analysis()?;
        Ok(self.finish(session, ticket).await)
    }

    /// Run the pipeline for an already-issued ticket and hand the outcome back
    pub async fn finish(&self, session: &Mutex<Session>, ticket: AnalysisTicket) -> Completion {
        log::info!(
            "Analysis #{} started via {}: {} ({}, {} bytes)",
            ticket.generation,
            self.client.name(),
            ticket.source.file_name(),
            ticket.source.mime_type,
            ticket.source.size_bytes
        );

        let outcome = self.run(&ticket.source).await;
        match &outcome {
            Ok(incidents) => log::info!(
                "Analysis #{} returned {} incident(s)",
                ticket.generation,
                incidents.len()
            ),
            Err(e) => log::error!("Analysis #{} failed [{}]: {}", ticket.generation, e.kind(), e),
        }

        let mut session = session.lock().await;
        let completion = session.complete(&ticket, outcome);

        match completion {
            Completion::Stale => log::warn!(
                "Discarding stale result of analysis #{} (session is at #{})",
                ticket.generation,
                session.generation()
            ),
            Completion::Applied(_) => {
                if let Some(alert) = session.active_alert() {
                    log::warn!(
                        "{}: {} at {} ({})",
                        alert.title,
                        alert.incident.incident_type,
                        alert.incident.timestamp,
                        alert.incident.description
                    );
                }
            }
        }

        completion
    }
}
