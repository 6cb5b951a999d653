// Incident triage for security footage
// Sends a clip to a multimodal model, validates the incidents it reports and
// raises at most one blocking alert per analysis.

pub mod config;
pub mod error;
pub mod inference;
pub mod media;
pub mod parser;
pub mod pipeline;
pub mod relay;
pub mod report;
pub mod request;
pub mod server;
pub mod session;
pub mod triage;
pub mod types;

#[cfg(test)]
mod test_support;

pub use error::{FormatViolation, InferenceFailure, TriageError, TriageResult};
pub use inference::{GeminiClient, InferenceClient};
pub use media::{EncodedMedia, VideoSource};
pub use pipeline::Analyzer;
pub use session::{AnalysisTicket, Completion, Session, SessionSnapshot, SharedSession};
pub use types::{AnalysisStatus, IncidentReport, IncidentType, RecommendedAction};
