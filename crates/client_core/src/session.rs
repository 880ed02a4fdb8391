//! Lifecycle of one upload-and-analyze interaction.

use std::{fmt, sync::Arc};

use shared::{
    domain::{AnalysisRequest, SessionId, UploadCandidate},
    report::{AnalysisReport, AnalysisResult},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    error::{SessionError, INVALID_FILE_MESSAGE, NO_CANDIDATE_MESSAGE},
    export::ExportedReport,
    progress::{ProgressReporter, ProgressSchedule},
    AnalyzerBackend,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    FileSelected,
    Submitting,
    Succeeded,
    Failed,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::FileSelected => "file_selected",
            SessionState::Submitting => "submitting",
            SessionState::Succeeded => "succeeded",
            SessionState::Failed => "failed",
        }
    }

    fn accepts_selection(self) -> bool {
        matches!(
            self,
            SessionState::Idle | SessionState::FileSelected | SessionState::Failed
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub schedule: ProgressSchedule,
    /// Reject candidates above this size. `None` leaves size unchecked.
    pub max_upload_bytes: Option<u64>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            schedule: ProgressSchedule::default(),
            max_upload_bytes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub candidate_name: Option<String>,
    pub error: Option<String>,
    pub has_result: bool,
}

#[derive(Default)]
struct SessionInner {
    state: SessionState,
    candidate: Option<UploadCandidate>,
    report: Option<AnalysisReport>,
    error: Option<String>,
    generation: u64,
}

impl SessionInner {
    fn clear(&mut self) {
        self.state = SessionState::Idle;
        self.candidate = None;
        self.report = None;
        self.error = None;
    }
}

pub struct AnalysisSession {
    id: SessionId,
    backend: Arc<dyn AnalyzerBackend>,
    options: SessionOptions,
    progress: ProgressReporter,
    inner: Mutex<SessionInner>,
}

impl AnalysisSession {
    pub fn new(backend: Arc<dyn AnalyzerBackend>, options: SessionOptions) -> Self {
        Self {
            id: SessionId::new(),
            backend,
            options,
            progress: ProgressReporter::new(),
            inner: Mutex::new(SessionInner::default()),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn progress(&self) -> &ProgressReporter {
        &self.progress
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    pub async fn error(&self) -> Option<String> {
        self.inner.lock().await.error.clone()
    }

    pub async fn result(&self) -> Option<AnalysisResult> {
        let inner = self.inner.lock().await;
        inner.report.as_ref().map(|report| report.result().clone())
    }

    /// The stored result together with the document it was decoded from.
    pub async fn report(&self) -> Option<AnalysisReport> {
        self.inner.lock().await.report.clone()
    }

    pub async fn candidate_name(&self) -> Option<String> {
        let inner = self.inner.lock().await;
        inner.candidate.as_ref().map(|c| c.name().to_string())
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock().await;
        SessionSnapshot {
            state: inner.state,
            candidate_name: inner.candidate.as_ref().map(|c| c.name().to_string()),
            error: inner.error.clone(),
            has_result: inner.report.is_some(),
        }
    }

    /// Validates and stores the document to analyze, replacing any previous one.
    ///
    /// A rejected candidate leaves the session `Idle` with the rejection
    /// message as its error.
    pub async fn select_candidate(&self, candidate: UploadCandidate) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;
        let state = inner.state;
        if !state.accepts_selection() {
            return Err(SessionError::InvalidTransition {
                action: "select a document",
                state,
            });
        }

        if let Err(err) = self.validate(&candidate) {
            info!(session = %self.id, candidate = ?candidate, "rejected document");
            inner.candidate = None;
            inner.error = Some(err.user_message());
            inner.state = SessionState::Idle;
            return Err(err);
        }

        debug!(session = %self.id, candidate = ?candidate, "selected document");
        inner.candidate = Some(candidate);
        inner.error = None;
        inner.state = SessionState::FileSelected;
        Ok(())
    }

    fn validate(&self, candidate: &UploadCandidate) -> Result<(), SessionError> {
        if !candidate.is_pdf() {
            return Err(SessionError::Validation(INVALID_FILE_MESSAGE.to_string()));
        }
        if let Some(limit) = self.options.max_upload_bytes {
            if candidate.byte_size() > limit {
                return Err(SessionError::Validation(format!(
                    "File is too large ({} bytes); the limit is {limit} bytes",
                    candidate.byte_size()
                )));
            }
        }
        Ok(())
    }

    /// Sends the selected document to the analyzer and waits for the outcome.
    ///
    /// The backend call and the cosmetic progress schedule run side by side;
    /// the session leaves `Submitting` only after both have finished. A
    /// finished analysis stays until `reset`.
    pub async fn submit(&self) -> Result<AnalysisReport, SessionError> {
        let (request, generation) = {
            let mut inner = self.inner.lock().await;
            match inner.state {
                SessionState::Submitting => return Err(SessionError::AlreadySubmitting),
                SessionState::Succeeded => {
                    return Err(SessionError::InvalidTransition {
                        action: "submit",
                        state: SessionState::Succeeded,
                    })
                }
                _ => {}
            }
            let Some(candidate) = inner.candidate.clone() else {
                inner.error = Some(NO_CANDIDATE_MESSAGE.to_string());
                return Err(SessionError::NoCandidate);
            };
            inner.state = SessionState::Submitting;
            inner.report = None;
            inner.error = None;
            inner.generation += 1;
            (AnalysisRequest::new(candidate), inner.generation)
        };

        info!(
            session = %self.id,
            candidate = ?request.candidate(),
            "submitting document for analysis"
        );

        let schedule = &self.options.schedule;
        let epoch = self.progress.begin(schedule);
        let (outcome, ()) = tokio::join!(
            self.backend.analyze(request),
            self.progress.run(epoch, schedule)
        );

        if outcome.is_ok() {
            self.progress.complete(epoch, schedule).await;
        }

        let mut inner = self.inner.lock().await;
        if inner.generation != generation || inner.state != SessionState::Submitting {
            debug!(session = %self.id, "discarding outcome of superseded submission");
            return Err(SessionError::Superseded);
        }

        match outcome {
            Ok(report) => {
                info!(
                    session = %self.id,
                    verdict = %report.result().final_verdict,
                    "analysis succeeded"
                );
                inner.report = Some(report.clone());
                inner.state = SessionState::Succeeded;
                Ok(report)
            }
            Err(err) => {
                warn!(session = %self.id, error = %err, "analysis failed");
                inner.error = Some(err.user_message());
                inner.state = SessionState::Failed;
                Err(err)
            }
        }
    }

    /// Forgets the candidate, result and error. Any submission still in
    /// flight is superseded and its outcome discarded.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.clear();
        inner.generation += 1;
        self.progress.clear();
        debug!(session = %self.id, "session reset");
    }

    /// Serializes the stored result for download. `Ok(None)` when there is
    /// nothing to export.
    pub async fn export_report(&self) -> Result<Option<ExportedReport>, SessionError> {
        let inner = self.inner.lock().await;
        let Some(report) = inner.report.as_ref() else {
            debug!(session = %self.id, "no result to export");
            return Ok(None);
        };
        Ok(Some(ExportedReport::from_report(report)?))
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
