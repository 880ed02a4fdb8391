use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Media type a candidate must carry to be accepted for analysis.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Upload cap shown to users. Only enforced when a session opts in.
pub const ADVERTISED_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A document picked for analysis, held in memory until it is submitted.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    name: String,
    mime_type: String,
    contents: Vec<u8>,
}

impl UploadCandidate {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            contents,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn byte_size(&self) -> u64 {
        self.contents.len() as u64
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    pub fn into_contents(self) -> Vec<u8> {
        self.contents
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == PDF_MIME_TYPE
    }
}

// Contents are elided so logging a candidate never dumps the whole document.
impl fmt::Debug for UploadCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadCandidate")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("byte_size", &self.byte_size())
            .finish()
    }
}

/// One submission to the remote analyzer. Only constructible from a candidate.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    candidate: UploadCandidate,
}

impl AnalysisRequest {
    pub fn new(candidate: UploadCandidate) -> Self {
        Self { candidate }
    }

    pub fn candidate(&self) -> &UploadCandidate {
        &self.candidate
    }

    pub fn into_candidate(self) -> UploadCandidate {
        self.candidate
    }
}
