use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct DocumentLine {
    pub doc_id: String,
    pub line_label: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    Supported,
    NotSupported,
    Insufficient,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Supported => "SUPPORTED",
            Self::NotSupported => "NOT_SUPPORTED",
            Self::Insufficient => "INSUFFICIENT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub doc_id: String,
    pub location: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimResult {
    pub claim: String,
    pub label: Label,
    pub evidence: Vec<Evidence>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub doc_id: String,
    pub score: f64,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalLog {
    pub top_k: usize,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pack {
    pub qid: String,
    pub answer: String,
    pub claims: Vec<ClaimResult>,
    pub retrieval_log: RetrievalLog,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRecord {
    pub qid: String,
    pub question: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaimSet {
    pub qid: String,
    pub claims: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorpusFileEntry {
    pub filename: String,
    pub line_count: usize,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelCounts {
    pub total: usize,
    pub supported: usize,
    pub not_supported: usize,
    pub insufficient: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunCounts {
    pub documents: usize,
    pub lines: usize,
    pub questions: usize,
    pub claims: LabelCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub docs_directory: String,
    pub top_k: usize,
    pub min_score: f64,
    pub counts: RunCounts,
    pub corpus_files: Vec<CorpusFileEntry>,
}
