use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::judge::Verdict;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    A,
    B,
    C,
    D,
    E,
    Unknown(String),
}

impl QuestionType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::Unknown(raw) => raw.as_str(),
        }
    }
}

impl From<&str> for QuestionType {
    fn from(value: &str) -> Self {
        match value {
            "A" => Self::A,
            "B" => Self::B,
            "C" => Self::C,
            "D" => Self::D,
            "E" => Self::E,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for QuestionType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<QuestionType> for String {
    fn from(value: QuestionType) -> Self {
        match value {
            QuestionType::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question: String,
}

/// One corpus line. Only `text` is consumed; other fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CorpusRecord {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub chunk_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionItem {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question: String,
    #[serde(default)]
    pub retrieved: Vec<Passage>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub answer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JudgementRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(flatten)]
    pub verdict: Verdict,
}

impl JudgementRecord {
    pub fn new(item: &PredictionItem, verdict: Verdict) -> Self {
        Self {
            id: item.id.clone(),
            question_type: item.question_type.clone(),
            verdict,
        }
    }

    pub fn passed(&self) -> bool {
        self.verdict.pass
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunPaths {
    pub out_dir: String,
    pub predictions_path: String,
    pub generation_judgements_path: String,
    pub retrieval_judgements_path: String,
    pub summary_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputHash {
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunCounts {
    pub questions: usize,
    pub corpus_records: usize,
    pub predictions: usize,
    pub generation_passed: usize,
    pub retrieval_passed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub completed_at: String,
    pub command: String,
    pub paths: RunPaths,
    pub inputs: Vec<InputHash>,
    pub counts: RunCounts,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
