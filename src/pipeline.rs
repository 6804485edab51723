//! Answer-producing side of the harness.
//!
//! The judges only see what an [`Answerer`] returns, so a real
//! retrieval/generation pipeline can replace [`StubAnswerer`] without touching
//! the rubrics.

use anyhow::Result;

use crate::model::{CorpusRecord, Passage, Question, QuestionType};

const STUB_CHUNK_ID: &str = "dummy#0";

const STUB_PROCEDURE_ANSWER: &str = "開始条件: 依頼を受領し、必要情報が揃っている。\n\
実行: 書類確認→ブッキング→通関手配。\n\
完了条件: B/L発行および出港確認。\n\
次にやること: インボイス/パッキングリストを共有してください。\n\
確認事項: インコタームズと貨物の危険品該当有無を教えてください。\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub retrieved: Vec<Passage>,
    pub answer: String,
}

pub trait Answerer {
    fn answer(&self, question: &Question) -> Result<Answer>;
}

/// Deterministic placeholder: a canned procedure answer for type A questions,
/// a marker string otherwise, and the first corpus record as the only
/// retrieved passage.
#[derive(Debug, Clone)]
pub struct StubAnswerer {
    first_passage_text: String,
}

impl StubAnswerer {
    pub fn new(corpus: &[CorpusRecord]) -> Self {
        Self {
            first_passage_text: corpus
                .first()
                .map(|record| record.text.clone())
                .unwrap_or_default(),
        }
    }
}

impl Answerer for StubAnswerer {
    fn answer(&self, question: &Question) -> Result<Answer> {
        let answer = match question.question_type {
            QuestionType::A => STUB_PROCEDURE_ANSWER.to_string(),
            _ => format!("(DUMMY) Answer for {}", question.id),
        };

        Ok(Answer {
            retrieved: vec![Passage {
                chunk_id: STUB_CHUNK_ID.to_string(),
                text: self.first_passage_text.clone(),
            }],
            answer,
        })
    }
}
