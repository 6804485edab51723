use anyhow::{Context, Result};
use indexmap::IndexMap;
use tracing::debug;

use super::signals::{self, SignalMatcher, SignalSet};
use super::Verdict;
use crate::model::{Passage, QuestionType};

/// Presence-only: any non-blank retrieved text counts as relevant.
// TODO: tighten to a question/passage keyword-overlap test.
const ANY_RELEVANT_CHUNK_CHECK: &str = "R_has_any_relevant_chunk";
const UNKNOWN_TYPE_CHECK: &str = "R_unknown_type";

#[derive(Debug, Clone, Copy)]
struct EvidenceCheckDef {
    key: &'static str,
    check_signals: SignalSet,
    /// Used when rescanning individual passages for the evidence pointer.
    evidence_signals: SignalSet,
}

const TYPE_A_EVIDENCE: EvidenceCheckDef = EvidenceCheckDef {
    key: "R_has_specific_procedure_chunk",
    check_signals: signals::PROCEDURE_EVIDENCE_V1,
    evidence_signals: signals::PROCEDURE_EVIDENCE_V1,
};

const TYPE_B_EVIDENCE: EvidenceCheckDef = EvidenceCheckDef {
    key: "R_has_policy_or_rule_chunk",
    check_signals: signals::POLICY_RULE_V1,
    evidence_signals: signals::POLICY_RULE_V1,
};

const TYPE_C_EVIDENCE: EvidenceCheckDef = EvidenceCheckDef {
    key: "R_has_documents_requirement_chunk",
    check_signals: signals::DOCUMENTS_REQUIREMENT_V1,
    evidence_signals: signals::DOCUMENTS_REQUIREMENT_V1,
};

const TYPE_D_EVIDENCE: EvidenceCheckDef = EvidenceCheckDef {
    key: "R_has_definition_chunk",
    check_signals: signals::DEFINITION_EVIDENCE_V1,
    evidence_signals: signals::DEFINITION_EVIDENCE_V1,
};

// Incident answers are checked against incident wording, but the evidence
// pointer still looks for procedure wording, so it can stay empty on a pass.
const TYPE_E_EVIDENCE: EvidenceCheckDef = EvidenceCheckDef {
    key: "R_has_specific_procedure_chunk",
    check_signals: signals::INCIDENT_PROCEDURE_V1,
    evidence_signals: signals::PROCEDURE_EVIDENCE_V1,
};

#[derive(Debug, Clone)]
struct CompiledEvidenceCheck {
    key: &'static str,
    check: SignalMatcher,
    evidence: SignalMatcher,
}

impl CompiledEvidenceCheck {
    fn compile(def: &EvidenceCheckDef) -> Result<Self> {
        Ok(Self {
            key: def.key,
            check: SignalMatcher::compile(&def.check_signals)
                .with_context(|| format!("failed to compile retrieval check {}", def.key))?,
            evidence: SignalMatcher::compile(&def.evidence_signals)
                .with_context(|| format!("failed to compile retrieval evidence {}", def.key))?,
        })
    }
}

/// Scores retrieved passages against the per-type retrieval rubric.
#[derive(Debug, Clone)]
pub struct RetrievalJudge {
    type_a: CompiledEvidenceCheck,
    type_b: CompiledEvidenceCheck,
    type_c: CompiledEvidenceCheck,
    type_d: CompiledEvidenceCheck,
    type_e: CompiledEvidenceCheck,
}

impl RetrievalJudge {
    pub fn new() -> Result<Self> {
        Ok(Self {
            type_a: CompiledEvidenceCheck::compile(&TYPE_A_EVIDENCE)?,
            type_b: CompiledEvidenceCheck::compile(&TYPE_B_EVIDENCE)?,
            type_c: CompiledEvidenceCheck::compile(&TYPE_C_EVIDENCE)?,
            type_d: CompiledEvidenceCheck::compile(&TYPE_D_EVIDENCE)?,
            type_e: CompiledEvidenceCheck::compile(&TYPE_E_EVIDENCE)?,
        })
    }

    fn check_for(&self, question_type: &QuestionType) -> Option<&CompiledEvidenceCheck> {
        match question_type {
            QuestionType::A => Some(&self.type_a),
            QuestionType::B => Some(&self.type_b),
            QuestionType::C => Some(&self.type_c),
            QuestionType::D => Some(&self.type_d),
            QuestionType::E => Some(&self.type_e),
            QuestionType::Unknown(_) => None,
        }
    }

    /// The question text is accepted for interface stability; the current
    /// rubric only looks at the passages.
    pub fn judge(
        &self,
        _question: &str,
        question_type: &QuestionType,
        retrieved: &[Passage],
    ) -> Verdict {
        let scan_buffer = retrieved
            .iter()
            .map(|passage| passage.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let has_any_chunk = !scan_buffer.trim().is_empty();

        let (type_key, type_passed, type_evidence) = match self.check_for(question_type) {
            Some(check) => {
                let passed = check.check.matches_any(&scan_buffer);
                let evidence = if passed {
                    first_matching_chunk(retrieved, &check.evidence)
                } else {
                    String::new()
                };
                if passed && evidence.is_empty() {
                    debug!(
                        check = check.key,
                        evidence_signals = check.evidence.name(),
                        "check passed on joined text without a single matching passage"
                    );
                }
                (check.key, passed, evidence)
            }
            None => (UNKNOWN_TYPE_CHECK, false, String::new()),
        };

        let checks = [
            (ANY_RELEVANT_CHUNK_CHECK, has_any_chunk),
            (type_key, type_passed),
        ]
        .into_iter()
        .collect::<IndexMap<_, _>>();

        let first_chunk = match retrieved.first() {
            Some(passage) if has_any_chunk => passage.chunk_id.clone(),
            _ => String::new(),
        };
        let evidence = [
            (ANY_RELEVANT_CHUNK_CHECK, first_chunk),
            (type_key, type_evidence),
        ]
        .into_iter()
        .collect::<IndexMap<_, _>>();

        Verdict::from_checks(checks).with_evidence(evidence)
    }
}

fn first_matching_chunk(retrieved: &[Passage], matcher: &SignalMatcher) -> String {
    retrieved
        .iter()
        .find(|passage| matcher.matches_any(&passage.text))
        .map(|passage| passage.chunk_id.clone())
        .unwrap_or_default()
}
