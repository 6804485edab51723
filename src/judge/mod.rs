//! Rubric engines that turn answers and retrieved passages into verdicts.
//!
//! Both judges are built once per run, compile their signal sets up front and
//! hold no per-item state, so judging order never changes a verdict.

use indexmap::IndexMap;
use serde::Serialize;

mod generation;
mod retrieval;
pub mod signals;

pub use generation::GenerationJudge;
pub use retrieval::RetrievalJudge;

/// Check maps keep check-definition order when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub checks: IndexMap<&'static str, bool>,
    pub pass: bool,
    pub failure_reasons: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<IndexMap<&'static str, String>>,
}

impl Verdict {
    /// `pass` is the AND of every check and `failure_reasons` lists the
    /// false checks in definition order.
    pub fn from_checks(checks: IndexMap<&'static str, bool>) -> Self {
        let failure_reasons = checks
            .iter()
            .filter(|(_, passed)| !**passed)
            .map(|(key, _)| *key)
            .collect::<Vec<_>>();

        Self {
            pass: failure_reasons.is_empty(),
            checks,
            failure_reasons,
            evidence: None,
        }
    }

    pub fn with_evidence(mut self, evidence: IndexMap<&'static str, String>) -> Self {
        self.evidence = Some(evidence);
        self
    }
}
