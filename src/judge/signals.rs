//! Named, versioned keyword sets and the case-insensitive matcher behind them.
//!
//! Patterns are regular expressions and are used as written: a literal `?`
//! must be spelled `\?`.

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalSet {
    pub name: &'static str,
    pub patterns: &'static [&'static str],
}

#[derive(Debug, Clone)]
pub struct SignalMatcher {
    name: &'static str,
    patterns: Vec<Regex>,
}

impl SignalMatcher {
    pub fn compile(set: &SignalSet) -> Result<Self> {
        let patterns = set
            .patterns
            .iter()
            .map(|pattern| {
                compile_pattern(pattern).with_context(|| format!("in signal set {}", set.name))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: set.name,
            patterns,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn matches_any(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.patterns.iter().any(|pattern| pattern.is_match(text))
    }

    /// Number of distinct patterns present in `text`.
    pub fn count_matching(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.patterns
            .iter()
            .filter(|pattern| pattern.is_match(text))
            .count()
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .with_context(|| format!("failed to compile signal pattern {pattern:?}"))
}

// Generation rubric signals.

pub const START_CONDITION_V1: SignalSet = SignalSet {
    name: "start-condition-v1",
    patterns: &["開始条件", "start condition"],
};

pub const PROCEDURE_V1: SignalSet = SignalSet {
    name: "procedure-v1",
    patterns: &["実行", "steps?", "procedure"],
};

pub const COMPLETION_V1: SignalSet = SignalSet {
    name: "completion-v1",
    patterns: &["完了条件", "done", "completion"],
};

pub const NEXT_ACTION_V1: SignalSet = SignalSet {
    name: "next-action-v1",
    patterns: &["次に", "next action", "やってください", "してください"],
};

pub const QUESTIONS_TO_ASK_V1: SignalSet = SignalSet {
    name: "questions-to-ask-v1",
    patterns: &["確認", "教えてください", "need to confirm", "please confirm", r"\?"],
};

pub const CLEAR_CONCLUSION_V1: SignalSet = SignalSet {
    name: "clear-conclusion-v1",
    patterns: &[
        "禁止",
        "不可",
        "not allowed",
        "forbidden",
        "条件付き",
        "conditionally allowed",
    ],
};

pub const CONDITIONALLY_ALLOWED_V1: SignalSet = SignalSet {
    name: "conditionally-allowed-v1",
    patterns: &["条件付き", "conditionally"],
};

pub const CONDITION_V1: SignalSet = SignalSet {
    name: "condition-v1",
    patterns: &["条件", "if ", "only if", "場合"],
};

pub const UNCERTAIN_V1: SignalSet = SignalSet {
    name: "uncertain-v1",
    patterns: &["不確実", "depends", "not sure", "確認が必要"],
};

pub const CONFIRMATION_V1: SignalSet = SignalSet {
    name: "confirmation-v1",
    patterns: &["確認", "必要情報", "please confirm", "need to know"],
};

pub const DOCUMENT_CATEGORY_V1: SignalSet = SignalSet {
    name: "document-category-v1",
    patterns: &[
        "申告",
        "運送",
        "インボイス",
        "invoice",
        "packing",
        "申請",
        "証明",
        "certificate",
    ],
};

pub const CASE_DEPENDENCY_V1: SignalSet = SignalSet {
    name: "case-dependency-v1",
    patterns: &["状況依存", "depends", "ケース", "case"],
};

pub const CONDITION_V2: SignalSet = SignalSet {
    name: "condition-v2",
    patterns: &["条件", "if ", "場合", "depending on"],
};

pub const FORMAT_REQUIREMENT_V1: SignalSet = SignalSet {
    name: "format-requirement-v1",
    patterns: &[
        "言語",
        "署名",
        "電子",
        "original",
        "copy",
        "signature",
        "format",
    ],
};

pub const DEFINITION_V1: SignalSet = SignalSet {
    name: "definition-v1",
    patterns: &["とは", "means", "refers to"],
};

pub const NEGATIVE_DEFINITION_V1: SignalSet = SignalSet {
    name: "negative-definition-v1",
    patterns: &["ではない", "does not", "not refer"],
};

pub const RELATED_FIELD_V1: SignalSet = SignalSet {
    name: "related-field-v1",
    patterns: &["ステータス", "status", "項目", "field", "コード", "code"],
};

pub const IMMEDIATE_ACTION_V1: SignalSet = SignalSet {
    name: "immediate-action-v1",
    patterns: &["即時", "すぐ", "immediately", "right away"],
};

pub const ESCALATION_V1: SignalSet = SignalSet {
    name: "escalation-v1",
    patterns: &[
        "エスカレーション",
        "上長",
        "担当",
        "連絡",
        "escalate",
        "contact",
    ],
};

pub const CONFIRM_ITEM_V1: SignalSet = SignalSet {
    name: "confirm-item-v1",
    patterns: &["確認", "必要情報", "need to confirm", "need to know", r"\?"],
};

// Retrieval rubric signals.

pub const PROCEDURE_EVIDENCE_V1: SignalSet = SignalSet {
    name: "procedure-evidence-v1",
    patterns: &["開始条件", "完了条件", "手順", "procedure", "steps?"],
};

pub const POLICY_RULE_V1: SignalSet = SignalSet {
    name: "policy-rule-v1",
    patterns: &["禁止", "不可", "例外", "forbidden", "not allowed", "exception"],
};

pub const DOCUMENTS_REQUIREMENT_V1: SignalSet = SignalSet {
    name: "documents-requirement-v1",
    patterns: &["書類", "invoice", "packing", "申告", "証明", "document"],
};

pub const DEFINITION_EVIDENCE_V1: SignalSet = SignalSet {
    name: "definition-evidence-v1",
    patterns: &["とは", "定義", "means", "refers to"],
};

pub const INCIDENT_PROCEDURE_V1: SignalSet = SignalSet {
    name: "incident-procedure-v1",
    patterns: &["対応", "手順", "escalat", "連絡", "immediate", "workaround"],
};
