use anyhow::{Context, Result};
use indexmap::IndexMap;

use super::signals::{self, SignalMatcher, SignalSet};
use super::Verdict;
use crate::model::QuestionType;

const UNKNOWN_TYPE_CHECK: &str = "unknown_type";

/// Boolean combination of signal-presence tests.
#[derive(Debug, Clone, Copy)]
enum Rule {
    Signal(SignalSet),
    AllOf(&'static [Rule]),
    AnyOf(&'static [Rule]),
    AtLeast(usize, SignalSet),
}

#[derive(Debug, Clone, Copy)]
struct CheckDef {
    key: &'static str,
    rule: Rule,
}

const TYPE_A_CHECKS: &[CheckDef] = &[
    CheckDef {
        key: "A_structure_start_execute_end",
        rule: Rule::AllOf(&[
            Rule::Signal(signals::START_CONDITION_V1),
            Rule::Signal(signals::PROCEDURE_V1),
            Rule::Signal(signals::COMPLETION_V1),
        ]),
    },
    CheckDef {
        key: "A_has_next_action",
        rule: Rule::Signal(signals::NEXT_ACTION_V1),
    },
    CheckDef {
        key: "A_has_questions_to_ask",
        rule: Rule::Signal(signals::QUESTIONS_TO_ASK_V1),
    },
];

const TYPE_B_CHECKS: &[CheckDef] = &[
    CheckDef {
        key: "B_has_clear_conclusion",
        rule: Rule::AnyOf(&[
            Rule::Signal(signals::CLEAR_CONCLUSION_V1),
            Rule::Signal(signals::CONDITIONALLY_ALLOWED_V1),
        ]),
    },
    CheckDef {
        key: "B_has_condition_if_applicable",
        rule: Rule::AllOf(&[
            Rule::Signal(signals::CONDITIONALLY_ALLOWED_V1),
            Rule::Signal(signals::CONDITION_V1),
        ]),
    },
    CheckDef {
        key: "B_has_confirmation_if_uncertain",
        rule: Rule::AllOf(&[
            Rule::Signal(signals::UNCERTAIN_V1),
            Rule::Signal(signals::CONFIRMATION_V1),
        ]),
    },
];

const TYPE_C_CHECKS: &[CheckDef] = &[
    CheckDef {
        key: "C_lists_two_document_categories",
        rule: Rule::AtLeast(2, signals::DOCUMENT_CATEGORY_V1),
    },
    CheckDef {
        key: "C_declares_dependency_and_one_condition",
        rule: Rule::AllOf(&[
            Rule::Signal(signals::CASE_DEPENDENCY_V1),
            Rule::Signal(signals::CONDITION_V2),
        ]),
    },
    CheckDef {
        key: "C_mentions_one_format_requirement",
        rule: Rule::Signal(signals::FORMAT_REQUIREMENT_V1),
    },
];

const TYPE_D_CHECKS: &[CheckDef] = &[
    CheckDef {
        key: "D_definition_includes_is_and_is_not",
        rule: Rule::AllOf(&[
            Rule::Signal(signals::DEFINITION_V1),
            Rule::Signal(signals::NEGATIVE_DEFINITION_V1),
        ]),
    },
    CheckDef {
        key: "D_mentions_one_related_status_or_system_field",
        rule: Rule::Signal(signals::RELATED_FIELD_V1),
    },
];

const TYPE_E_CHECKS: &[CheckDef] = &[
    CheckDef {
        key: "E_has_immediate_action",
        rule: Rule::Signal(signals::IMMEDIATE_ACTION_V1),
    },
    CheckDef {
        key: "E_has_escalation",
        rule: Rule::Signal(signals::ESCALATION_V1),
    },
    CheckDef {
        key: "E_has_one_item_to_confirm",
        rule: Rule::Signal(signals::CONFIRM_ITEM_V1),
    },
];

#[derive(Debug, Clone)]
enum CompiledRule {
    Signal(SignalMatcher),
    AllOf(Vec<CompiledRule>),
    AnyOf(Vec<CompiledRule>),
    AtLeast(usize, SignalMatcher),
}

impl CompiledRule {
    fn compile(rule: &Rule) -> Result<Self> {
        Ok(match rule {
            Rule::Signal(set) => Self::Signal(SignalMatcher::compile(set)?),
            Rule::AllOf(rules) => Self::AllOf(compile_rules(rules)?),
            Rule::AnyOf(rules) => Self::AnyOf(compile_rules(rules)?),
            Rule::AtLeast(min, set) => Self::AtLeast(*min, SignalMatcher::compile(set)?),
        })
    }

    fn evaluate(&self, text: &str) -> bool {
        match self {
            Self::Signal(matcher) => matcher.matches_any(text),
            Self::AllOf(rules) => rules.iter().all(|rule| rule.evaluate(text)),
            Self::AnyOf(rules) => rules.iter().any(|rule| rule.evaluate(text)),
            Self::AtLeast(min, matcher) => matcher.count_matching(text) >= *min,
        }
    }
}

fn compile_rules(rules: &[Rule]) -> Result<Vec<CompiledRule>> {
    rules.iter().map(CompiledRule::compile).collect()
}

#[derive(Debug, Clone)]
struct CompiledCheck {
    key: &'static str,
    rule: CompiledRule,
}

fn compile_checks(defs: &[CheckDef]) -> Result<Vec<CompiledCheck>> {
    defs.iter()
        .map(|def| {
            Ok(CompiledCheck {
                key: def.key,
                rule: CompiledRule::compile(&def.rule)
                    .with_context(|| format!("failed to compile generation check {}", def.key))?,
            })
        })
        .collect()
}

/// Scores answer text against the per-type generation rubric.
#[derive(Debug, Clone)]
pub struct GenerationJudge {
    type_a: Vec<CompiledCheck>,
    type_b: Vec<CompiledCheck>,
    type_c: Vec<CompiledCheck>,
    type_d: Vec<CompiledCheck>,
    type_e: Vec<CompiledCheck>,
}

impl GenerationJudge {
    pub fn new() -> Result<Self> {
        Ok(Self {
            type_a: compile_checks(TYPE_A_CHECKS)?,
            type_b: compile_checks(TYPE_B_CHECKS)?,
            type_c: compile_checks(TYPE_C_CHECKS)?,
            type_d: compile_checks(TYPE_D_CHECKS)?,
            type_e: compile_checks(TYPE_E_CHECKS)?,
        })
    }

    fn checks_for(&self, question_type: &QuestionType) -> Option<&[CompiledCheck]> {
        match question_type {
            QuestionType::A => Some(self.type_a.as_slice()),
            QuestionType::B => Some(self.type_b.as_slice()),
            QuestionType::C => Some(self.type_c.as_slice()),
            QuestionType::D => Some(self.type_d.as_slice()),
            QuestionType::E => Some(self.type_e.as_slice()),
            QuestionType::Unknown(_) => None,
        }
    }

    pub fn judge(&self, answer: &str, question_type: &QuestionType) -> Verdict {
        let answer = answer.trim();

        let checks = match self.checks_for(question_type) {
            Some(checks) => checks
                .iter()
                .map(|check| (check.key, check.rule.evaluate(answer)))
                .collect::<IndexMap<_, _>>(),
            None => [(UNKNOWN_TYPE_CHECK, false)].into_iter().collect(),
        };

        Verdict::from_checks(checks)
    }
}

#[cfg(test)]
mod tests {
    use super::GenerationJudge;
    use crate::model::QuestionType;

    fn judge() -> GenerationJudge {
        GenerationJudge::new().expect("generation rubric should compile")
    }

    #[test]
    fn structured_type_a_answer_passes_every_check() {
        let verdict = judge().judge(
            "開始条件: x\n実行: y\n完了条件: z\n次にやってください\n確認してください",
            &QuestionType::A,
        );

        assert!(verdict.pass);
        assert!(verdict.failure_reasons.is_empty());
        assert_eq!(verdict.checks.len(), 3);
        assert!(verdict.checks.iter().all(|(_, passed)| *passed));
        assert!(verdict.evidence.is_none());
    }

    #[test]
    fn dummy_answer_fails_every_type_a_check() {
        let verdict = judge().judge("(DUMMY) Answer for q1", &QuestionType::A);

        assert!(!verdict.pass);
        assert_eq!(
            verdict.failure_reasons,
            vec![
                "A_structure_start_execute_end",
                "A_has_next_action",
                "A_has_questions_to_ask"
            ]
        );
    }

    #[test]
    fn type_a_structure_needs_all_three_elements() {
        let verdict = judge().judge(
            "Start condition: booking received. Procedure: file docs.",
            &QuestionType::A,
        );
        assert_eq!(verdict.checks.get("A_structure_start_execute_end"), Some(&false));
    }

    #[test]
    fn type_b_conditional_answer_with_uncertainty() {
        let verdict = judge().judge(
            "Conditionally allowed: only if the permit is attached. It depends on the cargo, please confirm the HS code.",
            &QuestionType::B,
        );

        assert!(verdict.pass, "unexpected failures: {:?}", verdict.failure_reasons);
    }

    #[test]
    fn type_b_plain_prohibition_has_no_condition() {
        let verdict = judge().judge("輸出は禁止です。", &QuestionType::B);

        assert_eq!(verdict.checks.get("B_has_clear_conclusion"), Some(&true));
        assert_eq!(
            verdict.failure_reasons,
            vec!["B_has_condition_if_applicable", "B_has_confirmation_if_uncertain"]
        );
    }

    #[test]
    fn type_c_counts_distinct_document_categories() {
        let judge = judge();

        let single = judge.judge("Invoice, invoice and more invoice.", &QuestionType::C);
        assert_eq!(single.checks.get("C_lists_two_document_categories"), Some(&false));

        let verdict = judge.judge(
            "インボイスと原産地証明が必要です。ケースによって異なり、輸入国の条件次第です。署名済みの original が必要。",
            &QuestionType::C,
        );
        assert!(verdict.pass, "unexpected failures: {:?}", verdict.failure_reasons);
    }

    #[test]
    fn type_d_requires_positive_and_negative_definition() {
        let judge = judge();

        let partial = judge.judge("ETD means estimated time of departure.", &QuestionType::D);
        assert_eq!(
            partial.failure_reasons,
            vec![
                "D_definition_includes_is_and_is_not",
                "D_mentions_one_related_status_or_system_field"
            ]
        );

        let full = judge.judge(
            "ETD means estimated departure; it does not refer to the actual sailing. See the status field.",
            &QuestionType::D,
        );
        assert!(full.pass);
    }

    #[test]
    fn type_e_incident_answer() {
        let verdict = judge().judge(
            "すぐに貨物を止めてください。上長へエスカレーションし、コンテナ番号を確認してください。",
            &QuestionType::E,
        );
        assert!(verdict.pass, "unexpected failures: {:?}", verdict.failure_reasons);
    }

    #[test]
    fn unknown_type_always_fails_with_single_reason() {
        let verdict = judge().judge(
            "開始条件 実行 完了条件 次に 確認",
            &QuestionType::Unknown("Z".to_string()),
        );

        assert!(!verdict.pass);
        assert_eq!(verdict.failure_reasons, vec!["unknown_type"]);
        assert_eq!(verdict.checks.len(), 1);
    }

    #[test]
    fn empty_answer_fails_without_error() {
        let verdict = judge().judge("   \n ", &QuestionType::E);
        assert_eq!(verdict.failure_reasons.len(), 3);
    }

    #[test]
    fn judging_is_repeatable() {
        let judge = judge();
        let answer = "Immediately contact the duty manager?";

        let first = serde_json::to_string(&judge.judge(answer, &QuestionType::E))
            .expect("verdict should serialize");
        let second = serde_json::to_string(&judge.judge(answer, &QuestionType::E))
            .expect("verdict should serialize");
        assert_eq!(first, second);
    }
}
