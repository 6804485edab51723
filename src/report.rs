use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::model::{JudgementRecord, PredictionItem, RunManifest, RunPaths};
use crate::util::{write_json_pretty, write_jsonl};

const SUMMARY_NOTE: &str =
    "Keyword rubric v0: pass rates measure rubric coverage, not semantic answer quality.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeBreakdown {
    pub n: usize,
    pub generation_pass_rate: f64,
    pub retrieval_pass_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FailureReasonCounts {
    pub generation: BTreeMap<String, usize>,
    pub retrieval: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub n: usize,
    pub generation_pass_rate: f64,
    pub retrieval_pass_rate: f64,
    pub note: String,
    pub by_type: BTreeMap<String, TypeBreakdown>,
    pub failure_reason_counts: FailureReasonCounts,
}

/// Generation judgements are the authoritative item count. The two lists are
/// assumed to be aligned and are not cross-checked.
pub fn summarize(generation: &[JudgementRecord], retrieval: &[JudgementRecord]) -> RunSummary {
    let mut type_tags = generation
        .iter()
        .chain(retrieval)
        .map(|record| record.question_type.as_str().to_string())
        .collect::<Vec<_>>();
    type_tags.sort();
    type_tags.dedup();

    let by_type = type_tags
        .into_iter()
        .map(|tag| {
            let generation_subset = filter_by_type(generation, &tag);
            let retrieval_subset = filter_by_type(retrieval, &tag);
            let breakdown = TypeBreakdown {
                n: generation_subset.len(),
                generation_pass_rate: pass_rate(&generation_subset),
                retrieval_pass_rate: pass_rate(&retrieval_subset),
            };
            (tag, breakdown)
        })
        .collect();

    RunSummary {
        n: generation.len(),
        generation_pass_rate: pass_rate(&generation.iter().collect::<Vec<_>>()),
        retrieval_pass_rate: pass_rate(&retrieval.iter().collect::<Vec<_>>()),
        note: SUMMARY_NOTE.to_string(),
        by_type,
        failure_reason_counts: FailureReasonCounts {
            generation: count_failure_reasons(generation),
            retrieval: count_failure_reasons(retrieval),
        },
    }
}

fn filter_by_type<'a>(records: &'a [JudgementRecord], tag: &str) -> Vec<&'a JudgementRecord> {
    records
        .iter()
        .filter(|record| record.question_type.as_str() == tag)
        .collect()
}

fn pass_rate(records: &[&JudgementRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let passed = records.iter().filter(|record| record.passed()).count();
    passed as f64 / records.len() as f64
}

fn count_failure_reasons(records: &[JudgementRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for reason in records
        .iter()
        .flat_map(|record| record.verdict.failure_reasons.iter())
    {
        *counts.entry((*reason).to_string()).or_insert(0) += 1;
    }
    counts
}

/// Output locations of one run directory.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub out_dir: PathBuf,
    pub predictions_path: PathBuf,
    pub generation_judgements_path: PathBuf,
    pub retrieval_judgements_path: PathBuf,
    pub summary_path: PathBuf,
    pub manifest_path: PathBuf,
}

impl RunReport {
    pub fn new(out_dir: &Path) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
            predictions_path: out_dir.join("predictions.jsonl"),
            generation_judgements_path: out_dir.join("judgements_generation.jsonl"),
            retrieval_judgements_path: out_dir.join("judgements_retrieval.jsonl"),
            summary_path: out_dir.join("summary.json"),
            manifest_path: out_dir.join("run_manifest.json"),
        }
    }

    pub fn paths(&self) -> RunPaths {
        RunPaths {
            out_dir: self.out_dir.display().to_string(),
            predictions_path: self.predictions_path.display().to_string(),
            generation_judgements_path: self.generation_judgements_path.display().to_string(),
            retrieval_judgements_path: self.retrieval_judgements_path.display().to_string(),
            summary_path: self.summary_path.display().to_string(),
        }
    }

    /// Writes predictions, both judgement files and the summary, in that order.
    pub fn write(
        &self,
        predictions: &[PredictionItem],
        generation: &[JudgementRecord],
        retrieval: &[JudgementRecord],
        summary: &RunSummary,
    ) -> Result<()> {
        write_jsonl(&self.predictions_path, predictions)?;
        write_jsonl(&self.generation_judgements_path, generation)?;
        write_jsonl(&self.retrieval_judgements_path, retrieval)?;
        write_json_pretty(&self.summary_path, summary)?;

        info!(
            out_dir = %self.out_dir.display(),
            items = predictions.len(),
            "wrote run reports"
        );
        Ok(())
    }

    pub fn write_manifest(&self, manifest: &RunManifest) -> Result<()> {
        write_json_pretty(&self.manifest_path, manifest)?;
        info!(path = %self.manifest_path.display(), "wrote run manifest");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::{summarize, RunReport};
    use crate::judge::Verdict;
    use crate::model::{JudgementRecord, Passage, PredictionItem, QuestionType};

    fn record(
        id: &str,
        question_type: QuestionType,
        checks: &[(&'static str, bool)],
    ) -> JudgementRecord {
        JudgementRecord {
            id: id.to_string(),
            question_type,
            verdict: Verdict::from_checks(checks.iter().copied().collect::<IndexMap<_, _>>()),
        }
    }

    #[test]
    fn empty_run_has_zero_rates() {
        let summary = summarize(&[], &[]);

        assert_eq!(summary.n, 0);
        assert_eq!(summary.generation_pass_rate, 0.0);
        assert_eq!(summary.retrieval_pass_rate, 0.0);
        assert!(summary.by_type.is_empty());
        assert!(summary.failure_reason_counts.generation.is_empty());
    }

    #[test]
    fn half_of_generation_verdicts_pass() {
        let generation = vec![
            record("q1", QuestionType::A, &[("A_has_next_action", true)]),
            record("q2", QuestionType::B, &[("B_has_clear_conclusion", false)]),
        ];
        let retrieval = vec![
            record("q1", QuestionType::A, &[("R_has_any_relevant_chunk", true)]),
            record("q2", QuestionType::B, &[("R_has_any_relevant_chunk", true)]),
        ];

        let summary = summarize(&generation, &retrieval);
        assert_eq!(summary.n, 2);
        assert_eq!(summary.generation_pass_rate, 0.5);
        assert_eq!(summary.retrieval_pass_rate, 1.0);
    }

    #[test]
    fn item_count_follows_generation_list() {
        let generation = vec![record("q1", QuestionType::A, &[("x", true)])];
        let summary = summarize(&generation, &[]);

        assert_eq!(summary.n, 1);
        assert_eq!(summary.generation_pass_rate, 1.0);
        assert_eq!(summary.retrieval_pass_rate, 0.0);
    }

    #[test]
    fn breakdowns_group_by_type_and_reason() {
        let generation = vec![
            record("q1", QuestionType::A, &[("A_has_next_action", false)]),
            record("q2", QuestionType::A, &[("A_has_next_action", true)]),
            record("q3", QuestionType::Unknown("Z".to_string()), &[("unknown_type", false)]),
            record("q4", QuestionType::A, &[("A_has_next_action", false)]),
        ];

        let summary = summarize(&generation, &[]);
        let type_a = summary.by_type.get("A").expect("type A breakdown");
        assert_eq!(type_a.n, 3);
        assert!((type_a.generation_pass_rate - 1.0 / 3.0).abs() < 1e-12);

        let unknown = summary.by_type.get("Z").expect("unknown type breakdown");
        assert_eq!(unknown.generation_pass_rate, 0.0);

        assert_eq!(summary.failure_reason_counts.generation.get("A_has_next_action"), Some(&2));
        assert_eq!(summary.failure_reason_counts.generation.get("unknown_type"), Some(&1));
    }

    #[test]
    fn summary_is_independent_of_item_order() {
        let mut generation = vec![
            record("q1", QuestionType::A, &[("a", true)]),
            record("q2", QuestionType::C, &[("c", false)]),
            record("q3", QuestionType::D, &[("d", true)]),
        ];
        let forward = summarize(&generation, &generation);
        generation.reverse();
        let reversed = summarize(&generation, &generation);

        assert_eq!(forward, reversed);
    }

    #[test]
    fn report_writes_all_files_into_run_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = RunReport::new(&dir.path().join("run"));

        let predictions = vec![PredictionItem {
            id: "q1".to_string(),
            question_type: QuestionType::D,
            question: "ETDとは?".to_string(),
            retrieved: vec![Passage {
                chunk_id: "c1".to_string(),
                text: "ETDとは出港予定日".to_string(),
            }],
            answer: "(DUMMY) Answer for q1".to_string(),
        }];
        let generation = vec![record(
            "q1",
            QuestionType::D,
            &[("D_mentions_one_related_status_or_system_field", false)],
        )];
        let summary = summarize(&generation, &[]);

        report
            .write(&predictions, &generation, &[], &summary)
            .expect("reports should be written");

        let raw = std::fs::read_to_string(&report.predictions_path).expect("predictions readable");
        assert!(raw.contains("ETDとは出港予定日"));
        assert_eq!(raw.lines().count(), 1);

        let judgement: serde_json::Value = serde_json::from_str(
            std::fs::read_to_string(&report.generation_judgements_path)
                .expect("judgements readable")
                .trim(),
        )
        .expect("judgement is json");
        assert_eq!(judgement["id"], "q1");
        assert_eq!(judgement["type"], "D");
        assert_eq!(judgement["pass"], false);
        assert!(judgement.get("evidence").is_none());

        assert_eq!(
            std::fs::read_to_string(&report.retrieval_judgements_path).expect("readable"),
            ""
        );
        let summary_doc: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(&report.summary_path).expect("summary readable"),
        )
        .expect("summary is json");
        assert_eq!(summary_doc["n"], 1);
    }
}
