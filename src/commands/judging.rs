use std::collections::HashSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{info, warn};

use crate::judge::{GenerationJudge, RetrievalJudge};
use crate::model::{InputHash, JudgementRecord, PredictionItem, RunCounts};
use crate::report::{summarize, RunReport, RunSummary};
use crate::util::{local_run_dir_name, sha256_file};

pub(super) const RUN_MANIFEST_VERSION: u32 = 1;
const DEFAULT_RUNS_ROOT: &str = "reports/runs";

#[derive(Debug)]
pub(super) struct JudgedRun {
    pub generation: Vec<JudgementRecord>,
    pub retrieval: Vec<JudgementRecord>,
    pub summary: RunSummary,
}

impl JudgedRun {
    pub fn counts(&self, questions: usize, corpus_records: usize) -> RunCounts {
        RunCounts {
            questions,
            corpus_records,
            predictions: self.generation.len(),
            generation_passed: self.generation.iter().filter(|record| record.passed()).count(),
            retrieval_passed: self.retrieval.iter().filter(|record| record.passed()).count(),
        }
    }
}

pub(super) fn resolve_out_dir(out: Option<PathBuf>) -> PathBuf {
    out.unwrap_or_else(|| Path::new(DEFAULT_RUNS_ROOT).join(local_run_dir_name(Local::now())))
}

pub(super) fn command_line() -> String {
    std::env::args().collect::<Vec<_>>().join(" ")
}

pub(super) fn hash_inputs(paths: &[&Path]) -> Result<Vec<InputHash>> {
    paths
        .iter()
        .map(|path| {
            Ok(InputHash {
                path: path.display().to_string(),
                sha256: sha256_file(path)?,
            })
        })
        .collect()
}

/// Runs both judges over every prediction, in input order.
pub(super) fn judge_predictions(predictions: &[PredictionItem]) -> Result<JudgedRun> {
    let generation_judge = GenerationJudge::new().context("failed to build generation rubric")?;
    let retrieval_judge = RetrievalJudge::new().context("failed to build retrieval rubric")?;

    warn_on_duplicate_ids(predictions);

    let retrieval = predictions
        .iter()
        .map(|item| {
            let verdict =
                retrieval_judge.judge(&item.question, &item.question_type, &item.retrieved);
            JudgementRecord::new(item, verdict)
        })
        .collect::<Vec<_>>();

    let generation = predictions
        .iter()
        .map(|item| {
            let verdict = generation_judge.judge(&item.answer, &item.question_type);
            JudgementRecord::new(item, verdict)
        })
        .collect::<Vec<_>>();

    let summary = summarize(&generation, &retrieval);
    info!(
        items = summary.n,
        generation_pass_rate = summary.generation_pass_rate,
        retrieval_pass_rate = summary.retrieval_pass_rate,
        "judging completed"
    );

    Ok(JudgedRun {
        generation,
        retrieval,
        summary,
    })
}

fn warn_on_duplicate_ids(predictions: &[PredictionItem]) {
    let mut seen = HashSet::new();
    for item in predictions {
        if !seen.insert(item.id.as_str()) {
            warn!(id = %item.id, "duplicate item id in run");
        }
    }
}

pub(super) fn print_result(report: &RunReport, summary: &RunSummary) -> Result<()> {
    let rendered =
        serde_json::to_string_pretty(summary).context("failed to render run summary")?;

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "[OK] wrote reports to: {}", report.out_dir.display())
        .context("failed to write run result")?;
    writeln!(output, "{rendered}").context("failed to write run summary")?;
    output.flush().context("failed to flush stdout")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{judge_predictions, resolve_out_dir};
    use crate::model::{Passage, PredictionItem, QuestionType};

    fn item(id: &str, question_type: QuestionType, answer: &str, text: &str) -> PredictionItem {
        PredictionItem {
            id: id.to_string(),
            question_type,
            question: "q".to_string(),
            retrieved: vec![Passage {
                chunk_id: format!("{id}#0"),
                text: text.to_string(),
            }],
            answer: answer.to_string(),
        }
    }

    #[test]
    fn judged_records_follow_input_order() {
        let predictions = vec![
            item("q2", QuestionType::B, "禁止", "禁止事項"),
            item("q1", QuestionType::A, "(DUMMY) Answer for q1", ""),
            item("q3", QuestionType::Unknown("Z".to_string()), "", "text"),
        ];

        let judged = judge_predictions(&predictions).expect("rubrics should compile");
        let ids = judged
            .generation
            .iter()
            .map(|record| record.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["q2", "q1", "q3"]);
        assert_eq!(judged.retrieval[0].id, "q2");
        assert!(judged.retrieval[0].passed());
        assert!(!judged.retrieval[1].passed());
        assert_eq!(judged.retrieval[2].verdict.failure_reasons, vec!["R_unknown_type"]);
        assert_eq!(judged.summary.n, 3);

        let counts = judged.counts(3, 1);
        assert_eq!(counts.predictions, 3);
        assert_eq!(counts.retrieval_passed, 1);
    }

    #[test]
    fn explicit_out_dir_wins_over_timestamped_default() {
        assert_eq!(
            resolve_out_dir(Some(PathBuf::from("/tmp/run-1"))),
            PathBuf::from("/tmp/run-1")
        );
        assert!(resolve_out_dir(None).starts_with("reports/runs"));
    }
}
