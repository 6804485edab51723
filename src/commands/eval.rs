use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use super::judging::{
    command_line, hash_inputs, judge_predictions, print_result, resolve_out_dir,
    RUN_MANIFEST_VERSION,
};
use crate::cli::EvalArgs;
use crate::model::{CorpusRecord, PredictionItem, Question, RunManifest};
use crate::pipeline::{Answerer, StubAnswerer};
use crate::report::RunReport;
use crate::util::{ensure_directory, now_utc_string, read_jsonl, utc_compact_string};

pub fn run(args: EvalArgs) -> Result<()> {
    let out_dir = resolve_out_dir(args.out.clone());
    let started_at = now_utc_string();
    let run_id = format!("eval-{}", utc_compact_string(Utc::now()));

    let questions: Vec<Question> = read_jsonl(&args.questions)
        .with_context(|| format!("failed to load questions: {}", args.questions.display()))?;
    let corpus: Vec<CorpusRecord> = read_jsonl(&args.corpus)
        .with_context(|| format!("failed to load corpus: {}", args.corpus.display()))?;
    info!(
        questions = questions.len(),
        corpus_records = corpus.len(),
        "loaded evaluation inputs"
    );

    let answerer = StubAnswerer::new(&corpus);
    let predictions = produce_predictions(&questions, &answerer)?;
    let judged = judge_predictions(&predictions)?;

    ensure_directory(&out_dir)?;
    let report = RunReport::new(&out_dir);
    report.write(
        &predictions,
        &judged.generation,
        &judged.retrieval,
        &judged.summary,
    )?;

    let manifest = RunManifest {
        manifest_version: RUN_MANIFEST_VERSION,
        run_id,
        started_at,
        completed_at: now_utc_string(),
        command: command_line(),
        paths: report.paths(),
        inputs: hash_inputs(&[args.questions.as_path(), args.corpus.as_path()])?,
        counts: judged.counts(questions.len(), corpus.len()),
    };
    report.write_manifest(&manifest)?;

    print_result(&report, &judged.summary)
}

fn produce_predictions(
    questions: &[Question],
    answerer: &dyn Answerer,
) -> Result<Vec<PredictionItem>> {
    questions
        .iter()
        .map(|question| {
            let answer = answerer
                .answer(question)
                .with_context(|| format!("failed to answer question {}", question.id))?;
            Ok(PredictionItem {
                id: question.id.clone(),
                question_type: question.question_type.clone(),
                question: question.question.clone(),
                retrieved: answer.retrieved,
                answer: answer.answer,
            })
        })
        .collect()
}
