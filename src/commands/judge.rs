use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use super::judging::{
    command_line, hash_inputs, judge_predictions, print_result, resolve_out_dir,
    RUN_MANIFEST_VERSION,
};
use crate::cli::JudgeArgs;
use crate::model::{PredictionItem, RunManifest};
use crate::report::RunReport;
use crate::util::{ensure_directory, now_utc_string, read_jsonl, utc_compact_string};

/// Scores predictions produced elsewhere, such as by a real pipeline, with the
/// same rubrics as `eval`.
pub fn run(args: JudgeArgs) -> Result<()> {
    let out_dir = resolve_out_dir(args.out.clone());
    let started_at = now_utc_string();
    let run_id = format!("judge-{}", utc_compact_string(Utc::now()));

    let predictions: Vec<PredictionItem> = read_jsonl(&args.predictions).with_context(|| {
        format!("failed to load predictions: {}", args.predictions.display())
    })?;
    info!(
        path = %args.predictions.display(),
        predictions = predictions.len(),
        "loaded predictions"
    );

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
        inputs: hash_inputs(&[args.predictions.as_path()])?,
        counts: judged.counts(predictions.len(), 0),
    };
    report.write_manifest(&manifest)?;

    print_result(&report, &judged.summary)
}
