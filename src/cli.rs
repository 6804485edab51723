use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "rag-eval",
    version,
    about = "Rubric-based retrieval and generation evaluation for RAG runs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer every question with the stub pipeline, then judge and report.
    Eval(EvalArgs),
    /// Re-judge an existing predictions.jsonl.
    Judge(JudgeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EvalArgs {
    #[arg(long, default_value = "data/eval/questions.jsonl")]
    pub questions: PathBuf,

    #[arg(long, default_value = "data/corpus/corpus.jsonl")]
    pub corpus: PathBuf,

    /// Defaults to reports/runs/<YYYY-MM-DD_HHMMSS>.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct JudgeArgs {
    #[arg(long)]
    pub predictions: PathBuf,

    /// Defaults to reports/runs/<YYYY-MM-DD_HHMMSS>.
    #[arg(long)]
    pub out: Option<PathBuf>,
}
