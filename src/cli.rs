use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::verdict::{DEFAULT_MIN_SCORE, DEFAULT_TOP_K};

#[derive(Parser, Debug)]
#[command(
    name = "veripack",
    version,
    about = "Claim verification packs over line-labeled reference corpora"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Verify(VerifyArgs),
    Search(SearchArgs),
    Eval(EvalArgs),
}

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    #[arg(long)]
    pub docs: PathBuf,

    #[arg(long)]
    pub questions: PathBuf,

    #[arg(long)]
    pub claims: PathBuf,

    #[arg(long)]
    pub out: PathBuf,

    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    #[arg(long, default_value_t = DEFAULT_MIN_SCORE)]
    pub min_score: f64,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[arg(long)]
    pub docs: PathBuf,

    #[arg(long)]
    pub query: String,

    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EvalArgs {
    #[arg(long)]
    pub packs: PathBuf,
}
