use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::VerifyArgs;
use crate::corpus;
use crate::model::{
    ClaimSet, Label, LabelCounts, Pack, QuestionRecord, RunCounts, RunManifest,
};
use crate::pack;
use crate::retrieval::Bm25Index;
use crate::util::{ensure_directory, now_utc_string, read_jsonl, utc_compact_string, write_json_pretty};
use crate::verdict::{VerdictConfig, VerdictEngine};

pub fn run(args: VerifyArgs) -> Result<()> {
    let corpus = corpus::load_corpus(&args.docs)?;
    info!(
        documents = corpus.files.len(),
        lines = corpus.lines.len(),
        "loaded corpus"
    );

    let corpus_files = corpus.files;
    let document_count = corpus_files.len();
    let line_count = corpus.lines.len();

    let index = Bm25Index::build(corpus.lines);
    if index.is_empty() {
        warn!("corpus has no indexable lines; every claim will be INSUFFICIENT");
    }
    info!(indexed = index.len(), "built lexical index");

    let engine = VerdictEngine::new(VerdictConfig {
        min_score: args.min_score,
        top_k: args.top_k,
        ..VerdictConfig::default()
    })?;

    let questions: Vec<QuestionRecord> = read_jsonl(&args.questions)?;
    let claim_sets: Vec<ClaimSet> = read_jsonl(&args.claims)?;

    // BTreeMap gives ascending qid processing order.
    let mut question_by_qid = BTreeMap::new();
    for record in questions {
        question_by_qid.insert(record.qid, record.question);
    }
    let mut claims_by_qid = HashMap::new();
    for record in claim_sets {
        claims_by_qid.insert(record.qid, record.claims);
    }

    ensure_directory(&args.out)?;
    let packs_path = args.out.join("packs.jsonl");
    let file = File::create(&packs_path)
        .with_context(|| format!("failed to create {}", packs_path.display()))?;
    let mut writer = BufWriter::new(file);

    let empty_claims = Vec::new();
    let mut counts = LabelCounts {
        total: 0,
        supported: 0,
        not_supported: 0,
        insufficient: 0,
    };
    let mut pack_count = 0;

    for (qid, question) in &question_by_qid {
        let claims = match claims_by_qid.get(qid) {
            Some(claims) => claims,
            None => {
                warn!(qid = %qid, "no claims for question");
                &empty_claims
            }
        };

        let pack = pack::assemble(qid, question, claims, &engine, &index);
        tally(&mut counts, &pack);

        serde_json::to_writer(&mut writer, &pack)
            .with_context(|| format!("failed to serialize pack for {qid}"))?;
        writeln!(writer)
            .with_context(|| format!("failed to write {}", packs_path.display()))?;

        info!(qid = %qid, claims = pack.claims.len(), "generated pack");
        pack_count += 1;
    }

    writer
        .flush()
        .with_context(|| format!("failed to flush {}", packs_path.display()))?;
    info!(path = %packs_path.display(), packs = pack_count, "wrote packs");

    info!(
        total = counts.total,
        supported = counts.supported,
        supported_pct = %format_pct(counts.supported, counts.total),
        not_supported = counts.not_supported,
        not_supported_pct = %format_pct(counts.not_supported, counts.total),
        insufficient = counts.insufficient,
        insufficient_pct = %format_pct(counts.insufficient, counts.total),
        "claims summary"
    );

    let manifest = RunManifest {
        manifest_version: 1,
        run_id: utc_compact_string(Utc::now()),
        generated_at: now_utc_string(),
        docs_directory: args.docs.display().to_string(),
        top_k: args.top_k,
        min_score: args.min_score,
        counts: RunCounts {
            documents: document_count,
            lines: line_count,
            questions: pack_count,
            claims: counts,
        },
        corpus_files,
    };

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| args.out.join("run_manifest.json"));
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote run manifest");

    Ok(())
}

fn tally(counts: &mut LabelCounts, pack: &Pack) {
    for result in &pack.claims {
        counts.total += 1;
        match result.label {
            Label::Supported => counts.supported += 1,
            Label::NotSupported => counts.not_supported += 1,
            Label::Insufficient => counts.insufficient += 1,
        }
    }
}

fn format_pct(count: usize, total: usize) -> String {
    if total == 0 {
        return "0.0".to_owned();
    }
    format!("{:.1}", 100.0 * count as f64 / total as f64)
}
