use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::SearchArgs;
use crate::corpus;
use crate::retrieval::Bm25Index;
use crate::verdict::round2;

#[derive(Debug, Clone, Serialize)]
struct SearchResult {
    rank: usize,
    doc_id: String,
    location: String,
    score: f64,
    snippet: String,
}

#[derive(Debug, Clone, Serialize)]
struct SearchResponse {
    query: String,
    limit: usize,
    returned: usize,
    results: Vec<SearchResult>,
}

pub fn run(args: SearchArgs) -> Result<()> {
    let corpus = corpus::load_corpus(&args.docs)?;
    info!(
        documents = corpus.files.len(),
        lines = corpus.lines.len(),
        "loaded corpus"
    );

    let index = Bm25Index::build(corpus.lines);
    let hits = index.search(&args.query, args.limit);

    let results: Vec<SearchResult> = hits
        .into_iter()
        .enumerate()
        .map(|(rank, (line, score))| SearchResult {
            rank: rank + 1,
            doc_id: line.doc_id.clone(),
            location: line.line_label.clone(),
            score: round2(score),
            snippet: line.text.clone(),
        })
        .collect();

    if args.json {
        write_json_response(&args.query, args.limit, results)
    } else {
        write_text_response(&args.query, &results)
    }
}

fn write_json_response(query: &str, limit: usize, results: Vec<SearchResult>) -> Result<()> {
    let response = SearchResponse {
        query: query.to_owned(),
        limit,
        returned: results.len(),
        results,
    };

    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, &response)
        .context("failed to serialize search json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_response(query: &str, results: &[SearchResult]) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Query: {query}")?;
    writeln!(output, "Results: {}", results.len())?;

    for result in results {
        writeln!(
            output,
            "{}.\t{}\t{}\tscore={:.2}",
            result.rank, result.doc_id, result.location, result.score
        )?;
        writeln!(output, "\tsnippet: {}", result.snippet)?;
    }

    output.flush()?;
    Ok(())
}
