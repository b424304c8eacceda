use std::collections::HashSet;

use tracing::debug;

use crate::model::{Candidate, Label, Pack, RetrievalLog};
use crate::retrieval::Bm25Index;
use crate::verdict::VerdictEngine;

pub const INSUFFICIENT_ANSWER: &str = "Insufficient evidence to provide a definitive answer.";

const CANDIDATE_LOG_LIMIT: usize = 10;

pub fn assemble(
    qid: &str,
    question: &str,
    claims: &[String],
    engine: &VerdictEngine,
    index: &Bm25Index,
) -> Pack {
    let mut claim_results = Vec::with_capacity(claims.len());
    let mut pool: Vec<Candidate> = Vec::new();

    for claim in claims {
        let (result, candidates) = engine.verify(claim, question, index);
        debug!(qid = %qid, label = result.label.as_str(), "claim verified");
        claim_results.push(result);
        pool.extend(candidates);
    }

    let supported: Vec<&str> = claim_results
        .iter()
        .filter(|result| result.label == Label::Supported)
        .map(|result| result.claim.as_str())
        .collect();
    let answer = if supported.is_empty() {
        INSUFFICIENT_ANSWER.to_owned()
    } else {
        supported.join("; ")
    };

    Pack {
        qid: qid.to_owned(),
        answer,
        claims: claim_results,
        retrieval_log: RetrievalLog {
            top_k: engine.top_k(),
            candidates: dedup_candidates(pool),
        },
    }
}

// Score-descending stable sort first, so the highest-scored instance of each
// (doc_id, location) survives the dedup.
fn dedup_candidates(mut pool: Vec<Candidate>) -> Vec<Candidate> {
    pool.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for candidate in pool {
        if seen.insert((candidate.doc_id.clone(), candidate.location.clone())) {
            unique.push(candidate);
        }
    }
    unique.truncate(CANDIDATE_LOG_LIMIT);
    unique
}
