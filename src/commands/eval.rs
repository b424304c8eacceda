use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::cli::EvalArgs;
use crate::model::{Label, Pack};
use crate::util::read_jsonl;

// Distribution bounds outside which the rules are probably miscalibrated.
const MIN_INSUFFICIENT_SHARE: f64 = 0.05;
const MAX_SUPPORTED_SHARE: f64 = 0.9;

#[derive(Debug, Clone, PartialEq)]
struct EvalSummary {
    packs: usize,
    packs_with_candidates: usize,
    claims: usize,
    supported: usize,
    not_supported: usize,
    insufficient: usize,
    with_evidence: usize,
}

pub fn run(args: EvalArgs) -> Result<()> {
    let packs: Vec<Pack> = read_jsonl(&args.packs)?;
    if packs.is_empty() {
        bail!("no packs found in {}", args.packs.display());
    }

    let summary = summarize(&packs);

    info!(
        claims = summary.claims,
        supported = summary.supported,
        not_supported = summary.not_supported,
        insufficient = summary.insufficient,
        "label distribution"
    );
    info!(
        with_evidence = summary.with_evidence,
        claims = summary.claims,
        packs_with_candidates = summary.packs_with_candidates,
        packs = summary.packs,
        "evidence coverage"
    );

    if summary.claims == 0 {
        warn!("packs contain no claims; nothing to check");
        return Ok(());
    }

    let total = summary.claims as f64;
    if (summary.insufficient as f64) < total * MIN_INSUFFICIENT_SHARE {
        warn!("low INSUFFICIENT rate; verdicts may be over-confident");
    } else if (summary.supported as f64) > total * MAX_SUPPORTED_SHARE {
        warn!("very high SUPPORTED rate; double check negation handling");
    } else {
        info!("all quality checks passed");
    }

    Ok(())
}

fn summarize(packs: &[Pack]) -> EvalSummary {
    let mut summary = EvalSummary {
        packs: packs.len(),
        packs_with_candidates: 0,
        claims: 0,
        supported: 0,
        not_supported: 0,
        insufficient: 0,
        with_evidence: 0,
    };

    for pack in packs {
        if !pack.retrieval_log.candidates.is_empty() {
            summary.packs_with_candidates += 1;
        }
        for result in &pack.claims {
            summary.claims += 1;
            match result.label {
                Label::Supported => summary.supported += 1,
                Label::NotSupported => summary.not_supported += 1,
                Label::Insufficient => summary.insufficient += 1,
            }
            if !result.evidence.is_empty() {
                summary.with_evidence += 1;
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::summarize;
    use crate::model::{Candidate, ClaimResult, Evidence, Label, Pack, RetrievalLog};

    fn pack(qid: &str, claims: Vec<ClaimResult>, candidates: Vec<Candidate>) -> Pack {
        Pack {
            qid: qid.to_owned(),
            answer: String::new(),
            claims,
            retrieval_log: RetrievalLog {
                top_k: 10,
                candidates,
            },
        }
    }

    fn claim(label: Label, with_evidence: bool) -> ClaimResult {
        let evidence = if with_evidence {
            vec![Evidence {
                doc_id: "doc01".to_owned(),
                location: "L001".to_owned(),
                snippet: "text".to_owned(),
            }]
        } else {
            Vec::new()
        };
        ClaimResult {
            claim: "c".to_owned(),
            label,
            evidence,
        }
    }

    #[test]
    fn summarize_counts_labels_evidence_and_candidates() {
        let packs = vec![
            pack(
                "q1",
                vec![claim(Label::Supported, true), claim(Label::Insufficient, false)],
                vec![Candidate {
                    doc_id: "doc01".to_owned(),
                    score: 4.2,
                    location: "L001".to_owned(),
                }],
            ),
            pack("q2", vec![claim(Label::NotSupported, true)], Vec::new()),
        ];

        let summary = summarize(&packs);
        assert_eq!(summary.packs, 2);
        assert_eq!(summary.packs_with_candidates, 1);
        assert_eq!(summary.claims, 3);
        assert_eq!(summary.supported, 1);
        assert_eq!(summary.not_supported, 1);
        assert_eq!(summary.insufficient, 1);
        assert_eq!(summary.with_evidence, 2);
    }
}
