use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::Regex;

use crate::model::{Candidate, ClaimResult, Evidence, Label};
use crate::retrieval::{Bm25Index, tokenize};

pub const DEFAULT_MIN_SCORE: f64 = 3.0;
pub const DEFAULT_TOP_K: usize = 10;

// Overlap ratios below which the prohibition and support rules stay silent.
const PROHIBITION_OVERLAP_FLOOR: f64 = 0.3;
const SUPPORT_OVERLAP_FLOOR: f64 = 0.4;

const DEFAULT_NEGATION_WORDS: [&str; 5] = ["not", "never", "no", "cannot", "prohibited"];
const DEFAULT_NEGATION_PHRASES: [&str; 2] = ["must not", "should not"];
const DEFAULT_PROHIBITION_PATTERNS: [&str; 6] = [
    r"\bdo not\b",
    r"\bmust not\b",
    r"\bshould not\b",
    r"\bprohibited\b",
    r"\bnever\b",
    r"\bcannot\b",
];

// Pattern pairs matched independently against claim and evidence; differing
// matched spans count as a contradiction. The submission pair doubles as a
// fallback for numeric mismatches the day-count rule does not cover.
const CONTRADICTION_PAIRS: [(&str, &str); 4] = [
    (r"must\s+be\s+submitted.*?\d+", r"must\s+be\s+submitted.*?\d+"),
    (r"\ballowed\b", r"\bprohibited\b"),
    (r"\brequired\b", r"\bnot required\b"),
    (r"\bcan\s+be\b", r"\bcannot\s+be\b"),
];

#[derive(Debug, Clone)]
pub struct VerdictConfig {
    pub min_score: f64,
    pub top_k: usize,
    pub negation_words: Vec<String>,
    pub negation_phrases: Vec<String>,
    pub prohibition_patterns: Vec<String>,
}

impl Default for VerdictConfig {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            top_k: DEFAULT_TOP_K,
            negation_words: DEFAULT_NEGATION_WORDS.map(ToOwned::to_owned).to_vec(),
            negation_phrases: DEFAULT_NEGATION_PHRASES.map(ToOwned::to_owned).to_vec(),
            prohibition_patterns: DEFAULT_PROHIBITION_PATTERNS.map(ToOwned::to_owned).to_vec(),
        }
    }
}

pub struct VerdictEngine {
    config: VerdictConfig,
    negation: Regex,
    prohibitions: Vec<Regex>,
    day_count: Regex,
    contradiction_pairs: Vec<(Regex, Regex)>,
}

impl VerdictEngine {
    pub fn new(config: VerdictConfig) -> Result<Self> {
        let alternatives = config
            .negation_words
            .iter()
            .chain(config.negation_phrases.iter())
            .map(|word| regex::escape(word))
            .collect::<Vec<String>>()
            .join("|");
        let negation = Regex::new(&format!(r"\b(?:{alternatives})\b"))
            .context("failed to compile negation pattern")?;

        let prohibitions = config
            .prohibition_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern)
                    .with_context(|| format!("failed to compile prohibition pattern: {pattern}"))
            })
            .collect::<Result<Vec<Regex>>>()?;

        let day_count = Regex::new(r"\b(\d+)\s*(?:working\s+)?days?\b")
            .context("failed to compile day-count pattern")?;

        let mut contradiction_pairs = Vec::with_capacity(CONTRADICTION_PAIRS.len());
        for (claim_pattern, evidence_pattern) in CONTRADICTION_PAIRS {
            let claim_side = Regex::new(claim_pattern)
                .with_context(|| format!("failed to compile claim pattern: {claim_pattern}"))?;
            let evidence_side = Regex::new(evidence_pattern).with_context(|| {
                format!("failed to compile evidence pattern: {evidence_pattern}")
            })?;
            contradiction_pairs.push((claim_side, evidence_side));
        }

        Ok(Self {
            config,
            negation,
            prohibitions,
            day_count,
            contradiction_pairs,
        })
    }

    pub fn top_k(&self) -> usize {
        self.config.top_k
    }

    pub fn verify(
        &self,
        claim: &str,
        question: &str,
        index: &Bm25Index,
    ) -> (ClaimResult, Vec<Candidate>) {
        // Question supplies context terms, claim the specific ones.
        let query = format!("{question} {claim}");
        let hits = index.search(&query, self.config.top_k);

        // Everything retrieved is logged, including hits below the floor.
        let candidates: Vec<Candidate> = hits
            .iter()
            .map(|(line, score)| Candidate {
                doc_id: line.doc_id.clone(),
                score: round2(*score),
                location: line.line_label.clone(),
            })
            .collect();

        for (line, score) in &hits {
            if *score < self.config.min_score {
                continue;
            }

            let label = self.classify(claim, &line.text);
            if label == Label::Insufficient {
                continue;
            }

            // First decisive candidate in rank order settles the claim.
            let result = ClaimResult {
                claim: claim.to_owned(),
                label,
                evidence: vec![Evidence {
                    doc_id: line.doc_id.clone(),
                    location: line.line_label.clone(),
                    snippet: line.text.clone(),
                }],
            };
            return (result, candidates);
        }

        let result = ClaimResult {
            claim: claim.to_owned(),
            label: Label::Insufficient,
            evidence: Vec::new(),
        };
        (result, candidates)
    }

    pub fn classify(&self, claim: &str, evidence_text: &str) -> Label {
        let claim_lower = claim.to_lowercase();
        let evidence_lower = evidence_text.to_lowercase();

        let claim_terms: HashSet<String> = tokenize(claim).into_iter().collect();
        let evidence_terms: HashSet<String> = tokenize(evidence_text).into_iter().collect();
        let overlap = claim_terms.intersection(&evidence_terms).count();
        let overlap_ratio = if claim_terms.is_empty() {
            0.0
        } else {
            overlap as f64 / claim_terms.len() as f64
        };

        let claim_negated = self.negation.is_match(&claim_lower);
        let evidence_negated = self.negation.is_match(&evidence_lower);
        let evidence_prohibits = self
            .prohibitions
            .iter()
            .any(|pattern| pattern.is_match(&evidence_lower));

        // A permissive claim checked against a prohibitive sentence would
        // otherwise sail through on overlap alone.
        if evidence_prohibits && !claim_negated && overlap_ratio >= PROHIBITION_OVERLAP_FLOOR {
            return Label::NotSupported;
        }

        // Day counts are the load-bearing fact here; a mismatch always
        // contradicts no matter how similar the rest of the sentence is.
        if let (Some(claim_days), Some(evidence_days)) = (
            self.first_day_count(&claim_lower),
            self.first_day_count(&evidence_lower),
        ) {
            if claim_days != evidence_days {
                return Label::NotSupported;
            }
        }

        if overlap_ratio >= SUPPORT_OVERLAP_FLOOR {
            if claim_negated != evidence_negated {
                return Label::NotSupported;
            }
            return Label::Supported;
        }

        if self.pattern_contradiction(&claim_lower, &evidence_lower) {
            return Label::NotSupported;
        }

        Label::Insufficient
    }

    fn first_day_count(&self, text: &str) -> Option<u64> {
        self.day_count
            .captures(text)
            .and_then(|captures| captures.get(1))
            .and_then(|group| group.as_str().parse().ok())
    }

    fn pattern_contradiction(&self, claim: &str, evidence: &str) -> bool {
        for (claim_pattern, evidence_pattern) in &self.contradiction_pairs {
            let (Some(claim_match), Some(evidence_match)) =
                (claim_pattern.find(claim), evidence_pattern.find(evidence))
            else {
                continue;
            };
            if claim_match.as_str() != evidence_match.as_str() {
                return true;
            }
        }
        false
    }
}

pub fn round2(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}
