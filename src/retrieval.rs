use std::collections::HashMap;

use crate::model::DocumentLine;

const BM25_K1: f64 = 1.5;
const BM25_B: f64 = 0.75;
const NEGATIVE_IDF_EPSILON: f64 = 0.25;

// Shared by indexing, query scoring, and claim/evidence overlap so all three
// agree on what a word is: lowercase maximal runs of alphanumerics/underscore.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

pub struct Bm25Index {
    lines: Vec<DocumentLine>,
    term_freqs: Vec<HashMap<String, usize>>,
    doc_lens: Vec<usize>,
    avg_doc_len: f64,
    idf: HashMap<String, f64>,
}

impl Bm25Index {
    pub fn build(lines: Vec<DocumentLine>) -> Self {
        let mut term_freqs = Vec::with_capacity(lines.len());
        let mut doc_lens = Vec::with_capacity(lines.len());
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for line in &lines {
            let tokens = tokenize(&line.text);
            doc_lens.push(tokens.len());

            let mut freqs: HashMap<String, usize> = HashMap::new();
            for token in tokens {
                *freqs.entry(token).or_insert(0) += 1;
            }
            for term in freqs.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            term_freqs.push(freqs);
        }

        let corpus_size = lines.len() as f64;
        let avg_doc_len = if lines.is_empty() {
            0.0
        } else {
            doc_lens.iter().sum::<usize>() as f64 / corpus_size
        };

        let mut idf = HashMap::with_capacity(doc_freq.len());
        let mut idf_sum = 0.0;
        let mut negative_terms = Vec::new();
        for (term, df) in doc_freq {
            let value = ((corpus_size - df as f64 + 0.5) / (df as f64 + 0.5)).ln();
            idf_sum += value;
            if value < 0.0 {
                negative_terms.push(term.clone());
            }
            idf.insert(term, value);
        }

        // Okapi idf goes negative for terms in more than half the corpus;
        // floor those at a fraction of the average idf instead.
        if !idf.is_empty() {
            let average_idf = idf_sum / idf.len() as f64;
            let floor = NEGATIVE_IDF_EPSILON * average_idf;
            for term in negative_terms {
                idf.insert(term, floor);
            }
        }

        Self {
            lines,
            term_freqs,
            doc_lens,
            avg_doc_len,
            idf,
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn search(&self, query: &str, top_k: usize) -> Vec<(&DocumentLine, f64)> {
        let query_tokens = tokenize(query);

        let mut scored: Vec<(usize, f64)> = (0..self.lines.len())
            .map(|index| (index, self.score_line(index, &query_tokens)))
            .collect();

        // Stable sort keeps corpus order for ties.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        scored
            .into_iter()
            .filter(|(_, score)| *score > 0.0)
            .map(|(index, score)| (&self.lines[index], score))
            .collect()
    }

    fn score_line(&self, index: usize, query_tokens: &[String]) -> f64 {
        let freqs = &self.term_freqs[index];
        let doc_len = self.doc_lens[index] as f64;

        let mut score = 0.0;
        for token in query_tokens {
            let Some(idf) = self.idf.get(token) else {
                continue;
            };
            let tf = freqs.get(token).copied().unwrap_or(0) as f64;
            if tf == 0.0 {
                continue;
            }
            let norm = BM25_K1 * (1.0 - BM25_B + BM25_B * doc_len / self.avg_doc_len);
            score += idf * (tf * (BM25_K1 + 1.0)) / (tf + norm);
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{Bm25Index, tokenize};
    use crate::model::DocumentLine;

    fn line(doc_id: &str, line_label: &str, text: &str) -> DocumentLine {
        DocumentLine {
            doc_id: doc_id.to_owned(),
            line_label: line_label.to_owned(),
            text: text.to_owned(),
        }
    }

    fn sample_index() -> Bm25Index {
        Bm25Index::build(vec![
            line("doc01", "L001", "Appeals must be filed within 3 working days."),
            line("doc01", "L002", "The committee meets every quarter."),
            line("doc02", "L001", "Employees must not cite prior decisions in filings."),
            line("doc02", "L002", "Budget reports are reviewed in March."),
            line("doc03", "L001", "Laboratory access requires a safety briefing."),
        ])
    }

    #[test]
    fn tokenize_lowercases_and_splits_on_non_word_runs() {
        assert_eq!(
            tokenize("Appeals MUST be re-filed (within 3 days)!"),
            vec!["appeals", "must", "be", "re", "filed", "within", "3", "days"]
        );
        assert_eq!(tokenize("snake_case stays"), vec!["snake_case", "stays"]);
        assert!(tokenize("--- ... !!!").is_empty());
    }

    #[test]
    fn search_ranks_matching_line_first() {
        let index = sample_index();
        let results = index.search("when must appeals be filed", 10);

        assert!(!results.is_empty());
        assert_eq!(results[0].0.doc_id, "doc01");
        assert_eq!(results[0].0.line_label, "L001");
    }

    #[test]
    fn search_excludes_zero_score_lines() {
        let index = sample_index();
        let results = index.search("zebra xylophone", 10);
        assert!(results.is_empty());
    }

    #[test]
    fn search_truncates_to_top_k() {
        let index = sample_index();
        let results = index.search("must filed reviewed access committee", 2);
        assert!(results.len() <= 2);
    }

    #[test]
    fn ties_keep_corpus_order() {
        let index = Bm25Index::build(vec![
            line("doc01", "L001", "alpha beta gamma delta"),
            line("doc02", "L001", "alpha beta gamma delta"),
            line("doc03", "L001", "unrelated filler content here"),
            line("doc03", "L002", "quarterly totals were archived"),
            line("doc03", "L003", "the canteen closes at noon"),
            line("doc03", "L004", "visitors sign the register"),
        ]);

        let results = index.search("alpha beta", 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.doc_id, "doc01");
        assert_eq!(results[1].0.doc_id, "doc02");
        assert_eq!(results[0].1, results[1].1);
    }

    #[test]
    fn scores_are_descending() {
        let index = sample_index();
        let results = index.search("employees must cite prior decisions", 10);
        for pair in results.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn empty_index_returns_nothing() {
        let index = Bm25Index::build(Vec::new());
        assert!(index.is_empty());
        assert!(index.search("anything at all", 10).is_empty());
    }

    proptest! {
        #[test]
        fn search_respects_top_k_and_positive_scores(
            query in ".{0,80}",
            top_k in 0usize..20,
        ) {
            let index = sample_index();
            let results = index.search(&query, top_k);
            prop_assert!(results.len() <= top_k);
            for (_, score) in results {
                prop_assert!(score > 0.0);
            }
        }
    }
}
