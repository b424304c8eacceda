use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::warn;

use crate::model::{CorpusFileEntry, DocumentLine};
use crate::util::sha256_file;

pub struct Corpus {
    pub lines: Vec<DocumentLine>,
    pub files: Vec<CorpusFileEntry>,
}

pub fn load_corpus(docs_dir: &Path) -> Result<Corpus> {
    let pattern =
        Regex::new(r"^(L\d+):\s*(.+)$").context("failed to compile line label regex")?;

    let mut paths = discover_documents(docs_dir)?;
    paths.sort();

    if paths.is_empty() {
        warn!(dir = %docs_dir.display(), "no .txt documents found");
    }

    let mut lines = Vec::new();
    let mut files = Vec::with_capacity(paths.len());

    for path in paths {
        let doc_id = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read document: {}", path.display()))?;

        let mut line_count = 0;
        for line in raw.lines() {
            // Only L-prefixed lines participate; everything else is ignored.
            let Some(captures) = pattern.captures(line.trim()) else {
                continue;
            };
            let (Some(line_label), Some(text)) = (captures.get(1), captures.get(2)) else {
                continue;
            };
            lines.push(DocumentLine {
                doc_id: doc_id.clone(),
                line_label: line_label.as_str().to_owned(),
                text: text.as_str().to_owned(),
            });
            line_count += 1;
        }

        files.push(CorpusFileEntry {
            filename: format!("{doc_id}.txt"),
            line_count,
            sha256: sha256_file(&path)?,
        });
    }

    Ok(Corpus { lines, files })
}

fn discover_documents(docs_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();

    let entries = fs::read_dir(docs_dir)
        .with_context(|| format!("failed to read {}", docs_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", docs_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_text = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("txt"))
            .unwrap_or(false);

        if is_text {
            documents.push(path);
        }
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::load_corpus;

    #[test]
    fn parses_labeled_lines_and_skips_everything_else() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("policy.txt"),
            "Preamble without a label\nL001: Appeals must be filed within 3 days.\n\nL002: Decisions are final.\nnote: unlabeled\n",
        )
        .expect("write doc");

        let corpus = load_corpus(dir.path()).expect("load corpus");
        assert_eq!(corpus.lines.len(), 2);
        assert_eq!(corpus.lines[0].doc_id, "policy");
        assert_eq!(corpus.lines[0].line_label, "L001");
        assert_eq!(corpus.lines[0].text, "Appeals must be filed within 3 days.");
        assert_eq!(corpus.lines[1].line_label, "L002");

        assert_eq!(corpus.files.len(), 1);
        assert_eq!(corpus.files[0].filename, "policy.txt");
        assert_eq!(corpus.files[0].line_count, 2);
        assert_eq!(corpus.files[0].sha256.len(), 64);
    }

    #[test]
    fn documents_load_in_ascending_filename_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("doc02.txt"), "L001: second file\n").expect("write doc");
        fs::write(dir.path().join("doc01.txt"), "L001: first file\n").expect("write doc");
        fs::write(dir.path().join("ignored.md"), "L001: wrong extension\n").expect("write doc");

        let corpus = load_corpus(dir.path()).expect("load corpus");
        let doc_ids: Vec<&str> = corpus.lines.iter().map(|line| line.doc_id.as_str()).collect();
        assert_eq!(doc_ids, vec!["doc01", "doc02"]);
    }

    #[test]
    fn missing_directory_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("does-not-exist");
        assert!(load_corpus(&missing).is_err());
    }

    #[test]
    fn empty_directory_yields_empty_corpus() {
        let dir = tempfile::tempdir().expect("tempdir");
        let corpus = load_corpus(dir.path()).expect("load corpus");
        assert!(corpus.lines.is_empty());
        assert!(corpus.files.is_empty());
    }
}
