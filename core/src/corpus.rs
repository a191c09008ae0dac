use crate::{IndexError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One page of the corpus as fetched: its URL and raw HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub url: String,
    pub html: String,
}

#[derive(Debug, Deserialize)]
struct InputDoc {
    url: String,
    #[serde(default)]
    content: String,
}

impl From<InputDoc> for RawDocument {
    fn from(doc: InputDoc) -> Self {
        Self { url: doc.url, html: doc.content }
    }
}

/// A directory tree of `.json` (one page per file) and `.jsonl` (one page per line) files.
#[derive(Debug, Clone)]
pub struct Corpus {
    root: PathBuf,
}

impl Corpus {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() || fs::read_dir(&root).is_err() {
            return Err(IndexError::CorpusRoot(root));
        }
        Ok(Self { root })
    }

    /// Lazily walk the corpus in file-name order. Each call starts a fresh walk.
    ///
    /// Unreadable entries and malformed pages surface as `Err` items; iteration continues past them.
    pub fn documents(&self) -> impl Iterator<Item = Result<RawDocument>> + '_ {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .flat_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_file() => read_file(entry.path()),
                Ok(_) => Vec::new(),
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
                    vec![Err(IndexError::CorpusRead { path, source: e.into() })]
                }
            })
    }
}

fn read_file(path: &Path) -> Vec<Result<RawDocument>> {
    let ext = path.extension().and_then(|s| s.to_str()).map(str::to_ascii_lowercase);
    let jsonl = match ext.as_deref() {
        Some("json") => false,
        Some("jsonl") => true,
        _ => return Vec::new(),
    };
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(source) => return vec![Err(IndexError::CorpusRead { path: path.to_path_buf(), source })],
    };
    let text = match String::from_utf8(bytes) {
        Ok(t) => t,
        Err(e) => return vec![Err(parse_error(path, e))],
    };
    if jsonl {
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| parse_doc(path, line))
            .collect()
    } else {
        vec![parse_doc(path, &text)]
    }
}

fn parse_doc(path: &Path, json: &str) -> Result<RawDocument> {
    serde_json::from_str::<InputDoc>(json)
        .map(RawDocument::from)
        .map_err(|e| parse_error(path, e))
}

fn parse_error(path: &Path, reason: impl std::fmt::Display) -> IndexError {
    IndexError::DocumentParse { path: path.to_path_buf(), reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn page(url: &str, content: &str) -> String {
        serde_json::json!({ "url": url, "content": content, "encoding": "utf-8" }).to_string()
    }

    #[test]
    fn walks_in_sorted_order_and_skips_other_files() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b_domain")).unwrap();
        fs::create_dir_all(dir.path().join("a_domain")).unwrap();
        fs::write(dir.path().join("b_domain/1.json"), page("http://b/1", "<p>b</p>")).unwrap();
        fs::write(dir.path().join("a_domain/2.json"), page("http://a/2", "<p>a2</p>")).unwrap();
        fs::write(dir.path().join("a_domain/1.json"), page("http://a/1", "<p>a1</p>")).unwrap();
        fs::write(dir.path().join("a_domain/notes.txt"), "not a page").unwrap();

        let corpus = Corpus::open(dir.path()).unwrap();
        let urls: Vec<String> = corpus.documents().map(|d| d.unwrap().url).collect();
        assert_eq!(urls, vec!["http://a/1", "http://a/2", "http://b/1"]);

        let again: Vec<String> = corpus.documents().map(|d| d.unwrap().url).collect();
        assert_eq!(urls, again);
    }

    #[test]
    fn jsonl_yields_one_document_per_line() {
        let dir = tempdir().unwrap();
        let body = format!("{}\n\n{}\n", page("http://x/1", "one"), page("http://x/2", "two"));
        fs::write(dir.path().join("crawl.jsonl"), body).unwrap();
        let corpus = Corpus::open(dir.path()).unwrap();
        let docs: Vec<RawDocument> = corpus.documents().map(|d| d.unwrap()).collect();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1], RawDocument { url: "http://x/2".into(), html: "two".into() });
    }

    #[test]
    fn malformed_pages_are_parse_errors() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.json"), "{ not json").unwrap();
        fs::write(dir.path().join("b.json"), r#"{"content": "no url"}"#).unwrap();
        fs::write(dir.path().join("c.json"), r#"{"url": "http://ok"}"#).unwrap();
        let corpus = Corpus::open(dir.path()).unwrap();
        let items: Vec<Result<RawDocument>> = corpus.documents().collect();
        assert_eq!(items.len(), 3);
        assert!(matches!(items[0], Err(IndexError::DocumentParse { .. })));
        assert!(matches!(items[1], Err(IndexError::DocumentParse { .. })));
        let ok = items[2].as_ref().unwrap();
        assert_eq!(ok.url, "http://ok");
        assert_eq!(ok.html, "");
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let err = Corpus::open(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, IndexError::CorpusRoot(_)));
    }
}
