use crate::tokenizer::tokenize_and_stem;
use crate::{DocId, IndexReader, Posting, Result};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub doc_id: DocId,
    pub url: String,
    pub score: f64,
}

/// Boolean-AND search with cosine-normalized tf-idf ranking.
pub struct SearchEngine {
    reader: IndexReader,
}

impl SearchEngine {
    pub fn new(reader: IndexReader) -> Self {
        Self { reader }
    }

    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Ok(Self::new(IndexReader::open(dir)?))
    }

    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    /// Top `top_k` documents containing every query term, best first.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let mut results = self.rank(query)?;
        results.truncate(top_k);
        Ok(results)
    }

    /// Every matching document, ordered by score descending then doc id ascending.
    pub fn rank(&self, query: &str) -> Result<Vec<SearchResult>> {
        let terms = tokenize_and_stem(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut postings: HashMap<&str, Vec<Posting>> = HashMap::new();
        let mut idf: HashMap<&str, f64> = HashMap::new();
        for term in &terms {
            if postings.contains_key(term.as_str()) {
                continue;
            }
            let plist = self.reader.get_postings(term)?;
            if plist.is_empty() {
                tracing::debug!(term = %term, "term not in index, no conjunctive match");
                return Ok(Vec::new());
            }
            idf.insert(term, self.reader.compute_idf(term)?);
            postings.insert(term, plist);
        }

        let candidates = intersect(postings.values().map(Vec::as_slice).collect());
        tracing::debug!(query, terms = terms.len(), candidates = candidates.len(), "intersected postings");

        let mut results = Vec::with_capacity(candidates.len());
        for doc_id in candidates {
            let doc_length = self.reader.get_doc_length(doc_id)?;
            let norm = if doc_length > 0.0 { doc_length.sqrt() } else { 1.0 };
            let mut score = 0.0;
            // repeated query terms count once per occurrence
            for term in &terms {
                let plist = &postings[term.as_str()];
                if let Ok(i) = plist.binary_search_by_key(&doc_id, |p| p.doc_id) {
                    score += plist[i].weighted_tf / norm * idf[term.as_str()];
                }
            }
            match self.reader.get_url(doc_id)? {
                Some(url) => results.push(SearchResult { doc_id, url, score }),
                None => tracing::warn!(doc_id, "matched document has no url, dropping"),
            }
        }

        results.sort_by(by_score_then_doc_id);
        Ok(results)
    }
}

fn by_score_then_doc_id(a: &SearchResult, b: &SearchResult) -> Ordering {
    b.score.total_cmp(&a.score).then(a.doc_id.cmp(&b.doc_id))
}

/// Doc ids present in every list. Lists must be sorted by doc id; the shortest goes first.
fn intersect(mut lists: Vec<&[Posting]>) -> Vec<DocId> {
    lists.sort_by_key(|l| l.len());
    let Some((first, rest)) = lists.split_first() else {
        return Vec::new();
    };
    let mut acc: Vec<DocId> = first.iter().map(|p| p.doc_id).collect();
    for list in rest {
        if acc.is_empty() {
            break;
        }
        let mut kept = Vec::with_capacity(acc.len());
        let (mut i, mut j) = (0, 0);
        while i < acc.len() && j < list.len() {
            match acc[i].cmp(&list[j].doc_id) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    kept.push(acc[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        acc = kept;
    }
    acc
}
