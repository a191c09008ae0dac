use crate::cache::LazyCache;
use crate::persist::{self, IndexPaths};
use crate::{DocId, Document, IndexError, IndexStats, LexiconEntry, Posting, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// Read-only access to an index on disk.
///
/// The lexicon and per-document maps are loaded on first use and kept for
/// the life of the reader. Postings are never cached: every lookup reads
/// the term's block from postings.bin with its own file handle, so a reader
/// can be shared across threads.
pub struct IndexReader {
    paths: IndexPaths,
    lexicon: LazyCache<HashMap<String, LexiconEntry>>,
    doc_lookup: LazyCache<BTreeMap<DocId, String>>,
    doc_lengths: LazyCache<BTreeMap<DocId, f64>>,
    stats: LazyCache<IndexStats>,
}

impl IndexReader {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let paths = IndexPaths::new(dir);
        paths.ensure_complete()?;
        Ok(Self {
            paths,
            lexicon: LazyCache::new(),
            doc_lookup: LazyCache::new(),
            doc_lengths: LazyCache::new(),
            stats: LazyCache::new(),
        })
    }

    pub fn load_lexicon(&self) -> Result<Arc<HashMap<String, LexiconEntry>>> {
        self.lexicon.get_or_load(|| {
            let entries = persist::load_lexicon(&self.paths)?;
            tracing::info!(terms = entries.len(), "lexicon loaded");
            Ok::<_, IndexError>(entries.into_iter().map(|e| (e.term.clone(), e)).collect())
        })
    }

    fn doc_lookup(&self) -> Result<Arc<BTreeMap<DocId, String>>> {
        self.doc_lookup.get_or_load(|| {
            let lookup = persist::load_doc_lookup(&self.paths)?;
            tracing::info!(documents = lookup.len(), "document lookup loaded");
            Ok::<_, IndexError>(lookup)
        })
    }

    fn doc_lengths(&self) -> Result<Arc<BTreeMap<DocId, f64>>> {
        self.doc_lengths.get_or_load(|| {
            let lengths = persist::load_doc_lengths(&self.paths)?;
            tracing::info!(documents = lengths.len(), "document lengths loaded");
            Ok::<_, IndexError>(lengths)
        })
    }

    pub fn stats(&self) -> Result<Arc<IndexStats>> {
        self.stats.get_or_load(|| persist::load_stats(&self.paths))
    }

    /// Lexicon entries in term order.
    pub fn lexicon_entries(&self) -> Result<Vec<LexiconEntry>> {
        let mut entries: Vec<LexiconEntry> = self.load_lexicon()?.values().cloned().collect();
        entries.sort_by(|a, b| a.term.cmp(&b.term));
        Ok(entries)
    }

    /// Postings for `term` sorted by doc id. Unknown terms give an empty list.
    pub fn get_postings(&self, term: &str) -> Result<Vec<Posting>> {
        let lexicon = self.load_lexicon()?;
        let Some(entry) = lexicon.get(term) else {
            return Ok(Vec::new());
        };
        let postings = persist::read_postings_block(&self.paths, entry)?;
        if postings.len() != entry.doc_freq as usize {
            return Err(IndexError::Corrupt(format!(
                "term {:?}: lexicon says {} postings, block has {}",
                term,
                entry.doc_freq,
                postings.len()
            )));
        }
        Ok(postings)
    }

    pub fn get_doc_frequency(&self, term: &str) -> Result<u32> {
        Ok(self.load_lexicon()?.get(term).map_or(0, |e| e.doc_freq))
    }

    pub fn get_url(&self, doc_id: DocId) -> Result<Option<String>> {
        Ok(self.doc_lookup()?.get(&doc_id).cloned())
    }

    /// Normalization length of a document, 1.0 if the index has none recorded.
    pub fn get_doc_length(&self, doc_id: DocId) -> Result<f64> {
        let lengths = self.doc_lengths()?;
        Ok(match lengths.get(&doc_id) {
            Some(&len) => len,
            None => {
                tracing::warn!(doc_id, "no length recorded for document");
                1.0
            }
        })
    }

    pub fn get_document(&self, doc_id: DocId) -> Result<Option<Document>> {
        let Some(url) = self.get_url(doc_id)? else {
            return Ok(None);
        };
        let length = self.get_doc_length(doc_id)?;
        Ok(Some(Document { doc_id, url, length }))
    }

    /// Number of indexed documents, counted from doc_lengths.
    pub fn num_documents(&self) -> Result<u32> {
        Ok(self.doc_lengths()?.len() as u32)
    }

    /// `ln(N / df)`, or 0.0 for a term that appears nowhere.
    pub fn compute_idf(&self, term: &str) -> Result<f64> {
        let df = self.get_doc_frequency(term)?;
        if df == 0 {
            return Ok(0.0);
        }
        let n = self.num_documents()?;
        Ok((n as f64 / df as f64).ln())
    }
}
