use crate::extract::{extract_terms, FieldWeights};
use crate::persist::{self, IndexPaths, PostingsWriter, FORMAT_VERSION};
use crate::{term_weight, DocId, IndexStats, LexiconEntry, Posting, RawDocument, Result, MIN_DOC_LENGTH};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use time::format_description::well_known::Rfc3339;

const PROGRESS_EVERY: usize = 100;

/// Outcome of a build. Per-input failures only show up here as counts.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub inputs_seen: usize,
    pub documents_indexed: usize,
    pub duplicates: usize,
    pub parse_errors: usize,
    pub read_errors: usize,
    pub stats: IndexStats,
}

/// Accumulates postings in memory while streaming a corpus, then writes the index.
pub struct IndexBuilder {
    paths: IndexPaths,
    weights: FieldWeights,
    postings: HashMap<String, Vec<Posting>>,
    doc_lookup: BTreeMap<DocId, String>,
    doc_lengths: BTreeMap<DocId, f64>,
    seen_urls: HashMap<String, DocId>,
    inputs_seen: usize,
    duplicates: usize,
    parse_errors: usize,
    read_errors: usize,
}

impl IndexBuilder {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            paths: IndexPaths::new(output_dir),
            weights: FieldWeights::default(),
            postings: HashMap::new(),
            doc_lookup: BTreeMap::new(),
            doc_lengths: BTreeMap::new(),
            seen_urls: HashMap::new(),
            inputs_seen: 0,
            duplicates: 0,
            parse_errors: 0,
            read_errors: 0,
        }
    }

    pub fn with_field_weights(mut self, weights: FieldWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn num_documents(&self) -> usize {
        self.doc_lookup.len()
    }

    /// Index one page. Returns `None` if its URL was already indexed.
    pub fn add_document(&mut self, url: &str, html: &str) -> Option<DocId> {
        if self.seen_urls.contains_key(url) {
            self.duplicates += 1;
            tracing::debug!(url, "skipping duplicate url");
            return None;
        }
        let doc_id = self.doc_lookup.len() as DocId;
        self.seen_urls.insert(url.to_string(), doc_id);
        self.doc_lookup.insert(doc_id, url.to_string());

        let mut length = 0.0;
        for (term, stats) in extract_terms(html, &self.weights) {
            let w = term_weight(stats.weighted_tf);
            length += w * w;
            self.postings.entry(term).or_default().push(Posting {
                doc_id,
                weighted_tf: stats.weighted_tf,
                raw_tf: stats.raw_tf,
                avg_position: stats.avg_position(),
            });
        }
        self.doc_lengths.insert(doc_id, f64::max(length, MIN_DOC_LENGTH));
        Some(doc_id)
    }

    /// Consume a corpus and write the index.
    ///
    /// Unreadable or malformed inputs are counted and skipped; any other error aborts the build.
    pub fn build<I>(mut self, corpus: I) -> Result<BuildReport>
    where
        I: IntoIterator<Item = Result<RawDocument>>,
    {
        tracing::info!(output = %self.paths.root.display(), "building index");
        for item in corpus {
            self.inputs_seen += 1;
            match item {
                Ok(doc) => {
                    self.add_document(&doc.url, &doc.html);
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(error = %e, "skipping corpus input");
                    if matches!(e, crate::IndexError::DocumentParse { .. }) {
                        self.parse_errors += 1;
                    } else {
                        self.read_errors += 1;
                    }
                }
                Err(e) => return Err(e),
            }
            if self.inputs_seen % PROGRESS_EVERY == 0 {
                tracing::info!(inputs = self.inputs_seen, documents = self.num_documents(), "progress");
            }
        }
        self.finish()
    }

    /// Write postings, lexicon, doc lookup, doc lengths, and finally stats.json.
    pub fn finish(self) -> Result<BuildReport> {
        let Self {
            paths,
            mut postings,
            doc_lookup,
            doc_lengths,
            inputs_seen,
            duplicates,
            parse_errors,
            read_errors,
            ..
        } = self;
        persist::invalidate(&paths)?;

        let mut terms: Vec<String> = postings.keys().cloned().collect();
        terms.sort_unstable();

        let mut writer = PostingsWriter::create(&paths)?;
        let mut lexicon: Vec<LexiconEntry> = Vec::with_capacity(terms.len());
        for term in terms {
            let Some(mut plist) = postings.remove(&term) else { continue };
            plist.sort_by_key(|p| p.doc_id);
            let (offset, length) = writer.append(&plist)?;
            lexicon.push(LexiconEntry { term, doc_freq: plist.len() as u32, offset, length });
        }
        writer.commit()?;

        persist::save_lexicon(&paths, &lexicon)?;
        persist::save_doc_lookup(&paths, &doc_lookup)?;
        persist::save_doc_lengths(&paths, &doc_lengths)?;

        // stats.json is not counted in its own size
        let index_size_bytes = paths.total_size();
        let stats = IndexStats {
            num_documents: doc_lookup.len() as u32,
            num_unique_terms: lexicon.len() as u32,
            index_size_bytes,
            index_size_kb: (index_size_bytes as f64 / 1024.0 * 100.0).round() / 100.0,
            created_at: time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
            version: FORMAT_VERSION,
        };
        persist::save_stats(&paths, &stats)?;

        tracing::info!(
            num_documents = stats.num_documents,
            num_terms = stats.num_unique_terms,
            size_kb = stats.index_size_kb,
            "index build complete"
        );
        Ok(BuildReport {
            inputs_seen,
            documents_indexed: doc_lookup.len(),
            duplicates,
            parse_errors,
            read_errors,
            stats,
        })
    }
}
