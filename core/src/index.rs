use serde::{Deserialize, Serialize};

pub type DocId = u32;

/// Lower bound for a document's normalization length.
pub const MIN_DOC_LENGTH: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    /// Occurrence score after structural-tag boosts.
    pub weighted_tf: f64,
    pub raw_tf: u32,
    pub avg_position: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub term: String,
    pub doc_freq: u32,
    /// Byte offset of the term's block in postings.bin
    pub offset: u64,
    /// Byte length of that block
    pub length: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: DocId,
    pub url: String,
    pub length: f64,
}

/// Summary written to stats.json. Derived from the other artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub num_documents: u32,
    pub num_unique_terms: u32,
    pub index_size_bytes: u64,
    pub index_size_kb: f64,
    pub created_at: String,
    pub version: u32,
}

/// Log-dampened weight of a term in a document: `1 + ln(1 + weighted_tf)`.
///
/// The squares of these weights summed over a document's terms give its
/// normalization length, so the same function must be used at build time.
pub fn term_weight(weighted_tf: f64) -> f64 {
    1.0 + weighted_tf.ln_1p()
}
