use crate::{DocId, IndexError, IndexStats, LexiconEntry, Posting, Result};
use std::collections::BTreeMap;
use std::fs::{self, create_dir_all, File};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

const POSTINGS: &str = "postings.bin";
const LEXICON: &str = "lexicon.bin";
const DOC_LOOKUP: &str = "doc_lookup.bin";
const DOC_LENGTHS: &str = "doc_lengths.bin";
const STATS: &str = "stats.json";

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn postings(&self) -> PathBuf { self.root.join(POSTINGS) }
    pub fn lexicon(&self) -> PathBuf { self.root.join(LEXICON) }
    pub fn doc_lookup(&self) -> PathBuf { self.root.join(DOC_LOOKUP) }
    pub fn doc_lengths(&self) -> PathBuf { self.root.join(DOC_LENGTHS) }
    pub fn stats(&self) -> PathBuf { self.root.join(STATS) }

    /// All five artifacts in write order. stats.json comes last and marks a complete build.
    pub fn artifacts(&self) -> [(&'static str, PathBuf); 5] {
        [
            (POSTINGS, self.postings()),
            (LEXICON, self.lexicon()),
            (DOC_LOOKUP, self.doc_lookup()),
            (DOC_LENGTHS, self.doc_lengths()),
            (STATS, self.stats()),
        ]
    }

    /// Fails with `IndexNotFound` naming the first missing artifact.
    pub fn ensure_complete(&self) -> Result<()> {
        for (name, path) in self.artifacts() {
            if !path.is_file() {
                return Err(IndexError::IndexNotFound { dir: self.root.clone(), artifact: name });
            }
        }
        Ok(())
    }

    /// Size in bytes of the artifacts that exist on disk.
    pub fn total_size(&self) -> u64 {
        self.artifacts()
            .iter()
            .filter_map(|(_, p)| fs::metadata(p).ok())
            .map(|m| m.len())
            .sum()
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `bytes` next to `path` and rename over it once flushed.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);
    let mut f = File::create(&tmp)?;
    f.write_all(bytes)?;
    f.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Drop the commit marker so a half-rewritten directory is never opened as an index.
pub fn invalidate(paths: &IndexPaths) -> Result<()> {
    create_dir_all(&paths.root)?;
    match fs::remove_file(paths.stats()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Appends one serialized block per term to postings.bin and reports where each landed.
pub struct PostingsWriter {
    out: BufWriter<File>,
    tmp: PathBuf,
    dest: PathBuf,
    offset: u64,
}

impl PostingsWriter {
    pub fn create(paths: &IndexPaths) -> Result<Self> {
        create_dir_all(&paths.root)?;
        let dest = paths.postings();
        let tmp = tmp_path(&dest);
        let out = BufWriter::new(File::create(&tmp)?);
        Ok(Self { out, tmp, dest, offset: 0 })
    }

    /// Returns `(offset, length)` of the block just written.
    pub fn append(&mut self, postings: &[Posting]) -> Result<(u64, u64)> {
        let bytes = bincode::serialize(postings)?;
        self.out.write_all(&bytes)?;
        let start = self.offset;
        self.offset += bytes.len() as u64;
        Ok((start, bytes.len() as u64))
    }

    #[cfg(test)]
    fn bytes_written(&self) -> u64 { self.offset }

    pub fn commit(self) -> Result<()> {
        let f = self.out.into_inner().map_err(|e| e.into_error())?;
        f.sync_all()?;
        fs::rename(&self.tmp, &self.dest)?;
        Ok(())
    }
}

/// Read exactly one term's block. Opens its own handle so concurrent callers never share a cursor.
pub fn read_postings_block(paths: &IndexPaths, entry: &LexiconEntry) -> Result<Vec<Posting>> {
    let mut f = File::open(paths.postings())?;
    let file_len = f.metadata()?.len();
    let end = entry.offset.checked_add(entry.length);
    if end.map_or(true, |end| end > file_len) {
        return Err(IndexError::Corrupt(format!(
            "block for {:?} at {}+{} exceeds postings size {}",
            entry.term, entry.offset, entry.length, file_len
        )));
    }
    f.seek(SeekFrom::Start(entry.offset))?;
    let mut buf = vec![0u8; entry.length as usize];
    f.read_exact(&mut buf)?;
    let postings: Vec<Posting> = bincode::deserialize(&buf)
        .map_err(|e| IndexError::Corrupt(format!("block for {:?}: {e}", entry.term)))?;
    Ok(postings)
}

pub fn save_lexicon(paths: &IndexPaths, lexicon: &[LexiconEntry]) -> Result<()> {
    let bytes = bincode::serialize(lexicon)?;
    write_atomic(&paths.lexicon(), &bytes)
}

pub fn load_lexicon(paths: &IndexPaths) -> Result<Vec<LexiconEntry>> {
    let buf = fs::read(paths.lexicon())?;
    let lexicon = bincode::deserialize(&buf)?;
    Ok(lexicon)
}

pub fn save_doc_lookup(paths: &IndexPaths, lookup: &BTreeMap<DocId, String>) -> Result<()> {
    let bytes = bincode::serialize(lookup)?;
    write_atomic(&paths.doc_lookup(), &bytes)
}

pub fn load_doc_lookup(paths: &IndexPaths) -> Result<BTreeMap<DocId, String>> {
    let buf = fs::read(paths.doc_lookup())?;
    let lookup = bincode::deserialize(&buf)?;
    Ok(lookup)
}

pub fn save_doc_lengths(paths: &IndexPaths, lengths: &BTreeMap<DocId, f64>) -> Result<()> {
    let bytes = bincode::serialize(lengths)?;
    write_atomic(&paths.doc_lengths(), &bytes)
}

pub fn load_doc_lengths(paths: &IndexPaths) -> Result<BTreeMap<DocId, f64>> {
    let buf = fs::read(paths.doc_lengths())?;
    let lengths = bincode::deserialize(&buf)?;
    Ok(lengths)
}

pub fn save_stats(paths: &IndexPaths, stats: &IndexStats) -> Result<()> {
    let json = serde_json::to_string_pretty(stats)?;
    write_atomic(&paths.stats(), json.as_bytes())
}

pub fn load_stats(paths: &IndexPaths) -> Result<IndexStats> {
    let buf = fs::read_to_string(paths.stats())?;
    let stats: IndexStats = serde_json::from_str(&buf)?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn posting(doc_id: DocId) -> Posting {
        Posting { doc_id, weighted_tf: 1.5, raw_tf: 1, avg_position: 3.0 }
    }

    #[test]
    fn blocks_are_addressable_by_offset() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let mut w = PostingsWriter::create(&paths).unwrap();
        let a = vec![posting(0), posting(2)];
        let b = vec![posting(1)];
        let (off_a, len_a) = w.append(&a).unwrap();
        let (off_b, len_b) = w.append(&b).unwrap();
        assert_eq!(off_a, 0);
        assert_eq!(off_b, len_a);
        assert_eq!(w.bytes_written(), len_a + len_b);
        w.commit().unwrap();
        assert!(!tmp_path(&paths.postings()).exists());

        let entry_b = LexiconEntry { term: "b".into(), doc_freq: 1, offset: off_b, length: len_b };
        assert_eq!(read_postings_block(&paths, &entry_b).unwrap(), b);
        let entry_a = LexiconEntry { term: "a".into(), doc_freq: 2, offset: off_a, length: len_a };
        assert_eq!(read_postings_block(&paths, &entry_a).unwrap(), a);
    }

    #[test]
    fn out_of_range_block_is_corrupt() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let mut w = PostingsWriter::create(&paths).unwrap();
        w.append(&[posting(0)]).unwrap();
        w.commit().unwrap();
        let bogus = LexiconEntry { term: "x".into(), doc_freq: 1, offset: 4, length: 1 << 20 };
        assert!(matches!(read_postings_block(&paths, &bogus), Err(IndexError::Corrupt(_))));
    }

    #[test]
    fn ensure_complete_names_missing_artifact() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        save_lexicon(&paths, &[]).unwrap();
        match paths.ensure_complete() {
            Err(IndexError::IndexNotFound { artifact, .. }) => assert_eq!(artifact, "postings.bin"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn invalidate_removes_stats_only() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        save_lexicon(&paths, &[]).unwrap();
        let stats = IndexStats {
            num_documents: 0,
            num_unique_terms: 0,
            index_size_bytes: 0,
            index_size_kb: 0.0,
            created_at: String::new(),
            version: FORMAT_VERSION,
        };
        save_stats(&paths, &stats).unwrap();
        assert_eq!(load_stats(&paths).unwrap(), stats);
        invalidate(&paths).unwrap();
        assert!(!paths.stats().exists());
        assert!(paths.lexicon().exists());
        invalidate(&paths).unwrap();
    }
}
