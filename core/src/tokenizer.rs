use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{N}]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Tokenize text into (term, position) using NFKC normalization, lowercase, and stemming.
///
/// Positions are 0-based offsets among the alphanumeric runs of `text`.
/// Builder and query engine both go through here, so terms always match.
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    RE.find_iter(&normalized)
        .enumerate()
        .map(|(pos, mat)| (STEMMER.stem(mat.as_str()).into_owned(), pos))
        .collect()
}

pub fn tokenize_and_stem(text: &str) -> Vec<String> {
    tokenize(text).into_iter().map(|(term, _)| term).collect()
}
