#![allow(dead_code)]

use std::path::Path;
use webdex_core::{BuildReport, IndexBuilder, RawDocument};

pub fn doc(url: &str, html: &str) -> webdex_core::Result<RawDocument> {
    Ok(RawDocument { url: url.to_string(), html: html.to_string() })
}

/// The two-page corpus: a titled cat page and a plain page.
pub fn cat_dog_corpus() -> Vec<webdex_core::Result<RawDocument>> {
    vec![
        doc("http://example.com/0", "<title>Cat</title><p>dog dog</p>"),
        doc("http://example.com/1", "<p>cat cat dog</p>"),
    ]
}

pub fn build(dir: &Path, corpus: Vec<webdex_core::Result<RawDocument>>) -> BuildReport {
    IndexBuilder::new(dir).build(corpus).unwrap()
}
