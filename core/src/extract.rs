//! Field-weighted term extraction from HTML.
//!
//! Visible text is counted once at the base weight. Text inside weighted tags
//! is then tokenized again and contributes its tag weight on top, so a term in
//! a heading carries both its base count and the heading boost.

use crate::tokenizer::tokenize_and_stem;
use scraper::{Html, Node, Selector};
use std::collections::BTreeMap;

const HIDDEN_PARENTS: [&str; 3] = ["script", "style", "noscript"];

/// Per-document statistics for one term.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStats {
    pub weighted_tf: f64,
    pub raw_tf: u32,
    /// 1-based positions of the term's visible occurrences
    pub positions: Vec<u32>,
}

impl TokenStats {
    /// Mean position, or 1.0 when there are none.
    pub fn avg_position(&self) -> f64 {
        let sum: f64 = self.positions.iter().map(|&p| p as f64).sum();
        sum / self.positions.len().max(1) as f64
    }
}

#[derive(Debug, Clone)]
pub struct FieldWeights {
    pub base: f64,
    /// Extra weight added per token inside each tag, applied in this order.
    pub tags: Vec<(String, f64)>,
}

impl Default for FieldWeights {
    fn default() -> Self {
        let tags = [("title", 4.0), ("h1", 3.0), ("h2", 2.5), ("h3", 2.0), ("strong", 1.75), ("b", 1.75)];
        Self {
            base: 1.0,
            tags: tags.iter().map(|(t, w)| (t.to_string(), *w)).collect(),
        }
    }
}

/// Per-term statistics for a page, keyed and iterated in term order.
pub fn extract_terms(html: &str, weights: &FieldWeights) -> BTreeMap<String, TokenStats> {
    let doc = Html::parse_document(html);
    let mut stats: BTreeMap<String, TokenStats> = BTreeMap::new();
    let mut position: u32 = 0;

    for node in doc.tree.root().descendants() {
        let Node::Text(text) = node.value() else { continue };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element())
            .map_or(false, |el| HIDDEN_PARENTS.contains(&el.name()));
        if hidden {
            continue;
        }
        for term in tokenize_and_stem(text) {
            position += 1;
            let entry = stats.entry(term).or_default();
            entry.raw_tf += 1;
            entry.weighted_tf += weights.base;
            entry.positions.push(position);
        }
    }

    for (tag, boost) in &weights.tags {
        let Ok(selector) = Selector::parse(tag) else {
            tracing::warn!(tag = %tag, "ignoring unparsable weighted tag");
            continue;
        };
        for el in doc.select(&selector) {
            let text = el.text().collect::<Vec<_>>().join(" ");
            for term in tokenize_and_stem(&text) {
                stats.entry(term).or_default().weighted_tf += boost;
            }
        }
    }

    stats
}
