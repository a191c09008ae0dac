pub mod builder;
pub mod cache;
pub mod corpus;
pub mod error;
pub mod extract;
mod index;
pub mod persist;
pub mod reader;
pub mod search;
pub mod tokenizer;

pub use builder::{BuildReport, IndexBuilder};
pub use corpus::{Corpus, RawDocument};
pub use error::{IndexError, Result};
pub use extract::{FieldWeights, TokenStats};
pub use index::*;
pub use reader::IndexReader;
pub use search::{SearchEngine, SearchResult};
