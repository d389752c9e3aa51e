//! Hedge construction: one block's terms joined into a single boolean-OR expression.

mod tag;

pub use tag::FieldTag;

use std::collections::BTreeSet;

/// How a block's terms are matched against PubMed record fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// MeSH headings, used verbatim. The term files carry their own `[mh]` tags.
    Mesh,
    /// Free-text keywords, every word suffixed with the field tag.
    Keyword(FieldTag),
}

impl Strategy {
    /// Label embedded in artifact filenames: `mesh`, `keyword[tw]`, ...
    pub fn label(&self) -> String {
        match self {
            Strategy::Mesh => "mesh".to_string(),
            Strategy::Keyword(tag) => format!("keyword{tag}"),
        }
    }
}

/// A counted hedge, as written to `hedges/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hedge {
    pub block: String,
    pub label: String,
    pub text: String,
    pub count: u64,
}

/// Join `terms` with `OR` under `strategy`.
///
/// Terms are trimmed, blank ones dropped, then de-duplicated and sorted so the
/// output is stable across runs.
pub fn build_hedge<S: AsRef<str>>(terms: &[S], strategy: &Strategy) -> String {
    let unique: BTreeSet<&str> = terms
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .collect();

    unique
        .into_iter()
        .map(|term| match strategy {
            Strategy::Mesh => term.to_string(),
            Strategy::Keyword(tag) => tag_term(term, tag),
        })
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Multi-word terms become an adjacency group with every word tagged;
/// quoted phrases and single words take the tag as a whole.
fn tag_term(term: &str, tag: &FieldTag) -> String {
    if term.contains(char::is_whitespace) && !term.contains('"') {
        let words: Vec<String> = term
            .split_whitespace()
            .map(|word| format!("{word}{tag}"))
            .collect();
        format!("({})", words.join(" "))
    } else {
        format!("{term}{tag}")
    }
}
