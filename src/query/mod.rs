//! Query composition: per-block hedges combined into the fixed set of named
//! query variants.
//!
//! Every operand is parenthesized before it is joined, so operator precedence
//! never depends on what the hedge itself contains.

use crate::hedge::FieldTag;

/// Subset filter removing MEDLINE-indexed citations.
pub const MEDLINE_SUBSET: &str = "medline[sb]";

/// The named query combinations produced by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variant {
    /// All MeSH hedges ANDed. Independent of the field tag, run once.
    Mesh,
    /// All keyword hedges ANDed.
    Keyword(FieldTag),
    /// Each keyword hedge minus the MEDLINE subset, then ANDed.
    KeywordNotMedline(FieldTag),
    /// Each block's MeSH and keyword hedges ORed, then ANDed across blocks.
    MeshKeyword(FieldTag),
    /// The whole MeSH query ORed with the whole keyword query.
    MeshOrKeyword(FieldTag),
    /// The whole MeSH query ORed with the whole keyword-NOT-MEDLINE query.
    MeshOrKeywordNotMedline(FieldTag),
}

impl Variant {
    /// Label embedded in artifact filenames.
    pub fn label(&self) -> String {
        match self {
            Variant::Mesh => "mesh".to_string(),
            Variant::Keyword(tag) => format!("keyword{tag}"),
            Variant::KeywordNotMedline(tag) => format!("keyword{tag}NOTmedline"),
            Variant::MeshKeyword(tag) => format!("mesh-keyword{tag}"),
            Variant::MeshOrKeyword(tag) => format!("meshORkeyword{tag}"),
            Variant::MeshOrKeywordNotMedline(tag) => format!("meshORkeyword{tag}NOTmedline"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub variant: Variant,
    pub text: String,
}

impl Query {
    pub fn label(&self) -> String {
        self.variant.label()
    }
}

/// The hedges derived from one block for one field tag.
///
/// `keyword_not_medline` and `mesh_or_keyword` are counted and written as
/// hedges in their own right before they are composed into queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHedges {
    pub block: String,
    pub keyword: String,
    pub keyword_not_medline: String,
    pub mesh_or_keyword: String,
}

impl BlockHedges {
    pub fn new(block: &str, mesh: &str, keyword: &str) -> Self {
        Self {
            block: block.to_string(),
            keyword: keyword.to_string(),
            keyword_not_medline: not_medline(keyword),
            mesh_or_keyword: or_pair(mesh, keyword),
        }
    }
}

/// `(a) AND (b) AND ...`, in the order given.
pub fn and_all<I, S>(operands: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    operands
        .into_iter()
        .map(|op| format!("({})", op.as_ref()))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// `(a) OR (b)`.
pub fn or_pair(a: &str, b: &str) -> String {
    format!("({a}) OR ({b})")
}

/// `(hedge) NOT (medline[sb])`.
pub fn not_medline(hedge: &str) -> String {
    format!("({hedge}) NOT ({MEDLINE_SUBSET})")
}

/// The MeSH-only query from every block's MeSH hedge, in block order.
pub fn mesh_query<S: AsRef<str>>(mesh_hedges: &[S]) -> Query {
    Query {
        variant: Variant::Mesh,
        text: and_all(mesh_hedges),
    }
}

/// The five keyword-bearing variants for one field tag.
///
/// `blocks` must be in block order; `mesh` is the query from [`mesh_query`].
pub fn keyword_queries(mesh: &Query, blocks: &[BlockHedges], tag: &FieldTag) -> Vec<Query> {
    let keyword = and_all(blocks.iter().map(|b| &b.keyword));
    let keyword_not_medline = and_all(blocks.iter().map(|b| &b.keyword_not_medline));
    let mesh_keyword = and_all(blocks.iter().map(|b| &b.mesh_or_keyword));
    let mesh_or_keyword = or_pair(&mesh.text, &keyword);
    let mesh_or_keyword_not_medline = or_pair(&mesh.text, &keyword_not_medline);

    vec![
        Query {
            variant: Variant::Keyword(tag.clone()),
            text: keyword,
        },
        Query {
            variant: Variant::KeywordNotMedline(tag.clone()),
            text: keyword_not_medline,
        },
        Query {
            variant: Variant::MeshKeyword(tag.clone()),
            text: mesh_keyword,
        },
        Query {
            variant: Variant::MeshOrKeyword(tag.clone()),
            text: mesh_or_keyword,
        },
        Query {
            variant: Variant::MeshOrKeywordNotMedline(tag.clone()),
            text: mesh_or_keyword_not_medline,
        },
    ]
}
