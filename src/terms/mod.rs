//! Term-set loading: one file per building block, MeSH and keyword directories
//! paired by block name.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum TermsError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no term files found in {0}")]
    Empty(PathBuf),

    #[error("term file {0} has no terms")]
    NoTerms(PathBuf),

    #[error("block '{block}' is defined twice in {dir}")]
    DuplicateBlock { block: String, dir: PathBuf },

    #[error(
        "MeSH and keyword blocks do not match (only in MeSH: [{}]; only in keywords: [{}])",
        .mesh_only.join(", "),
        .keyword_only.join(", ")
    )]
    BlockMismatch {
        mesh_only: Vec<String>,
        keyword_only: Vec<String>,
    },
}

/// Block name → sorted, de-duplicated terms.
pub type TermSets = BTreeMap<String, Vec<String>>;

/// One building block with both of its term lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTerms {
    pub block: String,
    pub mesh: Vec<String>,
    pub keywords: Vec<String>,
}

/// Split file content into terms: one per line, trimmed, blanks dropped,
/// sorted and de-duplicated.
pub fn parse_terms(content: &str) -> Vec<String> {
    let mut terms: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();
    terms.sort();
    terms.dedup();
    terms
}

/// Read every regular, non-hidden file in `dir` as a block named after its stem.
pub fn load_dir(dir: &Path) -> Result<TermSets, TermsError> {
    let io_err = |source| TermsError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut sets = TermSets::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if !path.is_file() {
            continue;
        }
        let Some(block) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if block.is_empty() || block.starts_with('.') {
            continue;
        }

        let content = fs::read_to_string(&path).map_err(|source| TermsError::Io {
            path: path.clone(),
            source,
        })?;
        let terms = parse_terms(&content);
        if terms.is_empty() {
            return Err(TermsError::NoTerms(path));
        }
        debug!(file = %path.display(), block, terms = terms.len(), "term file");

        if sets.insert(block.to_string(), terms).is_some() {
            return Err(TermsError::DuplicateBlock {
                block: block.to_string(),
                dir: dir.to_path_buf(),
            });
        }
    }

    if sets.is_empty() {
        return Err(TermsError::Empty(dir.to_path_buf()));
    }
    Ok(sets)
}

/// Pair MeSH and keyword sets by block name, failing when either side has a
/// block the other lacks.
pub fn pair_blocks(mesh: TermSets, mut keywords: TermSets) -> Result<Vec<BlockTerms>, TermsError> {
    let mesh_only: Vec<String> = mesh
        .keys()
        .filter(|block| !keywords.contains_key(*block))
        .cloned()
        .collect();
    let keyword_only: Vec<String> = keywords
        .keys()
        .filter(|block| !mesh.contains_key(*block))
        .cloned()
        .collect();
    if !mesh_only.is_empty() || !keyword_only.is_empty() {
        return Err(TermsError::BlockMismatch {
            mesh_only,
            keyword_only,
        });
    }

    Ok(mesh
        .into_iter()
        .filter_map(|(block, mesh)| {
            keywords.remove(&block).map(|keywords| BlockTerms {
                block,
                mesh,
                keywords,
            })
        })
        .collect())
}

/// Load and pair both term directories. Blocks come back sorted by name.
pub fn load_blocks(mesh_dir: &Path, keyword_dir: &Path) -> Result<Vec<BlockTerms>, TermsError> {
    let mesh = load_dir(mesh_dir)?;
    let keywords = load_dir(keyword_dir)?;
    let blocks = pair_blocks(mesh, keywords)?;
    info!(
        blocks = blocks.len(),
        names = %blocks.iter().map(|b| b.block.as_str()).collect::<Vec<_>>().join(", "),
        "term sets loaded"
    );
    Ok(blocks)
}
