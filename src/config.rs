use std::path::PathBuf;
use std::time::Duration;

use time::OffsetDateTime;

use crate::hedge::FieldTag;

pub const DEFAULT_EMAIL: &str = "whimar@ohsu.edu";
pub const DEFAULT_TOOL: &str = "FetalSurgerySearch";
pub const DEFAULT_MESH_DIR: &str = "mesh-terms";
pub const DEFAULT_KEYWORD_DIR: &str = "keywords";
pub const DEFAULT_TARGET_DIR: &str = "target";
/// Upper bound on records fetched per query variant.
pub const DEFAULT_MAX_RESULTS: usize = 210_000;
/// NCBI allows three E-utilities requests per second without an API key.
pub const EUTILS_REQUEST_INTERVAL: Duration = Duration::from_millis(334);
pub const DEFAULT_FIELD_TAGS: [&str; 2] = ["[tw]", "[tiab]"];
pub const EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
pub const OPENALEX_BASE: &str = "https://api.openalex.org";

/// An institution's OpenURL resolver, rendered as one hyperlink column per table.
///
/// `openurl` is everything before the pmid, e.g. `...?sid=Entrez:PubMed&id=pmid:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryLink {
    pub name: String,
    pub openurl: String,
}

impl LibraryLink {
    pub fn new(name: &str, openurl: &str) -> Self {
        Self {
            name: name.to_string(),
            openurl: openurl.to_string(),
        }
    }
}

fn default_libraries() -> Vec<LibraryLink> {
    vec![
        LibraryLink::new(
            "ohsu library",
            "https://librarysearch.ohsu.edu/openurl/OHSU/OHSU?sid=Entrez:PubMed&id=pmid:",
        ),
        LibraryLink::new(
            "rush library",
            "https://i-share-rsh.primo.exlibrisgroup.com/openurl/01CARLI_RSH/01CARLI_RSH:CARLI_RSH?sid=Entrez:PubMed&id=pmid:",
        ),
    ]
}

/// Everything a run needs, passed explicitly to each component.
#[derive(Debug, Clone)]
pub struct Config {
    /// Contact address sent to E-utilities and OpenAlex.
    pub email: String,
    /// Tool name sent to E-utilities.
    pub tool: String,
    pub mesh_dir: PathBuf,
    pub keyword_dir: PathBuf,
    /// Root of the `csv/`, `hedges/`, `pmid/` and `queries/` output tree.
    pub target_dir: PathBuf,
    pub field_tags: Vec<FieldTag>,
    pub max_results: usize,
    pub libraries: Vec<LibraryLink>,
    /// `YYYYMMDD` prefix of every artifact written during the run.
    pub datestamp: String,
    pub eutils_base: String,
    /// Minimum spacing between E-utilities requests.
    pub request_interval: Duration,
    pub openalex_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            email: DEFAULT_EMAIL.to_string(),
            tool: DEFAULT_TOOL.to_string(),
            mesh_dir: PathBuf::from(DEFAULT_MESH_DIR),
            keyword_dir: PathBuf::from(DEFAULT_KEYWORD_DIR),
            target_dir: PathBuf::from(DEFAULT_TARGET_DIR),
            field_tags: default_field_tags(),
            max_results: DEFAULT_MAX_RESULTS,
            libraries: default_libraries(),
            datestamp: today_stamp(),
            eutils_base: EUTILS_BASE.to_string(),
            request_interval: EUTILS_REQUEST_INTERVAL,
            openalex_base: OPENALEX_BASE.to_string(),
        }
    }
}

pub fn default_field_tags() -> Vec<FieldTag> {
    DEFAULT_FIELD_TAGS
        .iter()
        .filter_map(|t| t.parse().ok())
        .collect()
}

/// Today's date as `YYYYMMDD`, local time when the offset is known, UTC otherwise.
pub fn today_stamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    datestamp(now)
}

fn datestamp(at: OffsetDateTime) -> String {
    format!(
        "{:04}{:02}{:02}",
        at.year(),
        u8::from(at.month()),
        at.day()
    )
}
