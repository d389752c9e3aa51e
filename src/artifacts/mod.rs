//! Dated, self-describing output files under the target root.
//!
//! Every name is `<date>-<discriminant>-<label>.<ext>`, where the discriminant
//! is a block name plus hit count (hedges), a hit count (queries) or a
//! retained-article count (tables and identifier lists). A rerun on the same
//! day only replaces a file when those counts coincide.

mod links;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::LibraryLink;
use crate::pubmed::Article;
use links::{doi_link, library_link, pubmed_link};

pub const CSV_DIR: &str = "csv";
pub const HEDGES_DIR: &str = "hedges";
pub const PMID_DIR: &str = "pmid";
pub const QUERIES_DIR: &str = "queries";

const BASE_COLUMNS: [&str; 8] = [
    "pmid",
    "title",
    "journal",
    "pubdate",
    "doi",
    "abstract",
    "doi url",
    "pubmed url",
];

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write table {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Paths of the two files written for a retrieved result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleFiles {
    pub table: PathBuf,
    pub pmids: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    root: PathBuf,
    datestamp: String,
    libraries: Vec<LibraryLink>,
}

impl ArtifactWriter {
    /// Create the output tree (root plus its four subdirectories) if missing.
    pub fn create(
        root: impl Into<PathBuf>,
        datestamp: &str,
        libraries: &[LibraryLink],
    ) -> Result<Self, ArtifactError> {
        let root = root.into();
        for dir in [CSV_DIR, HEDGES_DIR, PMID_DIR, QUERIES_DIR] {
            let path = root.join(dir);
            fs::create_dir_all(&path).map_err(|source| ArtifactError::Io { path, source })?;
        }
        Ok(Self {
            root,
            datestamp: datestamp.to_string(),
            libraries: libraries.to_vec(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, dir: &str, name: &str, ext: &str) -> PathBuf {
        self.root
            .join(dir)
            .join(format!("{}-{name}.{ext}", self.datestamp))
    }

    /// `hedges/<date>-<block>-<count>-<label>.txt`, content `(<hedge>)`.
    pub fn write_hedge(
        &self,
        block: &str,
        count: u64,
        label: &str,
        hedge: &str,
    ) -> Result<PathBuf, ArtifactError> {
        let path = self.path(HEDGES_DIR, &format!("{block}-{count}-{label}"), "txt");
        write_file(&path, format!("({hedge})").as_bytes())?;
        Ok(path)
    }

    /// `queries/<date>-<count>-<label>.txt`, content is the raw query.
    pub fn write_query(&self, count: u64, label: &str, query: &str) -> Result<PathBuf, ArtifactError> {
        let path = self.path(QUERIES_DIR, &format!("{count}-{label}"), "txt");
        write_file(&path, query.as_bytes())?;
        Ok(path)
    }

    /// `queries/<date>-<label>-TOOLONG.txt` for queries the service refused to count.
    pub fn write_too_long(&self, label: &str, query: &str) -> Result<PathBuf, ArtifactError> {
        let path = self.path(QUERIES_DIR, &format!("{label}-TOOLONG"), "txt");
        write_file(&path, query.as_bytes())?;
        Ok(path)
    }

    /// Metadata table plus bare identifier list for one query variant.
    pub fn write_articles(&self, label: &str, articles: &[Article]) -> Result<ArticleFiles, ArtifactError> {
        let name = format!("{}-{label}", articles.len());
        let table = self.path(CSV_DIR, &name, "csv");
        let pmids = self.path(PMID_DIR, &name, "txt");

        self.write_table(&table, articles)
            .map_err(|source| ArtifactError::Csv {
                path: table.clone(),
                source,
            })?;

        let mut list = String::new();
        for article in articles {
            list.push_str(&article.pmid);
            list.push('\n');
        }
        write_file(&pmids, list.as_bytes())?;

        debug!(table = %table.display(), pmids = %pmids.display(), rows = articles.len(), "articles written");
        Ok(ArticleFiles { table, pmids })
    }

    fn write_table(&self, path: &Path, articles: &[Article]) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_path(path)?;

        let mut header: Vec<&str> = BASE_COLUMNS.to_vec();
        header.extend(self.libraries.iter().map(|lib| lib.name.as_str()));
        writer.write_record(&header)?;

        for article in articles {
            let mut row = vec![
                article.pmid.clone(),
                article.title.clone(),
                article.journal.clone(),
                article.publication_date.clone(),
                article.doi.clone().unwrap_or_default(),
                article.abstract_text.clone(),
                doi_link(article.doi.as_deref()),
                pubmed_link(&article.pmid),
            ];
            row.extend(
                self.libraries
                    .iter()
                    .map(|lib| library_link(&lib.openurl, &article.pmid)),
            );
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn write_file(path: &Path, content: &[u8]) -> Result<(), ArtifactError> {
    let io_err = |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = fs::File::create(path).map_err(io_err)?;
    file.write_all(content).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn writer(dir: &TempDir) -> ArtifactWriter {
        ArtifactWriter::create(dir.path().join("target"), "20240307", &Config::default().libraries)
            .unwrap()
    }

    fn article(pmid: &str, doi: Option<&str>) -> Article {
        Article {
            pmid: pmid.to_string(),
            title: format!("Title, with \"quotes\" {pmid}"),
            journal: "Fetal Diagn Ther".to_string(),
            publication_date: "2020-01-24".to_string(),
            doi: doi.map(String::from),
            abstract_text: "Line one.\nLine two.".to_string(),
        }
    }

    #[test]
    fn create_builds_output_tree() {
        let dir = TempDir::new().unwrap();
        let w = writer(&dir);
        for sub in [CSV_DIR, HEDGES_DIR, PMID_DIR, QUERIES_DIR] {
            assert!(w.root().join(sub).is_dir(), "missing {sub}/");
        }
    }

    #[test]
    fn hedge_file_name_embeds_block_count_and_label() {
        let dir = TempDir::new().unwrap();
        let w = writer(&dir);
        let path = w
            .write_hedge("condition", 5821, "keyword[tiab]", "a[tiab] OR b[tiab]")
            .unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "20240307-condition-5821-keyword[tiab].txt"
        );
        assert!(path.starts_with(w.root().join(HEDGES_DIR)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "(a[tiab] OR b[tiab])");
    }

    #[test]
    fn query_and_too_long_file_names() {
        let dir = TempDir::new().unwrap();
        let w = writer(&dir);
        let q = w.write_query(42, "mesh", "(A[mh]) AND (B[mh])").unwrap();
        assert_eq!(q.file_name().unwrap().to_str().unwrap(), "20240307-42-mesh.txt");
        assert_eq!(fs::read_to_string(&q).unwrap(), "(A[mh]) AND (B[mh])");

        let t = w.write_too_long("meshORkeyword[tw]", "very long").unwrap();
        assert_eq!(
            t.file_name().unwrap().to_str().unwrap(),
            "20240307-meshORkeyword[tw]-TOOLONG.txt"
        );
    }

    #[test]
    fn table_and_pmid_list_agree() {
        let dir = TempDir::new().unwrap();
        let w = writer(&dir);
        let articles = [article("101", Some("10.1/x")), article("102", None)];
        let files = w.write_articles("keyword[tw]", &articles).unwrap();

        assert_eq!(
            files.table.file_name().unwrap().to_str().unwrap(),
            "20240307-2-keyword[tw].csv"
        );
        assert_eq!(
            files.pmids.file_name().unwrap().to_str().unwrap(),
            "20240307-2-keyword[tw].txt"
        );
        assert_eq!(fs::read_to_string(&files.pmids).unwrap(), "101\n102\n");

        let mut reader = csv::Reader::from_path(&files.table).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            [
                "pmid",
                "title",
                "journal",
                "pubdate",
                "doi",
                "abstract",
                "doi url",
                "pubmed url",
                "ohsu library",
                "rush library"
            ]
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        let table_pmids: Vec<&str> = rows.iter().map(|r| &r[0]).collect();
        let list = fs::read_to_string(&files.pmids).unwrap();
        let listed: Vec<&str> = list.lines().collect();
        assert_eq!(table_pmids, listed);

        assert_eq!(&rows[0][1], "Title, with \"quotes\" 101");
        assert_eq!(&rows[0][5], "Line one.\nLine two.");
        assert_eq!(&rows[0][6], "=HYPERLINK(\"https://doi.org/10.1/x\")");
        assert_eq!(&rows[1][6], "");
        assert_eq!(&rows[1][7], "=HYPERLINK(\"https://www.ncbi.nlm.nih.gov/pubmed/102\")");
        assert!(rows[1][9].ends_with("id=pmid:102\")"));
    }

    #[test]
    fn same_count_overwrites_different_count_does_not() {
        let dir = TempDir::new().unwrap();
        let w = writer(&dir);
        let first = w.write_query(10, "mesh", "first").unwrap();
        let same = w.write_query(10, "mesh", "second").unwrap();
        let other = w.write_query(11, "mesh", "third").unwrap();

        assert_eq!(first, same);
        assert_eq!(fs::read_to_string(&first).unwrap(), "second");
        assert_ne!(first, other);
        assert_eq!(fs::read_dir(w.root().join(QUERIES_DIR)).unwrap().count(), 2);
    }

    #[test]
    fn empty_result_set_still_writes_both_files() {
        let dir = TempDir::new().unwrap();
        let w = writer(&dir);
        let files = w.write_articles("mesh", &[]).unwrap();
        assert!(files.table.ends_with("20240307-0-mesh.csv"));
        assert_eq!(fs::read_to_string(&files.pmids).unwrap(), "");
    }
}
