use serde::Deserialize;

/// Body of `esearch.fcgi?retmode=json`.
#[derive(Debug, Deserialize)]
pub struct ESearchResponse {
    pub esearchresult: ESearchResult,
}

/// Numeric fields arrive as strings.
#[derive(Debug, Deserialize, Default)]
pub struct ESearchResult {
    pub count: Option<String>,
    pub querykey: Option<String>,
    pub webenv: Option<String>,
    #[serde(rename = "ERROR")]
    pub error: Option<String>,
}

impl ESearchResult {
    pub fn history_session(&self) -> Option<HistorySession> {
        match (&self.webenv, &self.querykey) {
            (Some(webenv), Some(query_key)) => Some(HistorySession {
                webenv: webenv.clone(),
                query_key: query_key.clone(),
            }),
            _ => None,
        }
    }
}

/// History-server handle for paging through a stored result set with `efetch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySession {
    pub webenv: String,
    pub query_key: String,
}

/// One citation as parsed from `efetch` XML, before filtering.
///
/// `journal` is `None` for book and chapter records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PubMedRecord {
    pub pmid: String,
    pub title: Option<String>,
    pub journal: Option<String>,
    pub publication_date: Option<String>,
    pub doi: Option<String>,
    pub abstract_text: Option<String>,
}

impl PubMedRecord {
    /// Keep journal articles only; anything without a journal title is dropped.
    pub fn into_article(self) -> Option<Article> {
        let journal = self.journal.filter(|j| !j.trim().is_empty())?;
        Some(Article {
            pmid: self.pmid,
            title: self.title.unwrap_or_default(),
            journal,
            publication_date: self.publication_date.unwrap_or_default(),
            doi: self.doi,
            abstract_text: self.abstract_text.unwrap_or_default(),
        })
    }
}

/// A retained journal article, one row of the metadata table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub pmid: String,
    pub title: String,
    pub journal: String,
    pub publication_date: String,
    pub doi: Option<String>,
    pub abstract_text: String,
}
