use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

use super::parse::parse_article_set;
use super::types::{ESearchResponse, ESearchResult, HistorySession, PubMedRecord};
use crate::config::Config;

/// Records requested per `efetch` call when paging the history server.
const FETCH_BATCH: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum PubMedError {
    #[error("query too long for E-utilities (HTTP 414): {0}")]
    TooLong(String),

    #[error("E-utilities rate limit exceeded (HTTP 429)")]
    RateLimited,

    #[error("E-utilities rejected the request (HTTP {code}): {message}")]
    Rejected { code: u16, message: String },

    #[error("E-utilities error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("malformed E-utilities response: {0}")]
    Parse(String),
}

impl PubMedError {
    /// E-utilities answers an over-long `term` with HTTP 414. Rate limits,
    /// server errors and other statuses are ordinary failures.
    pub fn is_too_long(&self) -> bool {
        matches!(self, PubMedError::TooLong(_))
    }
}

fn classify_status(status: StatusCode, message: String) -> PubMedError {
    match status {
        StatusCode::URI_TOO_LONG => PubMedError::TooLong(message),
        StatusCode::TOO_MANY_REQUESTS => PubMedError::RateLimited,
        _ => PubMedError::Rejected {
            code: status.as_u16(),
            message,
        },
    }
}

/// Keeps successive calls at least `interval` apart.
#[derive(Debug)]
struct Pacer {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Pacer {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Sleep until `interval` has passed since the previous call returned.
    async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.interval).await;
        }
        *last = Some(Instant::now());
    }
}

/// Abstraction over the bibliographic search service.
/// Implemented by `PubMedClient` for production; fakes are used in tests.
pub trait SearchService {
    /// Total number of citations matching `query`.
    async fn count(&self, query: &str) -> Result<u64, PubMedError>;

    /// Up to `limit` citations matching `query`, in PubMed's order.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<PubMedRecord>, PubMedError>;
}

/// NCBI E-utilities client (`esearch` + `efetch` over the history server).
#[derive(Clone)]
pub struct PubMedClient {
    http: Client,
    base_url: String,
    tool: String,
    email: String,
    pacer: Arc<Pacer>,
}

impl PubMedClient {
    pub fn new(http: Client, config: &Config) -> Self {
        Self {
            http,
            base_url: config.eutils_base.trim_end_matches('/').to_string(),
            tool: config.tool.clone(),
            email: config.email.clone(),
            pacer: Arc::new(Pacer::new(config.request_interval)),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tool: "pubhedge-test".to_string(),
            email: "test@example.org".to_string(),
            pacer: Arc::new(Pacer::new(Duration::ZERO)),
        }
    }

    fn endpoint(&self, name: &str, params: &[(&str, &str)]) -> Result<Url, PubMedError> {
        let mut url = Url::parse(&format!("{}/{name}", self.base_url))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("db", "pubmed");
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("tool", &self.tool);
            pairs.append_pair("email", &self.email);
        }
        Ok(url)
    }

    async fn get_text(&self, url: Url) -> Result<String, PubMedError> {
        self.pacer.wait().await;
        let response = self
            .http
            .get(url)
            .header("User-Agent", crate::USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message: String = text.chars().take(200).collect();
            warn!(status = %status, "E-utilities request rejected");
            return Err(classify_status(status, message));
        }

        Ok(response.text().await?)
    }

    async fn esearch(&self, query: &str, extra: &[(&str, &str)]) -> Result<ESearchResult, PubMedError> {
        let mut params = vec![("term", query), ("retmode", "json")];
        params.extend_from_slice(extra);
        let url = self.endpoint("esearch.fcgi", &params)?;

        let body = self.get_text(url).await?;
        let parsed: ESearchResponse = serde_json::from_str(&body)
            .map_err(|e| PubMedError::Parse(format!("esearch: {e}")))?;

        let result = parsed.esearchresult;
        if let Some(message) = &result.error {
            warn!(error = %message, "E-utilities error in esearch response");
            return Err(PubMedError::Api(message.clone()));
        }
        Ok(result)
    }

    async fn efetch(
        &self,
        session: &HistorySession,
        retstart: usize,
        retmax: usize,
    ) -> Result<Vec<PubMedRecord>, PubMedError> {
        let retstart = retstart.to_string();
        let retmax = retmax.to_string();
        let url = self.endpoint(
            "efetch.fcgi",
            &[
                ("query_key", session.query_key.as_str()),
                ("WebEnv", session.webenv.as_str()),
                ("retstart", retstart.as_str()),
                ("retmax", retmax.as_str()),
                ("retmode", "xml"),
            ],
        )?;
        let xml = self.get_text(url).await?;
        parse_article_set(&xml)
    }
}

fn parse_count(result: &ESearchResult) -> Result<u64, PubMedError> {
    let raw = result
        .count
        .as_deref()
        .ok_or_else(|| PubMedError::Parse("esearch response has no count".to_string()))?;
    raw.trim()
        .parse()
        .map_err(|_| PubMedError::Parse(format!("esearch count is not a number: {raw:?}")))
}

impl SearchService for PubMedClient {
    async fn count(&self, query: &str) -> Result<u64, PubMedError> {
        let result = self.esearch(query, &[("rettype", "count")]).await?;
        parse_count(&result)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<PubMedRecord>, PubMedError> {
        let result = self
            .esearch(query, &[("usehistory", "y"), ("retmax", "0")])
            .await?;
        let total = usize::try_from(parse_count(&result)?).unwrap_or(usize::MAX);
        let wanted = total.min(limit);
        if wanted == 0 {
            return Ok(Vec::new());
        }

        let session = result.history_session().ok_or_else(|| {
            PubMedError::Parse("esearch response has no WebEnv/query_key".to_string())
        })?;

        let mut records = Vec::with_capacity(wanted);
        let mut retstart = 0;
        while retstart < wanted {
            let retmax = FETCH_BATCH.min(wanted - retstart);
            let batch = self.efetch(&session, retstart, retmax).await?;
            debug!(retstart, fetched = batch.len(), wanted, "efetch batch");
            if batch.is_empty() {
                warn!(retstart, wanted, "efetch returned an empty batch, stopping early");
                break;
            }
            records.extend(batch);
            retstart += retmax;
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn pacer_spaces_successive_calls() {
        let pacer = Pacer::new(Duration::from_millis(334));
        let start = Instant::now();
        pacer.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        pacer.wait().await;
        pacer.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(668));
    }

    #[test]
    fn parse_count_reads_string_number() {
        let result = ESearchResult {
            count: Some("1234".into()),
            ..Default::default()
        };
        assert_eq!(parse_count(&result).unwrap(), 1234);
    }

    #[test]
    fn parse_count_rejects_missing_or_garbage() {
        assert!(matches!(
            parse_count(&ESearchResult::default()),
            Err(PubMedError::Parse(_))
        ));
        let garbage = ESearchResult {
            count: Some("many".into()),
            ..Default::default()
        };
        assert!(matches!(parse_count(&garbage), Err(PubMedError::Parse(_))));
    }

    #[test]
    fn only_414_counts_as_too_long() {
        let too_long = classify_status(StatusCode::URI_TOO_LONG, "Request-URI Too Long".into());
        assert!(too_long.is_too_long());

        let limited = classify_status(StatusCode::TOO_MANY_REQUESTS, String::new());
        assert!(matches!(limited, PubMedError::RateLimited));
        assert!(!limited.is_too_long());

        let unavailable = classify_status(StatusCode::SERVICE_UNAVAILABLE, "down".into());
        assert!(matches!(unavailable, PubMedError::Rejected { code: 503, .. }));
        assert!(!unavailable.is_too_long());

        assert!(!PubMedError::Api("Invalid query".into()).is_too_long());
        assert!(!PubMedError::Parse("bad json".into()).is_too_long());
    }

    #[test]
    fn endpoint_encodes_query_and_identifies_tool() {
        let client = PubMedClient::with_base_url(Client::new(), "https://eutils.example/eutils/");
        let url = client
            .endpoint("esearch.fcgi", &[("term", "(fetal[tw]) AND (repair[tw])")])
            .unwrap();
        assert_eq!(url.path(), "/eutils/esearch.fcgi");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("db".into(), "pubmed".into()));
        assert_eq!(pairs[1], ("term".into(), "(fetal[tw]) AND (repair[tw])".into()));
        assert!(pairs.contains(&("tool".into(), "pubhedge-test".into())));
        assert!(pairs.contains(&("email".into(), "test@example.org".into())));
    }
}
