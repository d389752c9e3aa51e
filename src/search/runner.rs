use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::artifacts::{ArticleFiles, ArtifactError, ArtifactWriter};
use crate::pubmed::{Article, PubMedError, SearchService};
use crate::query::Query;

/// What happened to one query variant.
#[derive(Debug)]
pub enum QueryOutcome {
    Completed(QueryReport),
    /// The service answered HTTP 414 to the count; only a TOOLONG file was written.
    TooLong { file: PathBuf },
    /// Count or retrieval failed for a reason other than length.
    Failed(PubMedError),
}

#[derive(Debug)]
pub struct QueryReport {
    pub count: u64,
    pub query_file: PathBuf,
    pub articles: usize,
    pub files: ArticleFiles,
}

/// Count, record, retrieve and write one query variant.
///
/// Service failures never abort the run: they come back as `TooLong` or
/// `Failed`. Only failures to write artifacts are errors.
pub async fn run_query(
    service: &impl SearchService,
    writer: &ArtifactWriter,
    query: &Query,
    max_results: usize,
) -> Result<QueryOutcome, ArtifactError> {
    let label = query.label();

    let count = match service.count(&query.text).await {
        Ok(count) => count,
        Err(e) if e.is_too_long() => {
            let file = writer.write_too_long(&label, &query.text)?;
            warn!(query = %label, file = %file.display(), error = %e, "query too long, skipped");
            return Ok(QueryOutcome::TooLong { file });
        }
        Err(e) => {
            error!(query = %label, error = %e, "count failed, skipped");
            return Ok(QueryOutcome::Failed(e));
        }
    };

    let query_file = writer.write_query(count, &label, &query.text)?;
    info!(
        query = %label,
        count,
        file = %query_file.display(),
        text = %query.text,
        "query counted"
    );

    let records = match service.search(&query.text, max_results).await {
        Ok(records) => records,
        Err(e) => {
            error!(query = %label, error = %e, "retrieval failed, skipped");
            return Ok(QueryOutcome::Failed(e));
        }
    };
    let retrieved = records.len();
    let articles: Vec<Article> = records
        .into_iter()
        .filter_map(|record| record.into_article())
        .collect();
    if (retrieved as u64) < count.min(max_results as u64) {
        warn!(query = %label, count, retrieved, "retrieved fewer records than counted");
    }

    let files = writer.write_articles(&label, &articles)?;
    info!(
        query = %label,
        retrieved,
        articles = articles.len(),
        dropped = retrieved - articles.len(),
        table = %files.table.display(),
        pmids = %files.pmids.display(),
        "articles written"
    );

    Ok(QueryOutcome::Completed(QueryReport {
        count,
        query_file,
        articles: articles.len(),
        files,
    }))
}
