use tracing::info;

use crate::artifacts::{ArtifactError, ArtifactWriter};
use crate::hedge::{FieldTag, Hedge, Strategy, build_hedge};
use crate::pubmed::{PubMedError, SearchService};
use crate::query::{self, BlockHedges, Query, Variant};
use crate::search::runner::{QueryOutcome, run_query};
use crate::terms::BlockTerms;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("counting {label} hedge for block '{block}' failed: {source}")]
    HedgeCount {
        block: String,
        label: String,
        #[source]
        source: PubMedError,
    },

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Inputs of one full search run.
#[derive(Debug)]
pub struct RunRequest<'a> {
    pub blocks: &'a [BlockTerms],
    pub field_tags: &'a [FieldTag],
    pub max_results: usize,
}

#[derive(Debug)]
pub struct QueryRun {
    pub label: String,
    pub outcome: QueryOutcome,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub hedges: Vec<Hedge>,
    pub queries: Vec<QueryRun>,
}

impl RunReport {
    fn record(&mut self, query: &Query, outcome: QueryOutcome) {
        self.queries.push(QueryRun {
            label: query.label(),
            outcome,
        });
    }

    pub fn completed(&self) -> usize {
        self.queries
            .iter()
            .filter(|q| matches!(q.outcome, QueryOutcome::Completed(_)))
            .count()
    }

    pub fn too_long(&self) -> usize {
        self.queries
            .iter()
            .filter(|q| matches!(q.outcome, QueryOutcome::TooLong { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.queries
            .iter()
            .filter(|q| matches!(q.outcome, QueryOutcome::Failed(_)))
            .count()
    }
}

/// Count one hedge and write it to `hedges/`.
async fn run_hedge(
    service: &impl SearchService,
    writer: &ArtifactWriter,
    block: &str,
    label: &str,
    text: &str,
) -> Result<Hedge, EngineError> {
    let count = service
        .count(text)
        .await
        .map_err(|source| EngineError::HedgeCount {
            block: block.to_string(),
            label: label.to_string(),
            source,
        })?;
    let file = writer.write_hedge(block, count, label, text)?;
    info!(block, label, count, file = %file.display(), hedge = %text, "hedge counted");

    Ok(Hedge {
        block: block.to_string(),
        label: label.to_string(),
        text: text.to_string(),
        count,
    })
}

/// Run the whole pipeline: MeSH hedges and the MeSH query first, then for
/// each field tag the keyword hedges and the five keyword-bearing variants.
///
/// A failed hedge count aborts the run. Failed queries are recorded in the
/// report and the run moves on.
pub async fn run(
    service: &impl SearchService,
    writer: &ArtifactWriter,
    request: &RunRequest<'_>,
) -> Result<RunReport, EngineError> {
    let mut report = RunReport::default();

    let mut mesh_hedges = Vec::with_capacity(request.blocks.len());
    for block in request.blocks {
        let text = build_hedge(&block.mesh, &Strategy::Mesh);
        let hedge = run_hedge(service, writer, &block.block, &Strategy::Mesh.label(), &text).await?;
        report.hedges.push(hedge);
        mesh_hedges.push(text);
    }

    let mesh = query::mesh_query(&mesh_hedges);
    let outcome = run_query(service, writer, &mesh, request.max_results).await?;
    report.record(&mesh, outcome);

    for tag in request.field_tags {
        let strategy = Strategy::Keyword(tag.clone());
        let mut block_hedges = Vec::with_capacity(request.blocks.len());

        for (block, mesh_hedge) in request.blocks.iter().zip(&mesh_hedges) {
            let keyword = build_hedge(&block.keywords, &strategy);
            let hedges = BlockHedges::new(&block.block, mesh_hedge, &keyword);

            for (label, text) in [
                (strategy.label(), &hedges.keyword),
                (
                    Variant::KeywordNotMedline(tag.clone()).label(),
                    &hedges.keyword_not_medline,
                ),
                (
                    Variant::MeshOrKeyword(tag.clone()).label(),
                    &hedges.mesh_or_keyword,
                ),
            ] {
                let hedge = run_hedge(service, writer, &block.block, &label, text).await?;
                report.hedges.push(hedge);
            }
            block_hedges.push(hedges);
        }

        for query in query::keyword_queries(&mesh, &block_hedges, tag) {
            let outcome = run_query(service, writer, &query, request.max_results).await?;
            report.record(&query, outcome);
        }
    }

    info!(
        hedges = report.hedges.len(),
        completed = report.completed(),
        too_long = report.too_long(),
        failed = report.failed(),
        "search run finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{HEDGES_DIR, QUERIES_DIR};
    use crate::config::Config;
    use crate::search::fake::{FakeSearch, record};
    use std::fs;
    use tempfile::TempDir;

    fn blocks() -> Vec<BlockTerms> {
        vec![
            BlockTerms {
                block: "condition".into(),
                mesh: vec!["Spinal Dysraphism[mh]".into()],
                keywords: vec!["spina bifida".into()],
            },
            BlockTerms {
                block: "surgery".into(),
                mesh: vec!["Fetoscopy[mh]".into()],
                keywords: vec!["fetoscopic".into()],
            },
        ]
    }

    fn tags(tags: &[&str]) -> Vec<FieldTag> {
        tags.iter().map(|t| t.parse().unwrap()).collect()
    }

    fn writer(dir: &TempDir) -> ArtifactWriter {
        ArtifactWriter::create(dir.path(), "20240307", &Config::default().libraries).unwrap()
    }

    fn file_count(dir: std::path::PathBuf) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn runs_every_hedge_and_variant_in_order() {
        let dir = TempDir::new().unwrap();
        let w = writer(&dir);
        let fake = FakeSearch::with_records(vec![record("1", Some("J"))]);
        let blocks = blocks();
        let tags = tags(&["[tw]", "[tiab]"]);

        let report = run(
            &fake,
            &w,
            &RunRequest {
                blocks: &blocks,
                field_tags: &tags,
                max_results: 10,
            },
        )
        .await
        .unwrap();

        // 2 mesh hedges + 2 tags x 2 blocks x 3 keyword hedges
        assert_eq!(report.hedges.len(), 14);
        assert_eq!(file_count(w.root().join(HEDGES_DIR)), 14);

        let labels: Vec<&str> = report.queries.iter().map(|q| q.label.as_str()).collect();
        assert_eq!(
            labels,
            [
                "mesh",
                "keyword[tw]",
                "keyword[tw]NOTmedline",
                "mesh-keyword[tw]",
                "meshORkeyword[tw]",
                "meshORkeyword[tw]NOTmedline",
                "keyword[tiab]",
                "keyword[tiab]NOTmedline",
                "mesh-keyword[tiab]",
                "meshORkeyword[tiab]",
                "meshORkeyword[tiab]NOTmedline",
            ]
        );
        assert_eq!(report.completed(), 11);
        assert_eq!(fake.searched().len(), 11);

        let counted = fake.counted();
        assert_eq!(counted[0], "Spinal Dysraphism[mh]");
        assert_eq!(counted[1], "Fetoscopy[mh]");
        assert_eq!(counted[2], "(Spinal Dysraphism[mh]) AND (Fetoscopy[mh])");
        assert_eq!(counted[3], "(spina[tw] bifida[tw])");
        assert_eq!(counted[4], "((spina[tw] bifida[tw])) NOT (medline[sb])");
        assert_eq!(
            counted[5],
            "(Spinal Dysraphism[mh]) OR ((spina[tw] bifida[tw]))"
        );
    }

    #[tokio::test]
    async fn too_long_variant_does_not_stop_the_run() {
        let dir = TempDir::new().unwrap();
        let w = writer(&dir);
        let blocks = blocks();
        let tags = tags(&["[tw]"]);
        // Only meshORkeyword[tw]NOTmedline exceeds this.
        let fake = FakeSearch {
            too_long_over: Some(100),
            ..FakeSearch::default()
        };

        let report = run(
            &fake,
            &w,
            &RunRequest {
                blocks: &blocks,
                field_tags: &tags,
                max_results: 10,
            },
        )
        .await
        .unwrap();

        assert_eq!(report.queries.len(), 6);
        assert_eq!(report.too_long(), 1);
        assert_eq!(report.completed(), 5);
        assert!(matches!(
            report.queries[5].outcome,
            QueryOutcome::TooLong { .. }
        ));
        let too_long_files = fs::read_dir(w.root().join(QUERIES_DIR))
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .ends_with("-TOOLONG.txt")
            })
            .count();
        assert_eq!(too_long_files, report.too_long());
    }

    #[tokio::test]
    async fn hedge_count_failure_aborts() {
        let dir = TempDir::new().unwrap();
        let w = writer(&dir);
        let blocks = blocks();
        let tags = tags(&["[tw]"]);
        let fake = FakeSearch {
            failing: vec!["Fetoscopy[mh]".into()],
            ..FakeSearch::default()
        };

        let err = run(
            &fake,
            &w,
            &RunRequest {
                blocks: &blocks,
                field_tags: &tags,
                max_results: 10,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            &err,
            EngineError::HedgeCount { block, label, .. } if block == "surgery" && label == "mesh"
        ));
        assert!(fake.searched().is_empty());
    }
}
