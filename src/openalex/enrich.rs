use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{OpenAlexClient, OpenAlexError};

/// Outcome of one enrichment pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichSummary {
    pub mapped: usize,
    pub unmapped: usize,
    pub mag_file: PathBuf,
    pub nomag_file: PathBuf,
}

fn read_pmids(table: &Path) -> Result<Vec<String>, OpenAlexError> {
    let table_err = |source| OpenAlexError::Table {
        path: table.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(table).map_err(table_err)?;
    let column = reader
        .headers()
        .map_err(table_err)?
        .iter()
        .position(|h| h.trim() == "pmid")
        .ok_or_else(|| OpenAlexError::MissingPmidColumn(table.to_path_buf()))?;

    let mut pmids = Vec::new();
    for record in reader.records() {
        let record = record.map_err(table_err)?;
        if let Some(pmid) = record.get(column).map(str::trim)
            && !pmid.is_empty()
        {
            pmids.push(pmid.to_string());
        }
    }
    Ok(pmids)
}

fn write_list(path: &Path, ids: &[String]) -> Result<(), OpenAlexError> {
    fs::write(path, ids.join("\n")).map_err(|source| OpenAlexError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Look up every pmid of a previously written table, one request at a time,
/// and write the MAG ids found and the pmids left unmapped.
///
/// Lookups that fail in transport are logged and counted as unmapped.
pub async fn enrich(
    client: &OpenAlexClient,
    table: &Path,
    mag_file: &Path,
    nomag_file: &Path,
) -> Result<EnrichSummary, OpenAlexError> {
    let pmids = read_pmids(table)?;
    info!(table = %table.display(), pmids = pmids.len(), "openalex enrichment");

    let mut mags = Vec::new();
    let mut nomag_pmids = Vec::new();
    for (i, pmid) in pmids.iter().enumerate() {
        match client.lookup(pmid).await {
            Ok(Some(work)) => match work.mag_id() {
                Some(mag) => {
                    debug!(pmid = %pmid, mag = %mag, work = work.id.as_deref().unwrap_or("-"), "mapped");
                    mags.push(mag);
                }
                None => nomag_pmids.push(pmid.clone()),
            },
            Ok(None) => nomag_pmids.push(pmid.clone()),
            Err(e) => {
                warn!(pmid = %pmid, error = %e, "openalex lookup failed");
                nomag_pmids.push(pmid.clone());
            }
        }
        if (i + 1) % 100 == 0 {
            info!(done = i + 1, total = pmids.len(), "openalex progress");
        }
    }

    write_list(mag_file, &mags)?;
    write_list(nomag_file, &nomag_pmids)?;

    Ok(EnrichSummary {
        mapped: mags.len(),
        unmapped: nomag_pmids.len(),
        mag_file: mag_file.to_path_buf(),
        nomag_file: nomag_file.to_path_buf(),
    })
}
