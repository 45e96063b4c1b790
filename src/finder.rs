//! End-to-end pipeline: search, fetch, classify, filter, export.

use crate::error::{FinderError, Result};
use crate::export::{to_csv_string, write_csv};
use crate::filters::{filter_with_non_academic_authors, identify_non_academic_authors};
use crate::models::Paper;
use crate::pubmed::PubMedClient;
use std::path::Path;
use tracing::info;

/// Default result limit for a search
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Find papers matching `query` that have at least one author from a
/// pharmaceutical or biotech company.
///
/// # Errors
///
/// Returns [`FinderError::Validation`] for a blank query, otherwise any
/// retrieval failure from the client.
pub async fn find_papers_with_company_authors(
    client: &PubMedClient,
    query: &str,
    max_results: usize,
) -> Result<Vec<Paper>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(FinderError::Validation("query must not be empty".into()));
    }

    let pmids = client.search(query, max_results).await?;
    if pmids.is_empty() {
        info!("No papers found matching the query");
        return Ok(Vec::new());
    }

    let papers = client.fetch_papers(&pmids).await?;
    let papers = filter_with_non_academic_authors(identify_non_academic_authors(papers));

    info!(count = papers.len(), "Papers with company-affiliated authors");
    Ok(papers)
}

/// Run the pipeline and export the results as CSV.
///
/// With `output` set the CSV is written there and `None` is returned;
/// otherwise the CSV text is returned. When nothing matches, no file is
/// written and text mode returns an empty string.
pub async fn find_and_export_papers(
    client: &PubMedClient,
    query: &str,
    output: Option<&Path>,
    max_results: usize,
) -> Result<Option<String>> {
    let papers = find_papers_with_company_authors(client, query, max_results).await?;

    if papers.is_empty() {
        info!("No papers found with authors from pharmaceutical/biotech companies");
        return Ok(match output {
            Some(_) => None,
            None => Some(String::new()),
        });
    }

    match output {
        Some(path) => {
            write_csv(&papers, path)?;
            Ok(None)
        }
        None => to_csv_string(&papers).map(Some),
    }
}
