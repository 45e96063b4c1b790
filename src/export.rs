//! Result aggregation and CSV export.
//!
//! Papers are flattened into one row each; papers without a non-academic
//! author never produce a row.

use crate::error::{FinderError, Result};
use crate::models::Paper;
use chrono::NaiveDate;
use serde::Serialize;
use std::io;
use std::path::Path;
use tracing::info;

/// CSV header, in column order; matches the `ExportRow` serde names
pub const EXPORT_COLUMNS: &[&str] = &[
    "ID",
    "Title",
    "Publication Date",
    "Non-academic Author(s)",
    "Company Affiliation(s)",
    "Corresponding Author Email",
];

/// Separator for multi-valued columns
const VALUE_SEPARATOR: &str = "; ";

/// Structured view of a paper with non-academic authors
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaperRecord {
    pub pubmed_id: String,
    pub title: String,
    pub publication_date: NaiveDate,
    pub non_academic_authors: Vec<String>,
    pub company_affiliations: Vec<String>,
    pub corresponding_author_email: Option<String>,
}

/// One flat CSV row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "ID")]
    pub pubmed_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Publication Date")]
    pub publication_date: String,
    #[serde(rename = "Non-academic Author(s)")]
    pub non_academic_authors: String,
    #[serde(rename = "Company Affiliation(s)")]
    pub company_affiliations: String,
    #[serde(rename = "Corresponding Author Email")]
    pub corresponding_author_email: String,
}

impl From<PaperRecord> for ExportRow {
    fn from(record: PaperRecord) -> Self {
        Self {
            pubmed_id: record.pubmed_id,
            title: record.title,
            publication_date: record.publication_date.format("%Y-%m-%d").to_string(),
            non_academic_authors: record.non_academic_authors.join(VALUE_SEPARATOR),
            company_affiliations: record.company_affiliations.join(VALUE_SEPARATOR),
            corresponding_author_email: record.corresponding_author_email.unwrap_or_default(),
        }
    }
}

/// Convert papers to records, skipping papers without non-academic authors.
pub fn papers_to_records(papers: &[Paper]) -> Vec<PaperRecord> {
    papers
        .iter()
        .filter(|p| p.has_non_academic_authors())
        .map(|p| PaperRecord {
            pubmed_id: p.pubmed_id.clone(),
            title: p.title.clone(),
            publication_date: p.publication_date,
            non_academic_authors: p
                .non_academic_authors()
                .iter()
                .map(|a| a.name.clone())
                .collect(),
            company_affiliations: p
                .company_affiliations()
                .into_iter()
                .map(str::to_string)
                .collect(),
            corresponding_author_email: p.corresponding_author_email().map(str::to_string),
        })
        .collect()
}

/// Flatten papers to CSV rows in input order.
pub fn to_rows(papers: &[Paper]) -> Vec<ExportRow> {
    papers_to_records(papers)
        .into_iter()
        .map(ExportRow::from)
        .collect()
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[ExportRow]) -> Result<()> {
    // serde emits the header with the first row
    if rows.is_empty() {
        wtr.write_record(EXPORT_COLUMNS)?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render papers as CSV text.
pub fn to_csv_string(papers: &[Paper]) -> Result<String> {
    let rows = to_rows(papers);
    let mut wtr = csv::Writer::from_writer(Vec::new());
    write_rows(&mut wtr, &rows)?;

    let bytes = wtr
        .into_inner()
        .map_err(|e| FinderError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| FinderError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Write papers as CSV to `path`.
pub fn write_csv(papers: &[Paper], path: &Path) -> Result<()> {
    let rows = to_rows(papers);
    let mut wtr = csv::Writer::from_path(path)?;
    write_rows(&mut wtr, &rows)?;
    info!(path = %path.display(), rows = rows.len(), "Results saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Author;

    fn sample_papers() -> Vec<Paper> {
        let mut pfizer = Author::new("John Smith")
            .with_affiliation("Pfizer Inc., New York, NY, USA")
            .with_email("john.smith@pfizer.com");
        pfizer.set_classification(true, Some("Pfizer Inc.".into()));

        let mut acme = Author::new("Bo Chen")
            .with_affiliation("Acme Labs, Boston")
            .with_email("bo@acme.com");
        acme.set_classification(true, Some("Acme Labs".into()));

        vec![
            Paper::new("12345", "Test Paper 1", NaiveDate::from_ymd_opt(2023, 5, 15).expect("date"))
                .with_authors(vec![
                    pfizer,
                    Author::new("Alice Johnson")
                        .with_affiliation("Stanford University, CA, USA")
                        .with_email("alice@stanford.edu")
                        .corresponding(true),
                    acme,
                ]),
            Paper::new("67890", "Test Paper 2", NaiveDate::from_ymd_opt(2023, 6, 20).expect("date"))
                .with_authors(vec![Author::new("Jane Doe")
                    .with_affiliation("Harvard University, MA, USA")
                    .with_email("jane@harvard.edu")]),
        ]
    }

    #[test]
    fn test_to_rows_skips_academic_only_papers() {
        let rows = to_rows(&sample_papers());
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.pubmed_id, "12345");
        assert_eq!(row.publication_date, "2023-05-15");
        assert_eq!(row.non_academic_authors, "John Smith; Bo Chen");
        assert_eq!(row.corresponding_author_email, "alice@stanford.edu");

        let mut companies: Vec<_> = row.company_affiliations.split("; ").collect();
        companies.sort_unstable();
        assert_eq!(companies, vec!["Acme Labs", "Pfizer Inc."]);
    }

    #[test]
    fn test_records_have_no_email_when_missing() {
        let mut papers = sample_papers();
        papers[0].authors[1].is_corresponding = false;

        let records = papers_to_records(&papers);
        assert_eq!(records[0].corresponding_author_email, None);
        assert_eq!(ExportRow::from(records[0].clone()).corresponding_author_email, "");
    }

    #[test]
    fn test_to_csv_string() {
        let csv_text = to_csv_string(&sample_papers()).expect("csv");
        let mut lines = csv_text.lines();

        assert_eq!(
            lines.next(),
            Some("ID,Title,Publication Date,Non-academic Author(s),Company Affiliation(s),Corresponding Author Email")
        );
        assert!(csv_text.contains("12345"));
        assert!(csv_text.contains("Test Paper 1"));
        assert!(csv_text.contains("John Smith; Bo Chen"));
        assert!(csv_text.contains("Pfizer Inc."));
        assert!(!csv_text.contains("67890"));
        assert!(!csv_text.contains("Test Paper 2"));
        assert!(!csv_text.contains("Alice Johnson"));
    }

    #[test]
    fn test_csv_quotes_embedded_commas() {
        let mut papers = sample_papers();
        papers[0].title = "Drugs, genes, and more".into();

        let csv_text = to_csv_string(&papers).expect("csv");
        assert!(csv_text.contains("\"Drugs, genes, and more\""));
    }

    #[test]
    fn test_empty_input_yields_header_only() {
        let csv_text = to_csv_string(&[]).expect("csv");
        assert_eq!(csv_text.lines().count(), 1);

        let with_rows = to_csv_string(&sample_papers()).expect("csv");
        assert_eq!(csv_text.lines().next(), with_rows.lines().next());
        assert_eq!(csv_text.trim_end(), EXPORT_COLUMNS.join(","));
    }

    #[test]
    fn test_write_csv_to_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("results.csv");

        write_csv(&sample_papers(), &path).expect("write");

        let content = std::fs::read_to_string(&path).expect("read");
        assert_eq!(content, to_csv_string(&sample_papers()).expect("csv"));
    }
}
