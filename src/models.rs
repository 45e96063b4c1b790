//! Paper and author records.
//!
//! Retrieval builds these with the classification fields left at their
//! defaults; [`crate::filters`] fills them in exactly once.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Placeholder title used when the source record omits one
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// A paper author with affiliation information
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Author {
    /// Display name ("First Last", last name only, or a collective name)
    pub name: String,
    /// Raw affiliation text
    pub affiliation: Option<String>,
    /// Contact email, often pulled out of the affiliation text
    pub email: Option<String>,
    /// Marked as corresponding author by the source
    pub is_corresponding: bool,
    /// Set by the classifier only
    pub is_non_academic: bool,
    /// Set by the classifier only, and only alongside `is_non_academic`
    pub company_affiliation: Option<String>,
}

impl Author {
    /// Create an unclassified author with just a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliation = Some(affiliation.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn corresponding(mut self, is_corresponding: bool) -> Self {
        self.is_corresponding = is_corresponding;
        self
    }

    /// Record a classification outcome.
    ///
    /// A company name is only kept for non-academic authors.
    pub fn set_classification(&mut self, is_non_academic: bool, company: Option<String>) {
        self.is_non_academic = is_non_academic;
        self.company_affiliation = if is_non_academic {
            company.filter(|c| !c.is_empty())
        } else {
            None
        };
    }
}

/// A research paper with its metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    /// PubMed identifier
    pub pubmed_id: String,
    pub title: String,
    pub publication_date: NaiveDate,
    /// Authors in source order
    #[serde(default)]
    pub authors: Vec<Author>,
}

impl Paper {
    pub fn new(pubmed_id: impl Into<String>, title: impl Into<String>, publication_date: NaiveDate) -> Self {
        Self {
            pubmed_id: pubmed_id.into(),
            title: title.into(),
            publication_date,
            authors: Vec::new(),
        }
    }

    pub fn with_authors(mut self, authors: Vec<Author>) -> Self {
        self.authors = authors;
        self
    }

    /// Authors classified as non-academic, in original order
    pub fn non_academic_authors(&self) -> Vec<&Author> {
        self.authors.iter().filter(|a| a.is_non_academic).collect()
    }

    pub fn has_non_academic_authors(&self) -> bool {
        self.authors.iter().any(|a| a.is_non_academic)
    }

    /// Unique company names among non-academic authors
    pub fn company_affiliations(&self) -> BTreeSet<&str> {
        self.authors
            .iter()
            .filter(|a| a.is_non_academic)
            .filter_map(|a| a.company_affiliation.as_deref())
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Email of the first corresponding author that has one
    pub fn corresponding_author_email(&self) -> Option<&str> {
        self.authors
            .iter()
            .find(|a| a.is_corresponding && a.email.as_deref().is_some_and(|e| !e.is_empty()))
            .and_then(|a| a.email.as_deref())
    }
}
