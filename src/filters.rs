//! Affiliation classification.
//!
//! Decides per author whether an affiliation string points at a
//! pharmaceutical/biotech company rather than a university, hospital or
//! government body, and pulls out a best-guess company name.
//!
//! Matching is keyword based. Precedence, first terminal rule wins:
//!
//! 1. no affiliation text: academic
//! 2. academic keyword, unless the text also uses pharma/biotech vocabulary
//! 3. government / public-health keyword: academic, no override
//! 4. company suffix (whole word) or pharma/biotech vocabulary sets the company flag
//! 5. academic email domain: academic; commercial email domain sets the company flag

use crate::models::{Author, Paper};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

/// Academic institution phrases
pub const ACADEMIC_KEYWORDS: &[&str] = &[
    "university",
    "college",
    "institute of technology",
    "polytechnic",
    "school of medicine",
    "medical school",
    "academy of sciences",
    "research institute",
    "national laboratory",
    "state university",
    "academia",
    "faculty",
    "school of",
    "department of",
];

/// Government and public-health institution phrases
pub const GOVERNMENT_KEYWORDS: &[&str] = &[
    "national institute",
    "ministry of",
    "department of health",
    "cdc",
    "centers for disease",
    "government",
    "public health",
    "federal",
    "state department",
    "nih",
    "who",
    "world health",
    "hospital",
    "clinic",
    "medical center",
    "health service",
    "healthcare system",
    "foundation",
    "nhs",
];

/// Company suffixes, matched as whole words
pub const COMPANY_SUFFIXES: &[&str] = &[
    "inc",
    "corp",
    "corporation",
    "ltd",
    "limited",
    "llc",
    "co",
    "gmbh",
    "sa",
    "ag",
    "bv",
    "plc",
    "spa",
    "pharma",
    "therapeutics",
    "group",
    "laboratories",
    "labs",
    "biosciences",
    "biotech",
];

/// Pharmaceutical/biotech vocabulary, matched as substrings
pub const PHARMA_BIOTECH_KEYWORDS: &[&str] = &[
    "pharma",
    "biotech",
    "bio",
    "therapeutics",
    "biosciences",
    "genomics",
    "pharmaceutical",
    "biopharma",
    "drug",
    "medicines",
    "biologics",
    "lifesciences",
    "genetics",
    "medical",
];

static COMPANY_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = COMPANY_SUFFIXES
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("company suffix pattern")
});

static ACADEMIC_EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@.*\.(?:edu|ac\.[a-z]{2}|edu\.[a-z]{2})$").expect("academic email pattern")
});

static COMPANY_EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[^.]*\.(?:com|co|net|io)$").expect("company email pattern"));

static SEGMENT_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;]").expect("segment split pattern"));

/// Outcome of classifying one author
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    pub is_non_academic: bool,
    /// Only present for non-academic authors
    pub company_affiliation: Option<String>,
}

fn has_company_suffix(text: &str) -> bool {
    COMPANY_SUFFIX_RE.is_match(text)
}

/// `text` must already be lower-cased
fn mentions_pharma_biotech(text: &str) -> bool {
    PHARMA_BIOTECH_KEYWORDS.iter().any(|kw| text.contains(kw))
}

/// Determine if an author is likely affiliated with a non-academic institution.
pub fn is_non_academic_author(author: &Author) -> bool {
    let affiliation = match author.affiliation.as_deref() {
        Some(a) if !a.is_empty() => a.to_lowercase(),
        _ => return false,
    };

    let pharma_vocabulary = mentions_pharma_biotech(&affiliation);

    for keyword in ACADEMIC_KEYWORDS {
        if affiliation.contains(keyword) {
            if pharma_vocabulary {
                // industry collaboration or in-house research arm
                debug!(keyword, "Academic keyword overridden by pharma/biotech vocabulary");
                continue;
            }
            return false;
        }
    }

    if GOVERNMENT_KEYWORDS.iter().any(|kw| affiliation.contains(kw)) {
        return false;
    }

    let mut has_company_indicators = has_company_suffix(&affiliation) || pharma_vocabulary;

    if let Some(email) = author.email.as_deref() {
        let email = email.to_lowercase();
        if ACADEMIC_EMAIL_RE.is_match(&email) {
            return false;
        }
        if COMPANY_EMAIL_RE.is_match(&email) {
            has_company_indicators = true;
        }
    }

    has_company_indicators
}

/// Attempt to extract the company name from an affiliation string.
///
/// Segments are split on `,` and `;`. The first segment with a company
/// suffix wins, then the first with pharma/biotech vocabulary, then the
/// first non-blank segment as-is. Blank segments are dropped before the
/// fallback, so a leading separator (`", Main Street"`) still yields a name;
/// an empty string comes back only when no segment has any text.
pub fn extract_company_name(affiliation: &str) -> String {
    let segments: Vec<&str> = SEGMENT_SPLIT_RE
        .split(affiliation)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let matched = segments
        .iter()
        .find(|s| has_company_suffix(s))
        .or_else(|| {
            segments
                .iter()
                .find(|s| mentions_pharma_biotech(&s.to_lowercase()))
        });

    match matched {
        Some(segment) => raw_fragment(affiliation, segment),
        None => segments.first().map(|s| s.to_string()).unwrap_or_default(),
    }
}

/// Prefer the first comma-separated fragment of the raw text containing `segment`.
fn raw_fragment(affiliation: &str, segment: &str) -> String {
    let needle = segment.to_lowercase();
    affiliation
        .split(',')
        .map(str::trim)
        .find(|fragment| fragment.to_lowercase().contains(&needle))
        .unwrap_or(segment)
        .to_string()
}

/// Classify a single author without mutating it.
pub fn classify_author(author: &Author) -> Classification {
    if !is_non_academic_author(author) {
        return Classification::default();
    }

    let company_affiliation = author
        .affiliation
        .as_deref()
        .map(extract_company_name)
        .filter(|name| !name.is_empty());

    Classification {
        is_non_academic: true,
        company_affiliation,
    }
}

/// Return the authors with their classification fields recomputed.
pub fn classify(authors: Vec<Author>) -> Vec<Author> {
    authors
        .into_iter()
        .map(|mut author| {
            let result = classify_author(&author);
            if result.is_non_academic {
                debug!(
                    author = %author.name,
                    company = result.company_affiliation.as_deref().unwrap_or(""),
                    "Non-academic author"
                );
            }
            author.set_classification(result.is_non_academic, result.company_affiliation);
            author
        })
        .collect()
}

/// Classify every author of every paper.
pub fn identify_non_academic_authors(papers: Vec<Paper>) -> Vec<Paper> {
    let papers: Vec<Paper> = papers
        .into_iter()
        .map(|mut paper| {
            paper.authors = classify(std::mem::take(&mut paper.authors));
            paper
        })
        .collect();

    let flagged = papers
        .iter()
        .map(|p| p.non_academic_authors().len())
        .sum::<usize>();
    info!(papers = papers.len(), non_academic_authors = flagged, "Classification complete");

    papers
}

/// Keep only papers with at least one non-academic author, preserving order.
pub fn filter_with_non_academic_authors(papers: Vec<Paper>) -> Vec<Paper> {
    papers
        .into_iter()
        .filter(Paper::has_non_academic_authors)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn author(affiliation: &str, email: Option<&str>) -> Author {
        let a = Author::new("Test Author").with_affiliation(affiliation);
        match email {
            Some(e) => a.with_email(e),
            None => a,
        }
    }

    #[test]
    fn test_is_non_academic_author_with_pharma() {
        let a = author("Pfizer Inc., New York, NY, USA", Some("john.smith@pfizer.com"));
        assert!(is_non_academic_author(&a));
    }

    #[test]
    fn test_is_non_academic_author_with_biotech() {
        let a = author(
            "Genentech Biotech Research, South San Francisco, CA, USA",
            Some("doe.j@gene.com"),
        );
        assert!(is_non_academic_author(&a));
    }

    #[test]
    fn test_is_non_academic_author_with_academic() {
        let a = author(
            "Department of Biology, Stanford University, CA, USA",
            Some("alice@stanford.edu"),
        );
        assert!(!is_non_academic_author(&a));
    }

    #[test]
    fn test_is_non_academic_author_with_government() {
        let a = author(
            "National Institutes of Health, Bethesda, MD, USA",
            Some("bob.williams@nih.gov"),
        );
        assert!(!is_non_academic_author(&a));
    }

    #[test]
    fn test_missing_affiliation_is_academic_regardless_of_email() {
        let a = Author::new("No Affiliation").with_email("someone@pfizer.com");
        assert!(!is_non_academic_author(&a));

        let empty = author("", Some("someone@pfizer.com"));
        assert!(!is_non_academic_author(&empty));

        let classified = classify(vec![a]);
        assert!(!classified[0].is_non_academic);
        assert_eq!(classified[0].company_affiliation, None);
    }

    #[test]
    fn test_academic_keyword_beats_company_suffix() {
        let a = author("Department of Chemistry, Harvard University, Acme Inc, Boston", None);
        assert!(!is_non_academic_author(&a));
    }

    #[test]
    fn test_pharma_vocabulary_overrides_academic_keyword() {
        // academic keyword ignored, no government keyword, vocabulary sets the flag
        let a = author("Department of Biotech Research, XYZ University", None);
        assert!(is_non_academic_author(&a));

        // overridden, but the academic email still wins
        let with_email = author("Department of Biotech Research, XYZ University", Some("r@xyz.edu"));
        assert!(!is_non_academic_author(&with_email));
    }

    #[test]
    fn test_commercial_email_does_not_beat_academic_keyword() {
        let a = author("Department of Chemistry, Harvard University", Some("x@acme.com"));
        assert!(!is_non_academic_author(&a));
        assert_eq!(classify_author(&a), Classification::default());
    }

    #[test]
    fn test_government_keyword_has_no_override() {
        let a = author("National Institutes of Health, Acme Inc, Bethesda", Some("x@acme.com"));
        assert!(!is_non_academic_author(&a));

        let hospital = author("Pharma Partners Hospital, Boston", None);
        assert!(!is_non_academic_author(&hospital));
    }

    #[test]
    fn test_company_suffix_requires_whole_word() {
        // "co" and "sa" inside other words must not count
        let a = author("Costa Rica Sampling Center", None);
        assert!(!is_non_academic_author(&a));

        let whole = author("Acme Co, Costa Rica", None);
        assert!(is_non_academic_author(&whole));
    }

    #[test]
    fn test_academic_email_overrides_company_text() {
        let a = author("Acme Ltd, London, UK", Some("someone@cam.ac.uk"));
        assert!(!is_non_academic_author(&a));

        let b = author("Acme GmbH, Berlin", Some("Someone@Example.EDU"));
        assert!(!is_non_academic_author(&b));

        let c = author("Acme Labs, Beijing", Some("someone@pku.edu.cn"));
        assert!(!is_non_academic_author(&c));
    }

    #[test]
    fn test_commercial_email_sets_company_flag() {
        let a = author("Main Street 5, Springfield", Some("jane@acme.com"));
        assert!(is_non_academic_author(&a));

        let b = author("Main Street 5, Springfield", Some("jane@acme.io"));
        assert!(is_non_academic_author(&b));

        // only bare second-level domains count
        let c = author("Main Street 5, Springfield", Some("jane@mail.acme.com"));
        assert!(!is_non_academic_author(&c));

        let d = author("Main Street 5, Springfield", None);
        assert!(!is_non_academic_author(&d));
    }

    #[test]
    fn test_extract_company_name() {
        assert_eq!(extract_company_name("Pfizer Inc., New York, NY, USA"), "Pfizer Inc.");
        assert_eq!(
            extract_company_name("Research Division, Novartis AG, Basel, Switzerland"),
            "Novartis AG"
        );
    }

    #[test]
    fn test_extract_company_name_prefers_suffix_over_vocabulary() {
        // vocabulary appears first, suffix segment still wins
        assert_eq!(
            extract_company_name("Drug Discovery Unit, Acme Ltd, Cambridge"),
            "Acme Ltd"
        );
    }

    #[test]
    fn test_extract_company_name_vocabulary_fallback() {
        assert_eq!(
            extract_company_name("Boston, Genentech Biologics Division"),
            "Genentech Biologics Division"
        );
    }

    #[test]
    fn test_extract_company_name_semicolon_segments_prefer_comma_fragment() {
        assert_eq!(
            extract_company_name("Acme Inc; Research Park, Boston"),
            "Acme Inc; Research Park"
        );
    }

    #[test]
    fn test_extract_company_name_first_segment_fallback() {
        assert_eq!(extract_company_name("Genentech"), "Genentech");
        assert_eq!(extract_company_name("  Springfield , USA"), "Springfield");
        assert_eq!(extract_company_name(""), "");
        assert_eq!(extract_company_name(" , ;"), "");
    }

    #[test]
    fn test_leading_separator_still_yields_company() {
        assert_eq!(extract_company_name(", Main Street"), "Main Street");

        let result = classify_author(&author(", Main Street", Some("x@acme.com")));
        assert!(result.is_non_academic);
        assert_eq!(result.company_affiliation.as_deref(), Some("Main Street"));
    }

    #[test]
    fn test_classify_scenario_a() {
        let authors = classify(vec![author(
            "Pfizer Inc., New York, NY, USA",
            Some("john.smith@pfizer.com"),
        )]);
        assert!(authors[0].is_non_academic);
        assert_eq!(authors[0].company_affiliation.as_deref(), Some("Pfizer Inc."));
    }

    #[test]
    fn test_classify_is_idempotent() {
        let once = classify(vec![
            author("Pfizer Inc., New York, NY, USA", Some("john.smith@pfizer.com")),
            author("Stanford University, CA, USA", Some("alice@stanford.edu")),
        ]);
        let twice = classify(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_classify_resets_stale_fields() {
        let mut stale = author("Stanford University, CA, USA", None);
        stale.is_non_academic = true;
        stale.company_affiliation = Some("Old Corp".into());

        let authors = classify(vec![stale]);
        assert!(!authors[0].is_non_academic);
        assert_eq!(authors[0].company_affiliation, None);
    }

    #[test]
    fn test_identify_and_filter_papers() {
        let date = NaiveDate::from_ymd_opt(2023, 5, 15).expect("valid date");
        let papers = vec![
            Paper::new("12345", "Test Paper 1", date).with_authors(vec![
                author("Pfizer Inc., New York, NY, USA", Some("john.smith@pfizer.com")),
                author("Stanford University, CA, USA", Some("alice@stanford.edu")),
            ]),
            Paper::new("67890", "Test Paper 2", date)
                .with_authors(vec![author("Harvard University, MA, USA", Some("jane@harvard.edu"))]),
            Paper::new("11111", "No Authors", date),
        ];

        let filtered = filter_with_non_academic_authors(identify_non_academic_authors(papers));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].pubmed_id, "12345");
        assert_eq!(filtered[0].non_academic_authors().len(), 1);
    }
}
