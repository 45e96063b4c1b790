//! PubMed efetch XML parsing.
//!
//! The response is read into a small element tree with `quick-xml`, then
//! each `PubmedArticle` is turned into a [`Paper`]. A malformed article is
//! logged and skipped; only a malformed document fails the whole batch.

use crate::error::{FinderError, OptionExt, Result};
use crate::models::{Author, Paper, UNKNOWN_TITLE};
use chrono::NaiveDate;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

const DEFAULT_YEAR: i32 = 1900;
const DEFAULT_MONTH: u32 = 1;
const DEFAULT_DAY: u32 = 1;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w.+-]+@[\w-]+\.[\w.-]+").expect("email pattern"));

#[derive(Debug)]
enum Node {
    Element(Element),
    Text(String),
}

/// Minimal owned XML element
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Self {
        let attributes = start
            .attributes()
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                let value = attr
                    .unescape_value()
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
                (key, value)
            })
            .collect();

        Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            children: Vec::new(),
        }
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First descendant matching `pred`, depth-first in document order
    fn find_by(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        for child in self.child_elements() {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find_by(pred) {
                return Some(found);
            }
        }
        None
    }

    fn find(&self, name: &str) -> Option<&Element> {
        self.find_by(&|e: &Element| e.name == name)
    }

    fn find_all<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            if child.name == name {
                out.push(child);
            }
            child.find_all(name, out);
        }
    }

    /// Concatenated text of this element and all descendants
    fn text(&self) -> String {
        let mut buf = String::new();
        self.collect_text(&mut buf);
        buf
    }

    fn collect_text(&self, buf: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => buf.push_str(t),
                Node::Element(e) => e.collect_text(buf),
            }
        }
    }

    /// Trimmed text of the first descendant called `name`, if non-empty
    fn find_text(&self, name: &str) -> Option<String> {
        self.find(name)
            .map(|e| e.text().trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

fn append_child(stack: &mut [Element], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

/// Read the whole document into a tree under a synthetic root.
fn parse_document(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![Element::default()];

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(Element::from_start(&e)),
            Ok(Event::Empty(e)) => append_child(&mut stack, Node::Element(Element::from_start(&e))),
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map(|t| t.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                append_child(&mut stack, Node::Text(text));
            }
            Ok(Event::CData(e)) => {
                append_child(&mut stack, Node::Text(String::from_utf8_lossy(&e).into_owned()));
            }
            Ok(Event::End(_)) => {
                // the synthetic root is never closed
                if stack.len() < 2 {
                    return Err(FinderError::Parse("Unbalanced closing tag in efetch XML".into()));
                }
                if let Some(element) = stack.pop() {
                    append_child(&mut stack, Node::Element(element));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FinderError::Parse(format!(
                    "Invalid efetch XML at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            Ok(_) => {}
        }
    }

    if stack.len() != 1 {
        return Err(FinderError::Parse("Truncated efetch XML".into()));
    }
    stack.pop().ok_or_parse("Empty efetch XML")
}

/// Parse an efetch XML response into papers.
///
/// # Errors
///
/// Returns [`FinderError::Parse`] when the document itself is not well-formed.
/// Individual articles that cannot be interpreted are skipped.
pub fn parse_fetch_response(xml: &str) -> Result<Vec<Paper>> {
    let root = parse_document(xml)?;

    let mut articles = Vec::new();
    root.find_all("PubmedArticle", &mut articles);

    let mut papers = Vec::with_capacity(articles.len());
    for article in articles {
        match parse_article(article) {
            Ok(paper) => papers.push(paper),
            Err(e) => warn!(error = %e, "Skipping malformed article"),
        }
    }

    debug!(count = papers.len(), "Parsed efetch response");
    Ok(papers)
}

fn parse_article(article: &Element) -> Result<Paper> {
    let pmid = article.find_text("PMID").ok_or_parse("Article without PMID")?;

    let title = article
        .find_text("ArticleTitle")
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

    let publication_date = parse_publication_date(article)
        .map_err(|e| FinderError::Parse(format!("PMID {}: {}", pmid, e)))?;

    let authors = parse_authors(article);

    Ok(Paper::new(pmid, title, publication_date).with_authors(authors))
}

/// Publication date from the first of `PubMedPubDate[PubStatus=pubmed]`,
/// `ArticleDate` or `PubDate`; each missing part falls back on its own.
fn parse_publication_date(article: &Element) -> Result<NaiveDate> {
    let date_elem = article
        .find_by(&|e: &Element| e.name == "PubMedPubDate" && e.attr("PubStatus") == Some("pubmed"))
        .or_else(|| article.find("ArticleDate"))
        .or_else(|| article.find("PubDate"));

    let (year, month, day) = match date_elem {
        Some(d) => (
            d.find_text("Year")
                .map(|y| y.parse::<i32>().map_err(|_| format!("invalid year {:?}", y)))
                .transpose()
                .map_err(FinderError::Parse)?
                .unwrap_or(DEFAULT_YEAR),
            d.find_text("Month")
                .map(|m| parse_month(&m).ok_or_else(|| format!("invalid month {:?}", m)))
                .transpose()
                .map_err(FinderError::Parse)?
                .unwrap_or(DEFAULT_MONTH),
            d.find_text("Day")
                .map(|v| v.parse::<u32>().map_err(|_| format!("invalid day {:?}", v)))
                .transpose()
                .map_err(FinderError::Parse)?
                .unwrap_or(DEFAULT_DAY),
        ),
        None => (DEFAULT_YEAR, DEFAULT_MONTH, DEFAULT_DAY),
    };

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_parse(&format!("invalid date {}-{}-{}", year, month, day))
}

/// Month as a number ("05") or an English name ("May", "Sep", "September").
fn parse_month(raw: &str) -> Option<u32> {
    if let Ok(n) = raw.parse::<u32>() {
        return Some(n);
    }

    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let lower = raw.to_lowercase();
    let prefix = lower.get(..3)?;
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .map(|i| i as u32 + 1)
}

fn parse_authors(article: &Element) -> Vec<Author> {
    let Some(author_list) = article.find("AuthorList") else {
        return Vec::new();
    };

    author_list
        .child_elements()
        .filter(|e| e.name == "Author")
        .filter_map(|elem| {
            let author = parse_author(elem);
            if author.is_none() {
                debug!("Skipping author without a name");
            }
            author
        })
        .collect()
}

fn parse_author(elem: &Element) -> Option<Author> {
    let last_name = elem.find_text("LastName");
    let fore_name = elem.find_text("ForeName");

    let name = match (fore_name, last_name) {
        (Some(fore), Some(last)) => format!("{} {}", fore, last),
        (None, Some(last)) => last,
        _ => elem.find_text("CollectiveName")?,
    };

    let mut identifiers = Vec::new();
    elem.find_all("Identifier", &mut identifiers);
    let is_corresponding = identifiers
        .iter()
        .any(|id| id.attr("Source") == Some("CORRESP"));

    let affiliation = elem.find_text("Affiliation");
    let email = affiliation.as_deref().and_then(extract_email);

    Some(Author {
        name,
        affiliation,
        email,
        is_corresponding,
        ..Default::default()
    })
}

/// First email-looking token in free text, without a trailing full stop.
pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_RE
        .find(text)
        .map(|m| m.as_str().trim_end_matches('.').to_string())
}
