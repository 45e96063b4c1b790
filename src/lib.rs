//! # pubmed-company-finder
//!
//! Find PubMed papers with at least one author affiliated with a
//! pharmaceutical or biotech company.
//!
//! ## Modules
//!
//! - [`pubmed`] - E-utilities client (esearch + batched efetch)
//! - [`parser`] - efetch XML to paper records
//! - [`models`] - Paper and author records
//! - [`filters`] - Affiliation classifier
//! - [`export`] - Row flattening and CSV output
//! - [`finder`] - The whole pipeline
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pubmed_company_finder::{finder, pubmed::{PubMedClient, PubMedConfig}};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = PubMedClient::new(PubMedConfig::default())?;
//!     let papers = finder::find_papers_with_company_authors(&client, "cancer immunotherapy", 50).await?;
//!     println!("Found {} papers", papers.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod export;
pub mod filters;
pub mod finder;
pub mod models;
pub mod parser;
pub mod pubmed;

pub use error::{FinderError, Result};
pub use models::{Author, Paper};
