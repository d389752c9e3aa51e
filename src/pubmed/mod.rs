//! PubMed access through NCBI E-utilities: hit counts, paged retrieval and
//! `efetch` XML parsing.

pub mod client;
mod parse;
pub mod types;

pub use client::{PubMedClient, PubMedError, SearchService};
pub use types::Article;
