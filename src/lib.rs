//! Bookfetch Core Library
//!
//! This library turns a free-text book query into a file on disk. A query is
//! sent to a catalog (a scraped book-index site or a hosted search API), the
//! answer is normalized into an ordered candidate list, a chosen candidate is
//! resolved through its mirror chain to a concrete asset URL, and the asset is
//! streamed into a sink.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`fetch`] - HTTP fetch capability with per-call timeouts and a byte ceiling
//! - [`query`] - Search query model and input validation
//! - [`candidate`] - Normalized candidate records and resolved assets
//! - [`extract`] - Candidate extraction from results tables and JSON hits
//! - [`mirror`] - Mirror resolution stages driven by ordered link-rule tables
//! - [`source`] - Catalog sources, search URL construction, API credentials
//! - [`pipeline`] - Two-phase search / select-and-fetch orchestration
//! - [`sink`] - Destination directory, file naming, streaming write, OS open
//! - [`error`] / [`failure`] - Error taxonomy and user-facing descriptors
//! - [`report`] - Human-readable responses
//! - [`config`] - File and environment configuration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod candidate;
pub mod config;
pub mod error;
pub mod extract;
pub mod failure;
pub mod fetch;
pub mod mirror;
pub mod pipeline;
pub mod query;
pub mod report;
pub mod sink;
pub mod source;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;
pub(crate) mod util;

// Re-export commonly used types
pub use candidate::{Candidate, ResolvedAsset, SizeInfo};
pub use config::{ConfigError, FileConfig, LoadedConfig, Settings, load_default_file_config};
pub use error::PipelineError;
pub use extract::{SourceShape, extract_candidates};
pub use failure::{FailureCategory, FailureDescriptor, describe_failure};
pub use fetch::{
    ByteStream, FetchError, FetchOptions, FetchResponse, Fetcher, HttpFetcher, Payload,
    ResponseKind,
};
pub use mirror::{MirrorResolver, PageShape};
pub use pipeline::{
    BookRequest, CandidateList, Outcome, Pipeline, PipelineSettings, SavedBook, SelectionMode,
    ToolResponse,
};
pub use query::{BookFormat, DEFAULT_RESULT_LIMIT, FormatPreference, SearchQuery};
pub use sink::{FileSink, PersistedFile, Sink, SinkError, build_book_filename, default_download_dir};
pub use source::{ApiCredentials, CatalogSource, SearchRequest};
