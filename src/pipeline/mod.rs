//! Two-phase resolution pipeline.
//!
//! - **Phase 1, search**: query each configured catalog source in order until
//!   one yields candidates.
//! - **Phase 2, select and fetch**: validate the selection index, resolve the
//!   candidate's mirror chain, stream the asset into the sink, optionally open it.
//!
//! Each invocation is self-contained. A follow-up call with a selection index
//! repeats the (deterministic) search instead of relying on saved state.

mod request;

pub use request::{BookRequest, Outcome, SavedBook, SelectionMode, ToolResponse};

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::candidate::Candidate;
use crate::error::PipelineError;
use crate::extract::{SourceShape, extract_candidates};
use crate::fetch::{FetchOptions, Fetcher};
use crate::mirror::{MirrorResolver, MirrorSettings, PageShape};
use crate::query::{FormatPreference, SearchQuery};
use crate::report;
use crate::sink::{Sink, build_book_filename};
use crate::source::{CatalogSource, DEFAULT_MIRROR_PAGE_TEMPLATE};

/// Default timeout for search, details, and mirror pages.
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for the asset download.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub metadata_timeout: Duration,
    pub download_timeout: Duration,
    /// Byte ceiling for the asset; `None` for no ceiling.
    pub max_download_bytes: Option<u64>,
    pub selection_mode: SelectionMode,
    pub mirror_page_template: Option<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            metadata_timeout: DEFAULT_METADATA_TIMEOUT,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            max_download_bytes: None,
            selection_mode: SelectionMode::Explicit,
            mirror_page_template: Some(DEFAULT_MIRROR_PAGE_TEMPLATE.to_string()),
        }
    }
}

/// Ordered candidates from one search, with the layout they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateList {
    pub query: SearchQuery,
    pub candidates: Vec<Candidate>,
    pub shape: SourceShape,
    /// Name of the source that answered.
    pub source: &'static str,
}

impl CandidateList {
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// The resolution pipeline.
pub struct Pipeline {
    fetcher: Arc<dyn Fetcher>,
    sources: Vec<CatalogSource>,
    sink: Arc<dyn Sink>,
    resolver: MirrorResolver,
    settings: PipelineSettings,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("sources", &self.sources)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Creates a pipeline. `sources` are tried in order during search.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        sources: Vec<CatalogSource>,
        sink: Arc<dyn Sink>,
        settings: PipelineSettings,
    ) -> Self {
        let resolver = MirrorResolver::new(
            Arc::clone(&fetcher),
            MirrorSettings {
                page_timeout: settings.metadata_timeout,
                mirror_page_template: settings.mirror_page_template.clone(),
            },
        );
        Self {
            fetcher,
            sources,
            sink,
            resolver,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Phase 1: returns the first non-empty candidate list across sources.
    ///
    /// A source that fails at the transport layer is logged and skipped; any
    /// other failure (an HTTP status such as 401, an oversized answer) ends the
    /// search. If every source was unreachable the last transport failure is
    /// returned; if at least one answered but none yielded candidates the
    /// result is [`PipelineError::NoResults`].
    ///
    /// # Errors
    ///
    /// See above; never returns an empty list.
    #[instrument(skip(self, query), fields(query = %query.text(), format = %query.preferred_format()))]
    pub async fn search(&self, query: &SearchQuery) -> Result<CandidateList, PipelineError> {
        let mut last_failure: Option<PipelineError> = None;
        let mut answered = false;

        for source in &self.sources {
            let request = source.search_request(query)?;
            debug!(source = source.name(), url = %request.url, "searching");

            let options = FetchOptions::text(self.settings.metadata_timeout)
                .with_headers(request.headers.iter().cloned());
            let response = match self.fetcher.fetch(&request.url, &options).await {
                Ok(response) => response,
                Err(error) if error.is_transport() => {
                    warn!(source = source.name(), error = %error, "search source unreachable");
                    last_failure = Some(error.into());
                    continue;
                }
                Err(error) => return Err(error.into()),
            };
            let base_url = response.url.clone();
            let body = response.into_text()?;
            answered = true;

            let candidates = extract_candidates(&body, request.shape, &base_url, query);
            if candidates.is_empty() {
                info!(source = source.name(), "source answered with no usable candidates");
                continue;
            }

            info!(source = source.name(), count = candidates.len(), "search complete");
            return Ok(CandidateList {
                query: query.clone(),
                candidates,
                shape: request.shape,
                source: source.name(),
            });
        }

        match last_failure {
            Some(failure) if !answered => Err(failure),
            _ => Err(PipelineError::no_results(
                query.text(),
                query.preferred_format().to_string(),
            )),
        }
    }

    /// Phase 2: downloads candidate `index` of `list` into the sink.
    ///
    /// The index is validated before anything else; an out-of-range index
    /// makes no network call. An OS-open failure after a successful save is
    /// logged and reported through [`SavedBook::opened`], not as an error.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidInput`] for a bad index, otherwise any
    /// resolution, fetch, or sink failure.
    #[instrument(skip(self, list), fields(candidates = list.len()))]
    pub async fn select_and_fetch(
        &self,
        list: &CandidateList,
        index: i64,
        auto_open: bool,
        download_timeout: Option<Duration>,
    ) -> Result<SavedBook, PipelineError> {
        let candidate = usize::try_from(index)
            .ok()
            .and_then(|i| list.candidates.get(i))
            .ok_or_else(|| PipelineError::index_out_of_range(index, list.len()))?;

        let asset = self
            .resolver
            .resolve(candidate, PageShape::for_source(list.shape))
            .await?;
        info!(url = %asset.url, "asset resolved");

        let timeout = download_timeout.unwrap_or(self.settings.download_timeout);
        let options =
            FetchOptions::stream(timeout).with_max_bytes(self.settings.max_download_bytes);
        let response = self.fetcher.fetch(&asset.url, &options).await?;

        let filename = build_book_filename(
            &candidate.title,
            &candidate.author,
            &asset.suggested_extension,
        );
        let persisted = self.sink.persist(response.into_stream(), &filename).await?;

        let opened = auto_open
            && match self.sink.open(&persisted.path) {
                Ok(()) => true,
                Err(error) => {
                    warn!(error = %error, "saved file could not be opened");
                    false
                }
            };

        Ok(SavedBook {
            path: persisted.path,
            bytes: persisted.bytes,
            opened,
            asset_url: asset.url,
            candidate: asset.source_candidate,
        })
    }

    /// The single invocation operation: search, then download when a selection
    /// is given (or auto-selection is enabled).
    ///
    /// All input validation happens before the first network call.
    ///
    /// # Errors
    ///
    /// Any [`PipelineError`] from validation, search, or download.
    #[instrument(skip(self, request), fields(query = %request.query))]
    pub async fn search_and_download_book(
        &self,
        request: &BookRequest,
    ) -> Result<Outcome, PipelineError> {
        let query = build_query(request)?;
        let download_timeout = validate_timeout(request.timeout_ms)?;
        if let Some(index) = request.selection_index
            && index < 0
        {
            return Err(PipelineError::InvalidInput {
                message: format!("selection index {index} must not be negative"),
                suggestion: "Pick an index from the listed candidates",
            });
        }

        let list = self.search(&query).await?;

        let mode = request.selection_mode.unwrap_or(self.settings.selection_mode);
        let index = request.selection_index.or(match mode {
            SelectionMode::AutoFirst => Some(0),
            SelectionMode::Explicit => None,
        });

        match index {
            None => Ok(Outcome::Candidates(list)),
            Some(index) => self
                .select_and_fetch(&list, index, request.auto_open, download_timeout)
                .await
                .map(Outcome::Saved),
        }
    }

    /// Runs [`Self::search_and_download_book`] and renders the outcome.
    ///
    /// Never fails: errors become an unsuccessful [`ToolResponse`], with the
    /// full error chain attached when `request.debug` is set.
    pub async fn respond(&self, request: &BookRequest) -> ToolResponse {
        match self.search_and_download_book(request).await {
            Ok(Outcome::Candidates(list)) => ToolResponse::ok(report::render_candidates(&list)),
            Ok(Outcome::Saved(saved)) => ToolResponse::ok(report::render_saved(&saved)),
            Err(error) => {
                info!(error = %error, "request failed");
                ToolResponse {
                    success: false,
                    message: report::render_failure(&error),
                    debug: request.debug.then(|| report::render_debug(&error)),
                }
            }
        }
    }
}

fn build_query(request: &BookRequest) -> Result<SearchQuery, PipelineError> {
    let format: FormatPreference = request.format.as_deref().unwrap_or("any").parse()?;
    let mut query = SearchQuery::new(request.query.as_str())?
        .with_format(format)
        .with_categories(&request.category);
    if let Some(limit) = request.result_limit {
        query = query.with_result_limit(limit)?;
    }
    Ok(query)
}

fn validate_timeout(timeout_ms: Option<u64>) -> Result<Option<Duration>, PipelineError> {
    match timeout_ms {
        Some(0) => Err(PipelineError::InvalidInput {
            message: "download timeout must be greater than 0 ms".to_string(),
            suggestion: "Pass a positive timeout in milliseconds",
        }),
        other => Ok(other.map(Duration::from_millis)),
    }
}
