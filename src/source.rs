//! Catalog sources: where a search is sent and how its answer is shaped.
//!
//! A [`CatalogSource`] turns a [`SearchQuery`] into a [`SearchRequest`]: the
//! URL to fetch, the headers to send, and the [`SourceShape`] the answer will
//! have. Credentials for the hosted API are injected at construction and never
//! embedded in source.

use std::fmt;

use url::Url;

use crate::error::PipelineError;
use crate::extract::SourceShape;
use crate::query::SearchQuery;
use crate::user_agent;

/// Default scraped catalog.
pub const DEFAULT_INDEX_BASE_URL: &str = "https://libgen.is/";

/// Default mirror page template for content-id-only candidates.
pub const DEFAULT_MIRROR_PAGE_TEMPLATE: &str = "https://library.lol/main/{content_id}";

/// Default header carrying the API key.
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";

/// Page sizes the index accepts for its `res` parameter.
const INDEX_PAGE_SIZES: [usize; 3] = [25, 50, 100];

/// Key for the hosted search API.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    /// Header name the key is sent in.
    pub header: String,
    /// The key itself.
    pub key: String,
}

impl ApiCredentials {
    #[must_use]
    pub fn new(header: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            key: key.into(),
        }
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("header", &self.header)
            .field("key", &"[redacted]")
            .finish()
    }
}

/// One place a search can be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// Scraped book-index site (non-fiction index plus fiction catalog).
    IndexSite { base_url: Url },
    /// Hosted JSON search API.
    HostedApi {
        base_url: Url,
        credentials: ApiCredentials,
    },
}

/// A ready-to-send search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub url: String,
    pub shape: SourceShape,
    pub headers: Vec<(String, String)>,
}

impl CatalogSource {
    /// Index site source.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] when `base_url` is not an absolute URL.
    pub fn index_site(base_url: &str) -> Result<Self, PipelineError> {
        Ok(Self::IndexSite {
            base_url: parse_base(base_url)?,
        })
    }

    /// Hosted API source.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] when `base_url` is not an absolute URL.
    pub fn hosted_api(base_url: &str, credentials: ApiCredentials) -> Result<Self, PipelineError> {
        Ok(Self::HostedApi {
            base_url: parse_base(base_url)?,
            credentials,
        })
    }

    /// Short name used in logs and reports.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::IndexSite { .. } => "index-site",
            Self::HostedApi { .. } => "hosted-api",
        }
    }

    /// Builds the search request for `query`.
    ///
    /// The `fiction` category routes the index site to its fiction catalog;
    /// all categories are forwarded to the hosted API.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] if the URL cannot be built.
    pub fn search_request(&self, query: &SearchQuery) -> Result<SearchRequest, PipelineError> {
        match self {
            Self::IndexSite { base_url } if query.is_fiction() => {
                let mut url = join(base_url, "fiction/")?;
                url.query_pairs_mut()
                    .append_pair("q", query.text())
                    .append_pair("criteria", "")
                    .append_pair("language", "")
                    .append_pair(
                        "format",
                        query
                            .preferred_format()
                            .format()
                            .map_or("", |format| format.as_str()),
                    );
                Ok(SearchRequest {
                    url: url.into(),
                    shape: SourceShape::FictionTableV1,
                    headers: Vec::new(),
                })
            }
            Self::IndexSite { base_url } => {
                let mut url = join(base_url, "search.php")?;
                url.query_pairs_mut()
                    .append_pair("req", query.text())
                    .append_pair("res", &index_page_size(query.result_limit()).to_string())
                    .append_pair("column", "def")
                    .append_pair("view", "simple");
                Ok(SearchRequest {
                    url: url.into(),
                    shape: SourceShape::IndexTableV1,
                    headers: Vec::new(),
                })
            }
            Self::HostedApi {
                base_url,
                credentials,
            } => {
                let mut url = join(base_url, "search")?;
                {
                    let mut pairs = url.query_pairs_mut();
                    pairs
                        .append_pair("q", query.text())
                        .append_pair("limit", &query.result_limit().to_string());
                    if let Some(format) = query.preferred_format().format() {
                        pairs.append_pair("ext", format.as_str());
                    }
                    for category in query.categories() {
                        pairs.append_pair("cat", category);
                    }
                }
                Ok(SearchRequest {
                    url: url.into(),
                    shape: SourceShape::JsonHitsV1,
                    headers: vec![
                        (credentials.header.clone(), credentials.key.clone()),
                        ("User-Agent".to_string(), user_agent::api_user_agent()),
                        ("Accept".to_string(), "application/json".to_string()),
                    ],
                })
            }
        }
    }
}

/// Smallest index page size that covers `limit`.
fn index_page_size(limit: usize) -> usize {
    INDEX_PAGE_SIZES
        .into_iter()
        .find(|size| *size >= limit)
        .unwrap_or(INDEX_PAGE_SIZES[INDEX_PAGE_SIZES.len() - 1])
}

/// Parses a base URL and makes sure relative joins stay under its path.
fn parse_base(value: &str) -> Result<Url, PipelineError> {
    let trimmed = value.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash)
        .map_err(|e| PipelineError::invalid_input(format!("invalid base URL '{value}': {e}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(PipelineError::invalid_input(format!(
            "base URL '{value}' must be an http(s) URL"
        )));
    }
    Ok(url)
}

fn join(base: &Url, path: &str) -> Result<Url, PipelineError> {
    base.join(path)
        .map_err(|e| PipelineError::invalid_input(format!("cannot build search URL: {e}")))
}
