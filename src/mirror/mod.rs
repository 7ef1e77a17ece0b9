//! Mirror resolution: candidate locator to concrete asset URL.
//!
//! Resolution runs up to three stages, each a fetch plus a rule-table search:
//!
//! - **Stage A** (details page): find the link to a mirror page
//!   ([`rules::DETAILS_RULES`]), else [`PipelineError::MirrorNotFound`].
//! - **Stage B** (mirror page): find the link to the file
//!   ([`rules::MIRROR_RULES`]), else [`PipelineError::DownloadLinkNotFound`].
//! - **Stage C**: resolve the chosen target against the page it was found on.
//!
//! A locator that already points at a file skips straight to the end, and a
//! Stage A link that points at a file skips Stage B. A candidate with only a
//! content id starts at Stage B on the page built from the mirror template.
//! The candidate itself is never modified.

pub mod anchors;
pub mod rules;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument};
use url::Url;

use crate::candidate::{Candidate, ResolvedAsset};
use crate::error::PipelineError;
use crate::extract::SourceShape;
use crate::fetch::{FetchOptions, Fetcher};
use crate::util::{absolutize_url, binary_extension, is_binary_url};

use anchors::collect_anchors;
use rules::{DETAILS_RULES, MIRROR_RULES, NamedRule, StageContext, first_match};

/// Placeholder replaced by the candidate's content id in mirror templates.
pub const CONTENT_ID_PLACEHOLDER: &str = "{content_id}";

/// Extension used when neither the candidate nor the URL names one.
const FALLBACK_EXTENSION: &str = "bin";

/// Which pages sit between a candidate's locator and the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageShape {
    /// Locator is a catalog details page linking to a mirror page.
    DetailsThenMirrorV1,
    /// Locator is already the mirror page.
    MirrorOnlyV1,
}

impl PageShape {
    /// Page shape implied by the layout the candidate was extracted from.
    #[must_use]
    pub fn for_source(shape: SourceShape) -> Self {
        match shape {
            SourceShape::IndexTableV1 | SourceShape::FictionTableV1 => Self::DetailsThenMirrorV1,
            SourceShape::JsonHitsV1 => Self::MirrorOnlyV1,
        }
    }
}

/// Resolver configuration.
#[derive(Debug, Clone)]
pub struct MirrorSettings {
    /// Timeout for each page fetch.
    pub page_timeout: Duration,
    /// Mirror page URL with a `{content_id}` placeholder.
    pub mirror_page_template: Option<String>,
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self {
            page_timeout: Duration::from_secs(10),
            mirror_page_template: None,
        }
    }
}

/// Walks a candidate's mirror chain to an asset URL.
pub struct MirrorResolver {
    fetcher: Arc<dyn Fetcher>,
    settings: MirrorSettings,
}

impl std::fmt::Debug for MirrorResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorResolver")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Outcome of one stage search.
struct StageHit {
    url: String,
    page: String,
}

impl MirrorResolver {
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, settings: MirrorSettings) -> Self {
        Self { fetcher, settings }
    }

    /// Resolves `candidate` to a [`ResolvedAsset`].
    ///
    /// # Errors
    ///
    /// - [`PipelineError::MirrorNotFound`] when Stage A finds no mirror link
    /// - [`PipelineError::DownloadLinkNotFound`] when Stage B finds no file link
    /// - fetch failures mapped through `From<FetchError>`
    #[instrument(skip(self, candidate), fields(title = %candidate.title, shape = ?shape))]
    pub async fn resolve(
        &self,
        candidate: &Candidate,
        shape: PageShape,
    ) -> Result<ResolvedAsset, PipelineError> {
        let mut trail = Vec::new();
        let locator = candidate.locator.trim();

        if !locator.is_empty() && is_binary_url(locator) {
            debug!(url = locator, "locator already points at a file");
            return Ok(finish(candidate, locator.to_string(), trail));
        }

        let mirror_page = if locator.is_empty() {
            self.template_page(candidate)?
        } else {
            match shape {
                PageShape::DetailsThenMirrorV1 => {
                    let hit = self
                        .stage(locator, candidate, DETAILS_RULES)
                        .await?
                        .ok_or_else(|| PipelineError::mirror_not_found(locator, &candidate.title))?;
                    trail.push(hit.page);
                    if is_binary_url(&hit.url) {
                        debug!(url = %hit.url, "mirror link already points at a file");
                        return Ok(finish(candidate, hit.url, trail));
                    }
                    hit.url
                }
                PageShape::MirrorOnlyV1 => locator.to_string(),
            }
        };

        let hit = self
            .stage(&mirror_page, candidate, MIRROR_RULES)
            .await?
            .ok_or_else(|| PipelineError::download_link_not_found(&mirror_page))?;
        trail.push(hit.page);
        Ok(finish(candidate, hit.url, trail))
    }

    /// Mirror page URL built from the template and the content id.
    fn template_page(&self, candidate: &Candidate) -> Result<String, PipelineError> {
        let content_id = candidate.content_id.trim();
        match self.settings.mirror_page_template.as_deref() {
            Some(template) if !content_id.is_empty() => {
                let url = template.replace(CONTENT_ID_PLACEHOLDER, content_id);
                debug!(url = %url, "mirror page built from content id");
                Ok(url)
            }
            _ => Err(PipelineError::mirror_not_found(
                "(no locator or mirror template)",
                &candidate.title,
            )),
        }
    }

    /// Fetches `page_url`, applies `rules`, and absolutizes the winning target
    /// against the final (post-redirect) page URL.
    async fn stage(
        &self,
        page_url: &str,
        candidate: &Candidate,
        rules: &[NamedRule],
    ) -> Result<Option<StageHit>, PipelineError> {
        let response = self
            .fetcher
            .fetch(page_url, &FetchOptions::text(self.settings.page_timeout))
            .await?;
        let final_url: Url = response.url.clone();
        let html = response.into_text()?;
        let anchors = collect_anchors(&html);

        let context = StageContext {
            title: &candidate.title,
            content_id: &candidate.content_id,
            page_url: &final_url,
        };
        let Some((rule, anchor)) = first_match(rules, &anchors, &context) else {
            info!(page = %final_url, anchors = anchors.len(), "no rule matched");
            return Ok(None);
        };

        let Some(url) = absolutize_url(&anchor.href, &final_url) else {
            info!(page = %final_url, href = %anchor.href, "matched link is not a URL");
            return Ok(None);
        };
        debug!(page = %final_url, rule, url = %url, "link matched");
        Ok(Some(StageHit {
            url,
            page: final_url.to_string(),
        }))
    }
}

fn finish(candidate: &Candidate, url: String, trail: Vec<String>) -> ResolvedAsset {
    ResolvedAsset {
        suggested_extension: suggested_extension(candidate, &url),
        url,
        source_candidate: candidate.clone(),
        trail,
    }
}

/// Candidate's listed extension, else the URL's, else a neutral fallback.
fn suggested_extension(candidate: &Candidate, url: &str) -> String {
    candidate
        .extension
        .split(|c: char| !c.is_ascii_alphanumeric())
        .find(|token| !token.is_empty())
        .map(str::to_ascii_lowercase)
        .or_else(|| binary_extension(url).map(str::to_string))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}
