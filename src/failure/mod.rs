//! Failure classification and user-facing descriptors for pipeline errors.

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FailureCategory {
    Input,
    NotFound,
    Network,
    Resolution,
    Storage,
    Other,
}

impl FailureCategory {
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Input => "❌",
            Self::NotFound => "🔎",
            Self::Network => "🌐",
            Self::Resolution => "🔗",
            Self::Storage => "💾",
            Self::Other => "⚠️",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::NotFound => "No results",
            Self::Network => "Network",
            Self::Resolution => "Mirror resolution",
            Self::Storage => "Storage",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureDescriptor {
    pub category: FailureCategory,
    pub what: &'static str,
    pub why: &'static str,
    pub fix: &'static str,
}

/// Maps a pipeline error to its What/Why/Fix descriptor.
#[must_use]
pub fn describe_failure(error: &PipelineError) -> FailureDescriptor {
    match error {
        PipelineError::InvalidInput { .. } => FailureDescriptor {
            category: FailureCategory::Input,
            what: "Request rejected",
            why: "A parameter was empty or out of range, so no request was sent.",
            fix: "Correct the highlighted parameter and run the command again.",
        },
        PipelineError::NoResults { .. } => FailureDescriptor {
            category: FailureCategory::NotFound,
            what: "No matching books",
            why: "The catalog answered, but nothing matched the query and format filter.",
            fix: "Try a different query, a broader format (`any`), or another category.",
        },
        PipelineError::UpstreamUnavailable { .. } => FailureDescriptor {
            category: FailureCategory::Network,
            what: "Catalog or mirror unreachable",
            why: "DNS, connection, or timeout failures prevented a response.",
            fix: "The source may be down; check connectivity and try again later.",
        },
        PipelineError::MirrorNotFound { .. } => FailureDescriptor {
            category: FailureCategory::Resolution,
            what: "No mirror link found",
            why: "The details page had no link matching any known mirror pattern.",
            fix: "Retry with --debug for diagnostics, or pick another candidate.",
        },
        PipelineError::DownloadLinkNotFound { .. } => FailureDescriptor {
            category: FailureCategory::Resolution,
            what: "No download link found",
            why: "The mirror page had no link matching any known download pattern.",
            fix: "Retry with --debug for diagnostics, or pick another candidate.",
        },
        PipelineError::HttpStatus { status: 404 | 410, .. } => FailureDescriptor {
            category: FailureCategory::NotFound,
            what: "Page not found",
            why: "A catalog or mirror page returned 404/410, which usually means a stale link.",
            fix: "Search again to refresh the links, or pick another candidate.",
        },
        PipelineError::HttpStatus { .. } => FailureDescriptor {
            category: FailureCategory::Network,
            what: "Unexpected HTTP status",
            why: "A catalog or mirror page answered with a non-success status.",
            fix: "Wait a moment and retry; the mirror may be rate limiting or overloaded.",
        },
        PipelineError::ResponseTooLarge { .. } => FailureDescriptor {
            category: FailureCategory::Storage,
            what: "File exceeds the size limit",
            why: "The asset is larger than the configured `max_download_bytes` ceiling.",
            fix: "Raise `max_download_bytes` in the config file or pick a smaller edition.",
        },
        PipelineError::Sink { .. } => FailureDescriptor {
            category: FailureCategory::Storage,
            what: "Could not save the file",
            why: "Writing to the output directory failed; any partial file was removed.",
            fix: "Check free space and permissions, or pass --output-dir.",
        },
        PipelineError::Fetch { .. } => FailureDescriptor {
            category: FailureCategory::Other,
            what: "Request could not be made",
            why: "A link could not be fetched for a reason other than the network or status.",
            fix: "Retry with --debug and inspect the error chain.",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;

    #[test]
    fn test_describe_invalid_input() {
        let descriptor = describe_failure(&PipelineError::index_out_of_range(99, 3));
        assert_eq!(descriptor.category, FailureCategory::Input);
    }

    #[test]
    fn test_describe_http_404_is_not_found() {
        let descriptor = describe_failure(&PipelineError::HttpStatus {
            url: "https://m/x".to_string(),
            status: 404,
        });
        assert_eq!(descriptor.category, FailureCategory::NotFound);
        assert_eq!(descriptor.what, "Page not found");
    }

    #[test]
    fn test_describe_http_503_is_network() {
        let descriptor = describe_failure(&PipelineError::HttpStatus {
            url: "https://m/x".to_string(),
            status: 503,
        });
        assert_eq!(descriptor.category, FailureCategory::Network);
    }

    #[test]
    fn test_describe_resolution_failures_offer_debug_retry() {
        for error in [
            PipelineError::mirror_not_found("https://c/details", "Dune"),
            PipelineError::download_link_not_found("https://m/page"),
        ] {
            let descriptor = describe_failure(&error);
            assert_eq!(descriptor.category, FailureCategory::Resolution);
            assert!(descriptor.fix.contains("--debug"));
        }
    }

    #[test]
    fn test_describe_upstream_unavailable() {
        let error = PipelineError::from(FetchError::timeout("https://c/search", 10));
        assert_eq!(describe_failure(&error).category, FailureCategory::Network);
    }

    #[test]
    fn test_category_labels_are_distinct() {
        let categories = [
            FailureCategory::Input,
            FailureCategory::NotFound,
            FailureCategory::Network,
            FailureCategory::Resolution,
            FailureCategory::Storage,
            FailureCategory::Other,
        ];
        let mut labels: Vec<&str> = categories.iter().map(|c| c.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), categories.len());
    }
}
