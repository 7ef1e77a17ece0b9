//! Shared User-Agent strings for catalog, mirror, and API requests.
//!
//! Index and mirror hosts reject empty or library-default identities, so page
//! and asset requests present a desktop browser. The hosted API is a keyed
//! service and gets an honest tool identity instead.

/// Project URL for User-Agent identification on keyed API calls.
const PROJECT_UA_URL: &str = "https://github.com/fierce/bookfetch";

/// Browser User-Agent sent to scraped catalog and mirror pages.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Default User-Agent for page and asset requests.
#[must_use]
pub(crate) fn default_page_user_agent() -> String {
    BROWSER_USER_AGENT.to_string()
}

/// User-Agent for hosted search API requests (identifies the tool and version).
#[must_use]
pub(crate) fn api_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("bookfetch/{version} (+{PROJECT_UA_URL})")
}
