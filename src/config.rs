// src/config.rs
// =============================================================================
// Options consumed by the checkers.
//
// The options are plain data: the command-line driver fills them from flags,
// other callers can deserialize them from JSON. Every field has a default so
// a partial config file is fine.
// =============================================================================

use crate::link::{ExcludedReason, Link};
use crate::scrape::tags;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How much of the tag registry gets checked.
///
/// Ordered: every level includes the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FilterLevel {
    /// Links a user can click
    Clickable,
    /// Plus images, audio, video and frames
    Media,
    /// Plus stylesheets and scripts
    Assets,
    /// Plus citations, form actions and other metadata
    Metadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestMethod {
    /// HEAD first, GET when the server rejects HEAD
    Head,
    Get,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerOptions {
    /// Pages fetched at the same time
    pub max_pages: usize,
    /// Links checked at the same time
    pub max_links: usize,
    pub timeout_secs: u64,
    /// Delay before every network check
    pub rate_limit_ms: u64,
    pub accepted_schemes: Vec<String>,
    /// Unaccepted schemes are excluded when true, broken when false
    pub exclude_unaccepted_schemes: bool,
    pub excluded_keywords: Vec<String>,
    pub exclude_external_links: bool,
    pub exclude_internal_links: bool,
    pub exclude_links_to_same_page: bool,
    pub filter_level: FilterLevel,
    pub request_method: RequestMethod,
    pub cache_responses: bool,
    pub user_agent: String,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        Self {
            max_pages: 1,
            max_links: 8,
            timeout_secs: 10,
            rate_limit_ms: 0,
            accepted_schemes: vec!["http".to_string(), "https".to_string()],
            exclude_unaccepted_schemes: true,
            excluded_keywords: Vec::new(),
            exclude_external_links: false,
            exclude_internal_links: false,
            exclude_links_to_same_page: true,
            filter_level: FilterLevel::Media,
            request_method: RequestMethod::Head,
            cache_responses: true,
            user_agent: concat!("link-auditor/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl CheckerOptions {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    pub fn accepts_scheme(&self, scheme: &str) -> bool {
        self.accepted_schemes
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(scheme))
    }

    /// Returns why a link should be skipped, if it should be.
    ///
    /// Scheme handling is not part of this: an unaccepted scheme can be
    /// either excluded or broken, which the URL checker decides.
    pub fn exclusion(&self, link: &Link) -> Option<ExcludedReason> {
        if let Some(html) = &link.html {
            match tags::filter_level(&html.tag_name, &html.attr_name) {
                Some(level) if level > self.filter_level => {
                    return Some(ExcludedReason::FilterLevel)
                }
                _ => {}
            }
        }

        if let Some(resolved) = &link.url.resolved {
            let url = resolved.as_str();
            if self
                .excluded_keywords
                .iter()
                .any(|keyword| !keyword.is_empty() && url.contains(keyword.as_str()))
            {
                return Some(ExcludedReason::Keyword);
            }
        }

        match link.internal {
            Some(false) if self.exclude_external_links => return Some(ExcludedReason::External),
            Some(true) if self.exclude_internal_links => return Some(ExcludedReason::Internal),
            _ => {}
        }

        if self.exclude_links_to_same_page && link.same_page == Some(true) {
            return Some(ExcludedReason::SamePage);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::scrape_html;
    use url::Url;

    fn page() -> Url {
        Url::parse("https://example.com/index.html").unwrap()
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options = CheckerOptions::from_json(r#"{ "max_links": 3, "filter_level": "metadata" }"#).unwrap();
        assert_eq!(options.max_links, 3);
        assert_eq!(options.filter_level, FilterLevel::Metadata);
        assert_eq!(options.max_pages, 1);
        assert!(options.accepts_scheme("HTTPS"));
        assert!(!options.accepts_scheme("mailto"));
    }

    #[test]
    fn test_filter_level_exclusion() {
        let links = scrape_html(r#"<a href="a.html">a</a><q cite="b.html">b</q>"#, Some(&page()));
        let options = CheckerOptions::default();
        assert_eq!(options.exclusion(&links[0]), None);
        assert_eq!(options.exclusion(&links[1]), Some(ExcludedReason::FilterLevel));

        let options = CheckerOptions { filter_level: FilterLevel::Metadata, ..Default::default() };
        assert_eq!(options.exclusion(&links[1]), None);
    }

    #[test]
    fn test_keyword_and_origin_exclusion() {
        let links = scrape_html(
            r##"<a href="https://other.org/x">x</a><a href="/private/y">y</a><a href="#top">z</a>"##,
            Some(&page()),
        );

        let options = CheckerOptions { excluded_keywords: vec!["private".into()], ..Default::default() };
        assert_eq!(options.exclusion(&links[1]), Some(ExcludedReason::Keyword));

        let options = CheckerOptions { exclude_external_links: true, ..Default::default() };
        assert_eq!(options.exclusion(&links[0]), Some(ExcludedReason::External));
        assert_eq!(options.exclusion(&links[1]), None);

        let options = CheckerOptions {
            exclude_internal_links: true,
            exclude_links_to_same_page: false,
            ..Default::default()
        };
        assert_eq!(options.exclusion(&links[1]), Some(ExcludedReason::Internal));

        let options = CheckerOptions::default();
        assert_eq!(options.exclusion(&links[2]), Some(ExcludedReason::SamePage));
    }
}
