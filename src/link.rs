// src/link.rs
// =============================================================================
// The link descriptor: one discovered URL reference plus the outcome of
// checking it.
//
// A Link is created by the scraper (or by UrlChecker::enqueue_url), stays
// `Unchecked` while it waits in a queue, and is finalized exactly once by
// the URL checker.
// =============================================================================

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// Why a checked link is considered broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BrokenReason {
    /// A response arrived with a non-success status code
    HttpStatus(u16),
    /// DNS, connect, TLS or redirect failure
    Connection,
    /// No response within the configured timeout
    Timeout,
    /// Malformed URL or unsupported scheme, no request was made
    InvalidUrl,
}

impl fmt::Display for BrokenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokenReason::HttpStatus(code) => write!(f, "HTTP_STATUS ({})", code),
            BrokenReason::Connection => f.write_str("CONNECTION"),
            BrokenReason::Timeout => f.write_str("TIMEOUT"),
            BrokenReason::InvalidUrl => f.write_str("INVALID_URL"),
        }
    }
}

/// Why a link was intentionally skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcludedReason {
    Scheme,
    FilterLevel,
    Keyword,
    External,
    Internal,
    SamePage,
}

impl fmt::Display for ExcludedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExcludedReason::Scheme => "scheme",
            ExcludedReason::FilterLevel => "filter level",
            ExcludedReason::Keyword => "keyword",
            ExcludedReason::External => "external",
            ExcludedReason::Internal => "internal",
            ExcludedReason::SamePage => "same page",
        };
        f.write_str(s)
    }
}

/// Check state of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum LinkStatus {
    #[default]
    Unchecked,
    Alive,
    Broken(BrokenReason),
    Excluded(ExcludedReason),
}

impl LinkStatus {
    /// Tri-state view: `None` until the link has been checked.
    /// Excluded links are never broken.
    pub fn is_broken(&self) -> Option<bool> {
        match self {
            LinkStatus::Unchecked => None,
            LinkStatus::Broken(_) => Some(true),
            LinkStatus::Alive | LinkStatus::Excluded(_) => Some(false),
        }
    }

    pub fn broken_reason(&self) -> Option<BrokenReason> {
        match self {
            LinkStatus::Broken(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// The terminal result of one network check. This is what the cache stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub status: LinkStatus,
    pub http_status: Option<u16>,
    pub redirected: Option<Url>,
}

impl CheckOutcome {
    pub fn broken(reason: BrokenReason) -> Self {
        CheckOutcome {
            status: LinkStatus::Broken(reason),
            http_status: match reason {
                BrokenReason::HttpStatus(code) => Some(code),
                _ => None,
            },
            redirected: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkUrl {
    /// The attribute value as written, trimmed of surrounding whitespace
    pub original: String,
    /// Absolute URL, `None` when it could not be resolved
    pub resolved: Option<Url>,
    /// Final URL after redirects, only set when it differs from `resolved`
    pub redirected: Option<Url>,
}

/// Where in the document a link was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkHtml {
    /// Opening tag rebuilt from the element's (de-duplicated) attributes
    pub tag: String,
    pub tag_name: String,
    pub attr_name: String,
    pub attrs: BTreeMap<String, String>,
    pub selector: String,
    /// Text content, `None` for void elements
    pub text: Option<String>,
    /// Position among all links of the same scrape, starting at 0
    pub index: usize,
    /// href of the first <base> element, if any
    pub base: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub url: LinkUrl,
    /// `None` for links that did not come from an HTML document
    pub html: Option<LinkHtml>,
    /// Same origin as the page the link was found on
    pub internal: Option<bool>,
    /// Points back at the page itself (fragment ignored)
    pub same_page: Option<bool>,
    pub http_status: Option<u16>,
    #[serde(flatten)]
    pub status: LinkStatus,
}

impl Link {
    /// Builds a descriptor for a bare URL with no HTML provenance.
    pub fn from_url(original: &str, base: Option<&Url>) -> Self {
        let original = original.trim();
        let resolved = match base {
            Some(base) => base.join(original).ok(),
            None => Url::parse(original).ok(),
        };

        Link {
            url: LinkUrl {
                original: original.to_string(),
                resolved,
                redirected: None,
            },
            html: None,
            internal: None,
            same_page: None,
            http_status: None,
            status: LinkStatus::Unchecked,
        }
    }

    pub fn is_broken(&self) -> Option<bool> {
        self.status.is_broken()
    }

    pub fn broken_reason(&self) -> Option<BrokenReason> {
        self.status.broken_reason()
    }

    /// Copies a check outcome onto the link.
    pub fn apply(&mut self, outcome: &CheckOutcome) {
        self.status = outcome.status;
        self.http_status = outcome.http_status;
        self.url.redirected = outcome.redirected.clone();
    }
}
