// src/error.rs
// =============================================================================
// Error types used across the library.
//
// Only two kinds of failure ever reach a caller directly:
// - bad input at an enqueue/dequeue call site (CheckerError)
// - an unreadable input stream handed to the scraper (ScrapeError)
//
// Everything that goes wrong while checking a link or fetching a page is
// turned into data instead (LinkStatus on the link, PageError on the page
// event) so one bad URL never stops the rest of the queue.
// =============================================================================

use crate::queue::QueueId;
use thiserror::Error;

/// Errors returned synchronously by the checkers' queue operations.
#[derive(Error, Debug)]
pub enum CheckerError {
    /// The URL handed to `enqueue` was missing or could not be parsed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// `dequeue` was called with an id that is not waiting in the queue.
    #[error("no queued item with id {0}")]
    NotFound(QueueId),

    /// The HTTP client could not be built.
    #[error("HTTP client initialization error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Errors from the HTML scraper.
///
/// html5ever recovers from any markup, so the only way a scrape fails is
/// when the input itself cannot be read.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("could not read HTML input: {0}")]
    ParseFailure(#[from] std::io::Error),
}

/// Why a page could not be scraped. Carried by the `page` event.
#[derive(Error, Debug)]
pub enum PageError {
    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("expected text/html but got {0}")]
    NotHtml(String),

    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}
