// src/checker/mod.rs
// =============================================================================
// This module contains all link checking logic.
//
// Submodules:
// - http: Makes HTTP requests and sorts their outcome into alive/broken
// - cache: Remembers outcomes so each URL is requested at most once
// - url_checker: Queue of links checked with bounded concurrency
// - html_checker: Queue of pages; fetches, scrapes and checks their links
// =============================================================================

mod cache;
mod html_checker;
mod http;
mod url_checker;

pub use cache::UrlCache;
pub use html_checker::{HtmlEvent, HtmlUrlChecker};
pub use url_checker::{UrlChecker, UrlEvent};
