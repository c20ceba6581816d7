// src/scrape/mod.rs
// =============================================================================
// Link extraction from HTML.
//
// Submodules:
// - html: walks the parsed document and builds Link descriptors
// - selector: computes the positional CSS selector of an element
// - tags: the static table of URL-carrying attributes
// =============================================================================

mod html;
mod selector;
pub mod tags;

pub use html::{scrape_html, scrape_reader, scrape_stream};
pub use selector::synthesize as synthesize_selector;
