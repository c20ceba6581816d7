//! Finds the links in HTML documents and checks whether they still work.
//!
//! The crate has two halves:
//!
//! - [`scrape`] turns an HTML document into an ordered list of [`Link`]s,
//!   each with the element's selector, tag, attributes and text.
//! - [`checker`] verifies links over HTTP. [`UrlChecker`] checks individual
//!   links; [`HtmlUrlChecker`] fetches whole pages and checks every link on
//!   them. Both report through an event channel and share one response
//!   cache per instance.
//!
//! ```no_run
//! use link_auditor::{CheckerOptions, HtmlEvent, HtmlUrlChecker};
//!
//! # async fn run() -> Result<(), link_auditor::CheckerError> {
//! let (checker, mut events) = HtmlUrlChecker::new(CheckerOptions::default())?;
//! // End is sent each time the queue drains; pause while adding a batch
//! checker.pause();
//! checker.enqueue("https://example.com/", ())?;
//! checker.enqueue("https://example.com/about", ())?;
//! checker.resume();
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         HtmlEvent::Link { link, .. } if link.is_broken() == Some(true) => {
//!             println!("broken: {}", link.url.original);
//!         }
//!         HtmlEvent::End => break,
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod checker;
pub mod config;
pub mod error;
pub mod link;
mod queue;
pub mod scrape;

pub use checker::{HtmlEvent, HtmlUrlChecker, UrlCache, UrlChecker, UrlEvent};
pub use config::{CheckerOptions, FilterLevel, RequestMethod};
pub use error::{CheckerError, PageError, ScrapeError};
pub use link::{BrokenReason, ExcludedReason, Link, LinkStatus};
pub use queue::QueueId;
