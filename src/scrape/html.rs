// src/scrape/html.rs
// =============================================================================
// This module extracts link descriptors from HTML documents.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Is built on html5ever, so broken markup is repaired the way a browser
//   would repair it (missing <html>/<body>, badly nested tags, ...)
// - Drops repeated attributes on one element, keeping the first
//
// For every element in document order we look its attributes up in the tag
// registry (tags.rs). Each matching attribute becomes one Link, with the
// element's selector, text and opening tag attached.
//
// The first <base href> anywhere in the document sets the base URL for the
// WHOLE document, including links that appear before it.
// =============================================================================

use crate::error::ScrapeError;
use crate::link::{Link, LinkHtml, LinkStatus, LinkUrl};
use crate::scrape::{selector, tags};
use futures::{Stream, StreamExt};
use scraper::{ElementRef, Html};
use std::collections::BTreeMap;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};
use url::Url;

// Extracts all links from an HTML string
//
// Parameters:
//   html: the HTML content to parse
//   page_url: the URL the document was loaded from, if known
//
// Returns: one Link per (element, link attribute) pair, in document order.
// Without a page URL, relative links (and relative <base> hrefs) stay
// unresolved.
pub fn scrape_html(html: &str, page_url: Option<&Url>) -> Vec<Link> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let mut context = ScrapeContext::new(page_url, find_base(root));

    for node in root.descendants() {
        if let Some(element) = ElementRef::wrap(node) {
            context.visit(element);
        }
    }

    log::debug!("scraped {} link(s)", context.links.len());
    context.links
}

/// Scrapes a document delivered through an async reader (a file, a socket).
pub async fn scrape_reader<R>(mut reader: R, page_url: Option<&Url>) -> Result<Vec<Link>, ScrapeError>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer).await?;
    Ok(scrape_html(&String::from_utf8_lossy(&buffer), page_url))
}

/// Scrapes a document delivered as a stream of byte chunks, such as
/// `reqwest::Response::bytes_stream()`.
pub async fn scrape_stream<S, B, E>(mut stream: S, page_url: Option<&Url>) -> Result<Vec<Link>, ScrapeError>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let mut buffer = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        buffer.extend_from_slice(chunk.as_ref());
    }
    Ok(scrape_html(&String::from_utf8_lossy(&buffer), page_url))
}

// Finds the href of the first <base> element, wherever it is
fn find_base(root: ElementRef<'_>) -> Option<String> {
    root.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "base")
        .find_map(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
}

// Everything that lives for exactly one scrape
struct ScrapeContext<'a> {
    page_url: Option<&'a Url>,
    base_href: Option<String>,
    base_url: Option<Url>,
    links: Vec<Link>,
}

impl<'a> ScrapeContext<'a> {
    fn new(page_url: Option<&'a Url>, base_href: Option<String>) -> Self {
        // A relative <base> needs the page URL; if it cannot be resolved
        // the page URL is used on its own
        let base_url = base_href.as_deref().and_then(|href| match page_url {
            Some(page) => page.join(href).ok(),
            None => Url::parse(href).ok(),
        });

        ScrapeContext {
            page_url,
            base_href,
            base_url,
            links: Vec::new(),
        }
    }

    fn visit(&mut self, element: ElementRef<'_>) {
        let tag_name = element.value().name();

        let mut attrs = BTreeMap::new();
        let mut tag = format!("<{}", tag_name);
        let mut link_attrs = Vec::new();

        for (name, value) in element.value().attrs() {
            if attrs.contains_key(name) {
                continue;
            }
            attrs.insert(name.to_string(), value.to_string());
            tag.push_str(&format!(" {}=\"{}\"", name, value.replace('"', "&quot;")));

            if tags::is_link_attribute(tag_name, name) {
                link_attrs.push((name, value));
            }
        }
        tag.push('>');

        if link_attrs.is_empty() {
            return;
        }

        let selector = selector::synthesize(element);
        let text = if tags::is_void_element(tag_name) {
            None
        } else {
            Some(element.text().collect::<String>())
        };

        for (attr_name, value) in link_attrs {
            let original = value.trim().to_string();
            let resolved = self.resolve(&original);
            let internal = self.is_internal(resolved.as_ref());
            let same_page = self.is_same_page(resolved.as_ref(), internal);

            self.links.push(Link {
                url: LinkUrl {
                    original,
                    resolved,
                    redirected: None,
                },
                html: Some(LinkHtml {
                    tag: tag.clone(),
                    tag_name: tag_name.to_string(),
                    attr_name: attr_name.to_string(),
                    attrs: attrs.clone(),
                    selector: selector.clone(),
                    text: text.clone(),
                    index: self.links.len(),
                    base: self.base_href.clone(),
                }),
                internal,
                same_page,
                http_status: None,
                status: LinkStatus::Unchecked,
            });
        }
    }

    fn resolve(&self, original: &str) -> Option<Url> {
        match self.base_url.as_ref().or(self.page_url) {
            Some(base) => base.join(original).ok(),
            None => Url::parse(original).ok(),
        }
    }

    fn is_internal(&self, resolved: Option<&Url>) -> Option<bool> {
        let page = self.page_url?;
        let resolved = resolved?;
        Some(resolved.origin() == page.origin())
    }

    fn is_same_page(&self, resolved: Option<&Url>, internal: Option<bool>) -> Option<bool> {
        let page = self.page_url?;
        let resolved = resolved?;
        if internal != Some(true) {
            return Some(false);
        }
        Some(without_fragment(resolved) == without_fragment(page))
    }
}

fn without_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why rebuild the opening tag instead of slicing the source?
//    - html5ever does not keep source offsets
//    - Rebuilding from the parsed attributes gives the same text for
//      well-formed tags and drops repeated attributes, matching `attrs`
//
// 2. Why buffer streamed input?
//    - The whole tree is needed anyway: the first <base> applies to links
//      found before it, and selectors need final sibling positions
// -----------------------------------------------------------------------------
