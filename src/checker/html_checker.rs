// src/checker/html_checker.rs
// =============================================================================
// Checks every link found on a set of pages.
//
// How it works:
// 1. enqueue() puts a page URL into the page queue
// 2. an active page is fetched; on failure a Page event with the error is
//    sent and the page is done
// 3. on success an Html event is sent, the body is scraped, and every link
//    goes into an internal UrlChecker together with a channel back to the
//    page
// 4. the page forwards each finished link as a Link event; once the last
//    one is in, it sends its Page event
// 5. when no pages are queued or active, End is sent
//
// Because a page only sends its Page event after draining its own link
// channel, a page's Link events always come before its Page event.
// =============================================================================

use crate::checker::cache::UrlCache;
use crate::checker::http;
use crate::checker::url_checker::{UrlChecker, UrlEvent};
use crate::config::CheckerOptions;
use crate::error::{CheckerError, PageError};
use crate::link::{BrokenReason, Link, LinkStatus};
use crate::queue::{QueueId, WorkQueue, Worker};
use crate::scrape::scrape_stream;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

/// Events produced by an [`HtmlUrlChecker`].
#[derive(Debug)]
pub enum HtmlEvent<T> {
    /// The page was fetched and is about to be scraped
    Html { id: QueueId, page_url: Url, data: T },
    /// One link of page `page_id` finished checking
    Link { page_id: QueueId, link: Link, data: T },
    /// A page is done: every link has been reported, or the fetch failed
    Page {
        id: QueueId,
        page_url: Url,
        error: Option<PageError>,
        data: T,
    },
    /// No pages are queued or active any more
    End,
}

struct PageJob<T> {
    page_url: Url,
    data: T,
}

// Attached to every link so its result finds its way back to the page
struct LinkRoute {
    results: mpsc::UnboundedSender<Link>,
}

struct PageWorker<T> {
    client: Client,
    links: Arc<UrlChecker<LinkRoute>>,
    events: mpsc::UnboundedSender<HtmlEvent<T>>,
}

pub struct HtmlUrlChecker<T> {
    pages: WorkQueue<PageJob<T>>,
    links: Arc<UrlChecker<LinkRoute>>,
}

impl<T: Clone + Send + Sync + 'static> HtmlUrlChecker<T> {
    /// Creates a checker and the receiving end of its event channel.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(options: CheckerOptions) -> Result<(Self, mpsc::UnboundedReceiver<HtmlEvent<T>>), CheckerError> {
        let client = http::build_client(&options)?;
        let options = Arc::new(options);

        let (links, link_events) = UrlChecker::<LinkRoute>::with_client(Arc::clone(&options), client.clone(), UrlCache::new());
        let links = Arc::new(links);
        tokio::spawn(route_links(link_events));

        let (events, receiver) = mpsc::unbounded_channel();
        let worker = Arc::new(PageWorker {
            client,
            links: Arc::clone(&links),
            events,
        });

        let checker = HtmlUrlChecker {
            pages: WorkQueue::new(options.max_pages, worker),
            links,
        };
        Ok((checker, receiver))
    }

    /// Queues a page. Fails if `page_url` is not an absolute URL.
    pub fn enqueue(&self, page_url: &str, data: T) -> Result<QueueId, CheckerError> {
        let page_url = Url::parse(page_url.trim())
            .map_err(|e| CheckerError::InvalidInput(format!("invalid page URL '{}': {}", page_url, e)))?;
        Ok(self.pages.enqueue(PageJob { page_url, data }))
    }

    /// Removes a page that has not been fetched yet.
    pub fn dequeue(&self, id: QueueId) -> Result<bool, CheckerError> {
        self.pages.dequeue(id).map(|()| true)
    }

    /// Stops starting new pages and new link checks.
    pub fn pause(&self) {
        self.pages.pause();
        self.links.pause();
    }

    pub fn resume(&self) {
        self.links.resume();
        self.pages.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.pages.is_paused()
    }

    /// Queued plus active pages.
    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn num_active_links(&self) -> usize {
        self.links.num_active_links()
    }

    pub fn num_queued_links(&self) -> usize {
        self.links.num_queued_links()
    }

    pub fn cache(&self) -> &UrlCache {
        self.links.cache()
    }
}

async fn route_links(mut events: mpsc::UnboundedReceiver<UrlEvent<LinkRoute>>) {
    while let Some(event) = events.recv().await {
        if let UrlEvent::Link { link, data, .. } = event {
            let _ = data.results.send(link);
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Worker<PageJob<T>> for PageWorker<T> {
    fn process(self: Arc<Self>, id: QueueId, job: PageJob<T>) -> BoxFuture<'static, ()> {
        async move {
            let PageJob { page_url, data } = job;

            let error = self.check_page(id, &page_url, &data).await.err();
            match &error {
                Some(e) => log::warn!("page {} failed: {}", page_url, e),
                None => log::info!("page {} done", page_url),
            }

            let _ = self.events.send(HtmlEvent::Page {
                id,
                page_url,
                error,
                data,
            });
        }
        .boxed()
    }

    fn drained(&self) {
        let _ = self.events.send(HtmlEvent::End);
    }
}

impl<T: Clone + Send + Sync + 'static> PageWorker<T> {
    async fn check_page(&self, id: QueueId, page_url: &Url, data: &T) -> Result<(), PageError> {
        let response = http::fetch_page(&self.client, page_url).await?;

        // Relative links resolve against where the page actually ended up
        let final_url = response.url().clone();

        let _ = self.events.send(HtmlEvent::Html {
            id,
            page_url: page_url.clone(),
            data: data.clone(),
        });

        let links = scrape_stream(Box::pin(response.bytes_stream()), Some(&final_url)).await?;
        log::debug!("{} link(s) found on {}", links.len(), page_url);

        let (results, mut finished) = mpsc::unbounded_channel();

        for mut link in links {
            if link.url.resolved.is_none() {
                link.status = LinkStatus::Broken(BrokenReason::InvalidUrl);
                self.send_link(id, link, data);
                continue;
            }

            let route = LinkRoute {
                results: results.clone(),
            };
            if let Err(e) = self.links.enqueue(link, route) {
                log::warn!("could not queue link from {}: {}", page_url, e);
            }
        }

        // The channel closes once every queued link has reported back
        drop(results);
        while let Some(link) = finished.recv().await {
            self.send_link(id, link, data);
        }

        Ok(())
    }

    fn send_link(&self, page_id: QueueId, link: Link, data: &T) {
        let _ = self.events.send(HtmlEvent::Link {
            page_id,
            link,
            data: data.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_enqueue_rejects_relative_url() {
        let (checker, _events) = HtmlUrlChecker::<()>::new(CheckerOptions::default()).unwrap();
        assert!(matches!(checker.enqueue("/path/", ()), Err(CheckerError::InvalidInput(_))));
        assert_eq!(checker.num_pages(), 0);
    }

    #[tokio::test]
    async fn test_dequeue_while_paused() {
        let (checker, _events) = HtmlUrlChecker::new(CheckerOptions::default()).unwrap();
        checker.pause();

        let id = checker.enqueue("http://127.0.0.1:9/", "data").unwrap();
        assert_eq!(checker.num_pages(), 1);
        assert!(checker.dequeue(id + 1).is_err());
        assert_eq!(checker.num_pages(), 1);
        assert!(checker.dequeue(id).unwrap());
        assert_eq!(checker.num_pages(), 0);
        assert_eq!(checker.num_active_links(), 0);
    }
}
