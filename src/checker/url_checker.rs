// src/checker/url_checker.rs
// =============================================================================
// Checks queued links with a bounded number of requests in flight.
//
// Flow for every link:
// 1. enqueue() validates the resolved URL and hands the link to a WorkQueue
// 2. when a slot frees up, the worker decides whether the link is excluded
//    (filter level, keyword, origin, scheme)
// 3. otherwise the cache is asked; on a miss, http::check_url does the
//    request and the outcome is stored
// 4. the finished link is sent on the event channel with the caller's data
//
// Events come out in completion order. Once nothing is queued or active,
// UrlEvent::End is sent.
// =============================================================================

use crate::checker::cache::UrlCache;
use crate::checker::http;
use crate::config::CheckerOptions;
use crate::error::CheckerError;
use crate::link::{BrokenReason, CheckOutcome, ExcludedReason, Link, LinkStatus};
use crate::queue::{QueueId, WorkQueue, Worker};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

/// Events produced by a [`UrlChecker`].
#[derive(Debug)]
pub enum UrlEvent<T> {
    /// A link finished checking
    Link { id: QueueId, link: Link, data: T },
    /// Nothing is queued or active any more
    End,
}

struct LinkJob<T> {
    link: Link,
    data: T,
}

struct LinkWorker<T> {
    client: Client,
    cache: UrlCache,
    options: Arc<CheckerOptions>,
    events: mpsc::UnboundedSender<UrlEvent<T>>,
}

pub struct UrlChecker<T> {
    queue: WorkQueue<LinkJob<T>>,
    cache: UrlCache,
}

impl<T: Send + 'static> UrlChecker<T> {
    /// Creates a checker and the receiving end of its event channel.
    pub fn new(options: CheckerOptions) -> Result<(Self, mpsc::UnboundedReceiver<UrlEvent<T>>), CheckerError> {
        let client = http::build_client(&options)?;
        Ok(Self::with_client(Arc::new(options), client, UrlCache::new()))
    }

    pub(crate) fn with_client(
        options: Arc<CheckerOptions>,
        client: Client,
        cache: UrlCache,
    ) -> (Self, mpsc::UnboundedReceiver<UrlEvent<T>>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let limit = options.max_links;
        let worker = Arc::new(LinkWorker {
            client,
            cache: cache.clone(),
            options,
            events,
        });

        let checker = UrlChecker {
            queue: WorkQueue::new(limit, worker),
            cache,
        };
        (checker, receiver)
    }

    /// Queues a link for checking and returns its id without waiting.
    ///
    /// Fails when the link has no resolved URL. Must be called from within a
    /// tokio runtime.
    pub fn enqueue(&self, link: Link, data: T) -> Result<QueueId, CheckerError> {
        if link.url.resolved.is_none() {
            return Err(CheckerError::InvalidInput(format!(
                "could not resolve URL '{}'",
                link.url.original
            )));
        }
        Ok(self.queue.enqueue(LinkJob { link, data }))
    }

    /// Queues a bare URL, resolved against `base` when given.
    pub fn enqueue_url(&self, url: &str, base: Option<&Url>, data: T) -> Result<QueueId, CheckerError> {
        self.enqueue(Link::from_url(url, base), data)
    }

    /// Removes a link that has not started checking yet.
    pub fn dequeue(&self, id: QueueId) -> Result<bool, CheckerError> {
        self.queue.dequeue(id).map(|()| true)
    }

    pub fn pause(&self) {
        self.queue.pause();
    }

    pub fn resume(&self) {
        self.queue.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.queue.is_paused()
    }

    pub fn num_active_links(&self) -> usize {
        self.queue.num_active()
    }

    pub fn num_queued_links(&self) -> usize {
        self.queue.num_queued()
    }

    /// The cache shared by every check of this checker.
    pub fn cache(&self) -> &UrlCache {
        &self.cache
    }
}

impl<T: Send + 'static> Worker<LinkJob<T>> for LinkWorker<T> {
    fn process(self: Arc<Self>, id: QueueId, job: LinkJob<T>) -> BoxFuture<'static, ()> {
        async move {
            let LinkJob { mut link, data } = job;
            let outcome = self.check(&link).await;
            link.apply(&outcome);

            log::debug!("link {} {:?}: {:?}", id, link.url.original, link.status);
            // The receiver may be gone; the checker keeps working either way
            let _ = self.events.send(UrlEvent::Link { id, link, data });
        }
        .boxed()
    }

    fn drained(&self) {
        let _ = self.events.send(UrlEvent::End);
    }
}

impl<T> LinkWorker<T> {
    async fn check(&self, link: &Link) -> CheckOutcome {
        let excluded = |reason| CheckOutcome {
            status: LinkStatus::Excluded(reason),
            http_status: None,
            redirected: None,
        };

        if let Some(reason) = self.options.exclusion(link) {
            return excluded(reason);
        }

        let Some(url) = link.url.resolved.as_ref() else {
            return CheckOutcome::broken(BrokenReason::InvalidUrl);
        };

        if !self.options.accepts_scheme(url.scheme()) {
            return if self.options.exclude_unaccepted_schemes {
                excluded(ExcludedReason::Scheme)
            } else {
                CheckOutcome::broken(BrokenReason::InvalidUrl)
            };
        }

        let client = &self.client;
        let method = self.options.request_method;
        let delay = self.options.rate_limit();
        let request = move || async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            http::check_url(client, url, method).await
        };

        if self.options.cache_responses {
            self.cache.resolve(method, url, request).await
        } else {
            request().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_enqueue_rejects_unresolved_url() {
        let (checker, _events) = UrlChecker::<()>::new(CheckerOptions::default()).unwrap();
        let result = checker.enqueue_url("/relative/path", None, ());
        assert!(matches!(result, Err(CheckerError::InvalidInput(_))));
        assert_eq!(checker.num_queued_links(), 0);
    }

    #[tokio::test]
    async fn test_excluded_scheme_needs_no_network() {
        let (checker, mut events) = UrlChecker::new(CheckerOptions::default()).unwrap();
        checker.enqueue_url("mailto:someone@example.com", None, 7).unwrap();

        match events.recv().await {
            Some(UrlEvent::Link { link, data, .. }) => {
                assert_eq!(data, 7);
                assert_eq!(link.status, LinkStatus::Excluded(ExcludedReason::Scheme));
                assert_eq!(link.is_broken(), Some(false));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(matches!(events.recv().await, Some(UrlEvent::End)));
    }

    #[tokio::test]
    async fn test_unaccepted_scheme_can_be_broken() {
        let options = CheckerOptions { exclude_unaccepted_schemes: false, ..Default::default() };
        let (checker, mut events) = UrlChecker::new(options).unwrap();
        checker.enqueue_url("ftp://example.com/file", None, ()).unwrap();

        match events.recv().await {
            Some(UrlEvent::Link { link, .. }) => {
                assert_eq!(link.broken_reason(), Some(BrokenReason::InvalidUrl));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_paused_dequeue() {
        let (checker, _events) = UrlChecker::new(CheckerOptions::default()).unwrap();
        checker.pause();
        let id = checker.enqueue_url("https://example.com/", None, ()).unwrap();
        assert_eq!(checker.num_queued_links(), 1);
        assert!(checker.dequeue(id + 1).is_err());
        assert!(checker.dequeue(id).unwrap());
        assert_eq!(checker.num_queued_links(), 0);
        assert_eq!(checker.num_active_links(), 0);
    }
}
