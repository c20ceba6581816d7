// src/checker/http.rs
// =============================================================================
// This module checks if URLs are alive by making HTTP requests, and fetches
// the pages whose links we scrape.
//
// Key functionality:
// - Makes HTTP HEAD requests (lightweight, no body download)
// - Falls back to GET when the server rejects HEAD (405, 501)
// - Sorts every failure into one BrokenReason (status, connection, timeout)
// - Never returns an error: a failed check is a result like any other
// =============================================================================

use crate::config::{CheckerOptions, RequestMethod};
use crate::error::PageError;
use crate::link::{BrokenReason, CheckOutcome, LinkStatus};
use reqwest::{Client, Response, StatusCode};
use url::Url;

// Builds the HTTP client shared by every request of one checker
//
// Client is cheap to clone (it is reference counted internally), so the
// page pool and the link pool share the same connection pool.
pub fn build_client(options: &CheckerOptions) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(options.timeout())
        .redirect(reqwest::redirect::Policy::limited(5))
        .user_agent(options.user_agent.clone())
        .build()
}

// Checks a single URL
//
// Parameters:
//   client: reqwest HTTP client
//   url: the absolute URL to check
//   method: HEAD (with GET fallback) or GET
//
// Returns: the outcome to store in the cache and copy onto the link
pub async fn check_url(client: &Client, url: &Url, method: RequestMethod) -> CheckOutcome {
    let first = match method {
        RequestMethod::Head => client.head(url.clone()).send().await,
        RequestMethod::Get => client.get(url.clone()).send().await,
    };

    let result = match first {
        Ok(response)
            if method == RequestMethod::Head
                && matches!(
                    response.status(),
                    StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
                ) =>
        {
            log::debug!("HEAD rejected by {}, retrying with GET", url);
            client.get(url.clone()).send().await
        }
        other => other,
    };

    match result {
        Ok(response) => analyze_response(url, &response),
        Err(e) => CheckOutcome::broken(categorize_error(&e)),
    }
}

// Analyzes an HTTP response to determine link status
//
// Redirects have already been followed by reqwest, so the status we see is
// the final one:
// - 200-299: alive
// - anything else: broken with the status code
fn analyze_response(url: &Url, response: &Response) -> CheckOutcome {
    let status_code = response.status();

    let redirected = if response.url() != url {
        Some(response.url().clone())
    } else {
        None
    };

    let status = if status_code.is_success() {
        LinkStatus::Alive
    } else {
        LinkStatus::Broken(BrokenReason::HttpStatus(status_code.as_u16()))
    };

    CheckOutcome {
        status,
        http_status: Some(status_code.as_u16()),
        redirected,
    }
}

// Categorizes different error types from reqwest
//
// Timeouts get their own reason; DNS failures, refused connections, TLS
// problems and redirect loops all mean "could not reach it" and share
// CONNECTION.
fn categorize_error(error: &reqwest::Error) -> BrokenReason {
    if error.is_timeout() {
        BrokenReason::Timeout
    } else {
        log::debug!("request failed: {}", error);
        BrokenReason::Connection
    }
}

// Fetches a page that is about to be scraped
//
// Unlike check_url this fails loudly: the caller reports the error on the
// page event and skips scraping.
pub async fn fetch_page(client: &Client, url: &Url) -> Result<Response, PageError> {
    let response = client.get(url.clone()).send().await.map_err(|e| {
        if e.is_timeout() {
            PageError::Timeout
        } else {
            PageError::Connection(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(PageError::HttpStatus(response.status().as_u16()));
    }

    // A missing content type is given the benefit of the doubt
    if let Some(content_type) = response.headers().get(reqwest::header::CONTENT_TYPE) {
        let content_type = content_type.to_str().unwrap_or_default();
        if !content_type.contains("html") {
            return Err(PageError::NotHtml(content_type.to_string()));
        }
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> Client {
        build_client(&CheckerOptions { timeout_secs: 2, ..Default::default() }).unwrap()
    }

    fn url(server: &MockServer, route: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), route)).unwrap()
    }

    #[tokio::test]
    async fn test_alive_with_head() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = check_url(&client(), &url(&server, "/ok"), RequestMethod::Head).await;
        assert_eq!(outcome.status, LinkStatus::Alive);
        assert_eq!(outcome.http_status, Some(200));
        assert_eq!(outcome.redirected, None);
    }

    #[tokio::test]
    async fn test_missing_page_is_http_status() {
        let server = MockServer::start().await;
        let outcome = check_url(&client(), &url(&server, "/missing"), RequestMethod::Head).await;
        assert_eq!(outcome.status, LinkStatus::Broken(BrokenReason::HttpStatus(404)));
    }

    #[tokio::test]
    async fn test_falls_back_to_get() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(405))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = check_url(&client(), &url(&server, "/no-head"), RequestMethod::Head).await;
        assert_eq!(outcome.status, LinkStatus::Alive);
    }

    #[tokio::test]
    async fn test_redirect_is_recorded() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let outcome = check_url(&client(), &url(&server, "/old"), RequestMethod::Head).await;
        assert_eq!(outcome.status, LinkStatus::Alive);
        assert_eq!(outcome.redirected, Some(url(&server, "/new")));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let client = build_client(&CheckerOptions { timeout_secs: 1, ..Default::default() }).unwrap();
        let outcome = check_url(&client, &url(&server, "/slow"), RequestMethod::Head).await;
        assert_eq!(outcome.status, LinkStatus::Broken(BrokenReason::Timeout));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Port 9 (discard) is closed on any test machine
        let target = Url::parse("http://127.0.0.1:9/").unwrap();
        let outcome = check_url(&client(), &target, RequestMethod::Get).await;
        assert_eq!(outcome.status, LinkStatus::Broken(BrokenReason::Connection));
        assert_eq!(outcome.http_status, None);
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_non_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data.json"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
            .mount(&server)
            .await;

        let result = fetch_page(&client(), &url(&server, "/data.json")).await;
        assert!(matches!(result, Err(PageError::NotHtml(_))));

        let result = fetch_page(&client(), &url(&server, "/missing.html")).await;
        assert!(matches!(result, Err(PageError::HttpStatus(404))));
    }
}
