use std::time::Duration;

use log::warn;
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Token;
use crate::error::{CircleTraceError, Result};

use super::types::Paged;

const REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// HTTP client for a CircleCI-compatible server.
///
/// Endpoints are given relative to the configured host (e.g.
/// `api/v2/pipeline/{id}/workflow`); the token rides along as basic auth on
/// every request.
pub struct CircleClient {
    client: reqwest::Client,
    base_url: Url,
    token: Token,
}

impl CircleClient {
    /// Creates a client for the given host.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not a valid URL or the HTTP client
    /// cannot be constructed.
    pub fn new(host: &str, token: Token) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("circletrace/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| CircleTraceError::Config(format!("Failed to create HTTP client: {e}")))?;

        let base_url = Url::parse(host)
            .map_err(|e| CircleTraceError::Config(format!("Invalid host URL {host}: {e}")))?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    async fn get_response(&self, endpoint: &str) -> Result<reqwest::Response> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| CircleTraceError::Config(format!("Invalid endpoint {endpoint}: {e}")))?;

        let response = self
            .client
            .get(url)
            .basic_auth(self.token.as_str(), Some(""))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CircleTraceError::Api {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }

        Ok(response)
    }

    /// GET returning a decoded JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        Ok(self.get_response(endpoint).await?.json().await?)
    }

    /// GET returning the raw body text.
    pub async fn get_text(&self, endpoint: &str) -> Result<String> {
        Ok(self.get_response(endpoint).await?.text().await?)
    }

    /// True when the server answers the identity endpoint with the configured
    /// credentials.
    pub async fn verify_connection(&self) -> bool {
        self.get_response("api/v2/me").await.is_ok()
    }

    /// Cursor-pagination driver shared by every list endpoint.
    ///
    /// Repeatedly GETs `endpoint`, appending `<cursor_param>=<cursor>` once a
    /// non-empty cursor has been returned, until the cursor comes back empty
    /// or `max_pages` is reached. Returns the concatenation of all pages'
    /// items in response order.
    ///
    /// Transport errors, non-success statuses and decode failures end the loop
    /// and return whatever was accumulated; a failed first page yields an
    /// empty list. No retry is performed.
    pub async fn fetch_paged<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        cursor_param: &str,
        max_pages: Option<usize>,
    ) -> Vec<T> {
        let mut items = Vec::new();
        let mut cursor = String::new();
        let mut pages = 0usize;

        loop {
            if max_pages.is_some_and(|cap| pages >= cap) {
                break;
            }

            let url = if cursor.is_empty() {
                endpoint.to_string()
            } else {
                let separator = if endpoint.contains('?') { '&' } else { '?' };
                format!("{endpoint}{separator}{cursor_param}={cursor}")
            };

            let page: Paged<T> = match self.get_json(&url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Stopping pagination for {endpoint}: {e}");
                    break;
                }
            };

            pages += 1;
            items.extend(page.items);

            match page.next_page_token {
                Some(token) if !token.is_empty() => cursor = token,
                _ => break,
            }
        }

        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Widget {
        name: String,
    }

    fn test_client(server: &mockito::ServerGuard) -> CircleClient {
        CircleClient::new(&server.url(), Token::from("test-token")).unwrap()
    }

    #[tokio::test]
    async fn test_pagination_concatenates_pages_until_empty_token() {
        let mut server = mockito::Server::new_async().await;

        let first = server
            .mock("GET", "/api/v2/widget?mine=false")
            .with_body(r#"{"items": [{"name": "a"}, {"name": "b"}], "next_page_token": "cursor-1"}"#)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/api/v2/widget?mine=false&page-token=cursor-1")
            .with_body(r#"{"items": [{"name": "c"}], "next_page_token": ""}"#)
            .create_async()
            .await;

        let items: Vec<Widget> = test_client(&server)
            .fetch_paged("api/v2/widget?mine=false", "page-token", None)
            .await;

        let names: Vec<_> = items.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_page_cap_bounds_infinite_cursor() {
        let mut server = mockito::Server::new_async().await;

        let first = server
            .mock("GET", "/api/v2/widget?mine=false")
            .with_body(r#"{"items": [{"name": "a"}], "next_page_token": "again"}"#)
            .create_async()
            .await;
        // the cursor never goes empty, so only the cap ends the loop
        let looping = server
            .mock("GET", "/api/v2/widget?mine=false&page-token=again")
            .with_body(r#"{"items": [{"name": "b"}], "next_page_token": "again"}"#)
            .expect(2)
            .create_async()
            .await;

        let items: Vec<Widget> = test_client(&server)
            .fetch_paged("api/v2/widget?mine=false", "page-token", Some(3))
            .await;

        assert_eq!(items.len(), 3);
        first.assert_async().await;
        looping.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_page_returns_items_accumulated_so_far() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/api/v2/widget?mine=false")
            .with_body(r#"{"items": [{"name": "a"}, {"name": "b"}], "next_page_token": "cursor-1"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/v2/widget?mine=false&page-token=cursor-1")
            .with_status(500)
            .create_async()
            .await;

        let items: Vec<Widget> = test_client(&server)
            .fetch_paged("api/v2/widget?mine=false", "page-token", None)
            .await;

        let names: Vec<_> = items.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[tokio::test]
    async fn test_failed_first_page_yields_empty_list() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/api/v2/widget?mine=false")
            .with_status(404)
            .create_async()
            .await;

        let items: Vec<Widget> = test_client(&server)
            .fetch_paged("api/v2/widget?mine=false", "page-token", None)
            .await;

        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_decode_failure_ends_pagination_without_error() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/api/v2/widget?mine=false")
            .with_body(r#"{"items": [{"name": "a"}], "next_page_token": "cursor-1"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/v2/widget?mine=false&page-token=cursor-1")
            .with_body("not json at all")
            .create_async()
            .await;

        let items: Vec<Widget> = test_client(&server)
            .fetch_paged("api/v2/widget?mine=false", "page-token", None)
            .await;

        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_absent_token_field_ends_pagination() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/api/v2/widget?mine=false")
            .with_body(r#"{"items": [{"name": "a"}]}"#)
            .create_async()
            .await;

        let items: Vec<Widget> = test_client(&server)
            .fetch_paged("api/v2/widget?mine=false", "page-token", None)
            .await;

        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_verify_connection() {
        let mut server = mockito::Server::new_async().await;

        let me = server
            .mock("GET", "/api/v2/me")
            .with_body(r#"{"login": "someone"}"#)
            .create_async()
            .await;

        assert!(test_client(&server).verify_connection().await);
        me.assert_async().await;
    }

    #[tokio::test]
    async fn test_verify_connection_rejected_credentials() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/api/v2/me")
            .with_status(401)
            .create_async()
            .await;

        assert!(!test_client(&server).verify_connection().await);
    }

    #[tokio::test]
    async fn test_get_text_returns_raw_body() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/api/v1.1/project/gh/acme/demo/42/output/0/0?file=true")
            .with_body("Build-agent version 1.2.3\n")
            .create_async()
            .await;

        let text = test_client(&server)
            .get_text("api/v1.1/project/gh/acme/demo/42/output/0/0?file=true")
            .await
            .unwrap();
        assert_eq!(text, "Build-agent version 1.2.3\n");
    }
}
