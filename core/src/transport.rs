//! The injected HTTP transport.
//!
//! # Design
//! `Transport` is the single seam between the requestor and the network. The
//! requestor never owns connection state: it hands a fully built
//! `HttpRequest` to the transport and gets back an `HttpResponse`. Tests
//! substitute a recording stub; production code uses `ReqwestTransport`,
//! whose pooled `reqwest::Client` is safe to share across concurrent calls.
//!
//! Timeouts belong here, not in the requestor.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::config::TransportConfig;
use crate::http::{HttpRequest, HttpResponse};

/// Failure to obtain a response, or to read a response body.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("transport failure: {0}")]
    Other(String),
}

/// Sends one HTTP request and returns its response.
///
/// Any status code, including 4xx and 5xx, is a successful `send`. An `Err`
/// means no response was obtained at all.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

/// `Transport` backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    base_url: Url,
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: config.base_url.clone(),
            client: builder.build()?,
        })
    }

    /// Wrap an already configured client.
    pub fn with_client(base_url: Url, client: reqwest::Client) -> Self {
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append `path` to the base URL, keeping any sub-path the instance is
    /// mounted under (`https://host/gitlab` + `/api/v4/users`). The query of
    /// the result comes from `path` alone; a query or fragment on the base URL
    /// is dropped.
    fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        if self.base_url.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase.into());
        }

        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path, None),
        };

        let mut url = self.base_url.clone();
        let joined = format!("{}{path}", url.path().trim_end_matches('/'));
        url.set_path(&joined);
        url.set_query(query);
        url.set_fragment(None);
        Ok(url)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self.url_for(&request.path)?;

        let mut builder = self
            .client
            .request(request.method.into(), url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(TransportError::from);

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
