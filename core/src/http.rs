//! HTTP request and response types exchanged with a `Transport`.
//!
//! # Design
//! These types describe HTTP traffic as plain data. The `Requestor` builds
//! `HttpRequest` values and interprets `HttpResponse` values; the injected
//! transport is the only piece that touches the network. Stub transports in
//! tests construct `HttpResponse` directly.
//!
//! Headers use `http::HeaderMap`, which is case-insensitive, keeps insertion
//! order, and holds multiple values per name.

use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, StatusCode};

use crate::transport::TransportError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

/// An HTTP request described as plain data.
///
/// `path` is already normalized to the `/api/v4` root by the time a transport
/// sees it.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl HttpRequest {
    /// A request with no headers and no body.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Attach a JSON body and its `Content-Type`. An empty string is still a
    /// body: the header is set and the transport sends zero bytes.
    pub fn with_json_body(mut self, body: String) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(body);
        self
    }
}

/// An HTTP response described as plain data.
///
/// `body` is a `Result` because the status line and headers can arrive while
/// reading the body still fails. The requestor decides what a read failure
/// means depending on whether the status was a success.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Result<String, TransportError>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Ok(body.into()),
        }
    }

    /// A response whose body could not be read.
    pub fn unreadable(status: StatusCode, error: TransportError) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Err(error),
        }
    }

    /// Append a header, keeping any existing values under the same name.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }
}
