//! Transport-level request dispatcher for the GitLab v4 REST API.
//!
//! # Overview
//! `Requestor` turns "verb + path + optional payload" into a normalized
//! `/api/v4` request, sends it through an injected `Transport`, and maps the
//! response to either a decoded value or an `ApiError`.
//!
//! # Design
//! - The transport is a trait object handed in at construction, so tests
//!   swap in a stub and production shares one pooled `ReqwestTransport`.
//! - Non-2xx responses become `ApiError::GitLab` with the raw body; bodies
//!   that fail to decode become `ApiError::Deserialization`. The two never
//!   overlap.
//! - Resource-specific endpoints, authentication, retries and pagination live
//!   above this crate.

pub mod body;
pub mod config;
pub mod error;
pub mod http;
pub mod path;
pub mod requestor;
pub mod transport;

pub use body::{encode_body, NullHandling};
pub use config::{ConfigError, TransportConfig};
pub use error::{ApiError, GitLabError};
pub use crate::http::{HttpMethod, HttpRequest, HttpResponse};
pub use path::{normalize_path, API_ROOT};
pub use requestor::Requestor;
pub use transport::{ReqwestTransport, Transport, TransportError};
