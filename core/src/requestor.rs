//! Uniform dispatch of GitLab v4 REST calls.
//!
//! # Design
//! `Requestor` holds nothing but a shared handle to the injected transport,
//! so it is cheap to clone and calls never interact with each other. Every
//! operation runs the same pipeline:
//!
//! 1. normalize the path under `/api/v4`,
//! 2. encode the payload (POST omits `null` members, PUT keeps them),
//! 3. send through the transport,
//! 4. turn any non-2xx status into `ApiError::GitLab` carrying the raw body,
//! 5. decode the success body into the caller's type.
//!
//! There is no retry, caching, pagination, or timeout logic here.

use std::sync::Arc;

use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::body::{encode_body, NullHandling};
use crate::config::TransportConfig;
use crate::error::{ApiError, GitLabError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::path::normalize_path;
use crate::transport::{ReqwestTransport, Transport};

/// Dispatches GitLab API calls through a shared `Transport`.
#[derive(Clone)]
pub struct Requestor {
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Requestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Requestor").finish_non_exhaustive()
    }
}

impl Requestor {
    /// Take ownership of `transport`.
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Share an existing transport handle with other components.
    pub fn from_shared(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Build a requestor over a `ReqwestTransport`.
    pub fn from_config(config: &TransportConfig) -> Result<Self, ApiError> {
        Ok(Self::new(ReqwestTransport::new(config)?))
    }

    /// GET `path` and decode the body as `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = HttpRequest::new(HttpMethod::Get, normalize_path(path));
        read_response(self.dispatch(request).await?)
    }

    /// Like [`Requestor::get`], also returning the response headers so callers
    /// can read pagination metadata such as `X-Total` or `Link`.
    pub async fn get_with_headers<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<(T, HeaderMap), ApiError> {
        let request = HttpRequest::new(HttpMethod::Get, normalize_path(path));
        let mut response = self.dispatch(request).await?;
        let headers = std::mem::take(&mut response.headers);
        Ok((read_response(response)?, headers))
    }

    /// POST `payload` with `null` members omitted. `None` sends an empty body.
    pub async fn post<T, P>(&self, path: &str, payload: Option<&P>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let body = encode_body(payload, NullHandling::Omit)?;
        let request = HttpRequest::new(HttpMethod::Post, normalize_path(path)).with_json_body(body);
        read_response(self.dispatch(request).await?)
    }

    /// POST with an empty body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.post::<T, ()>(path, None).await
    }

    /// PUT `payload` with every member, `null` ones included.
    pub async fn put<T, P>(&self, path: &str, payload: &P) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let body = encode_body(Some(payload), NullHandling::Include)?;
        let request = HttpRequest::new(HttpMethod::Put, normalize_path(path)).with_json_body(body);
        read_response(self.dispatch(request).await?)
    }

    /// DELETE with no body and no `Content-Type`. The response body is
    /// ignored on success.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.dispatch(HttpRequest::new(HttpMethod::Delete, normalize_path(path))).await?;
        Ok(())
    }

    async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = request.method;
        let path = request.path.clone();
        tracing::debug!(%method, %path, "dispatching GitLab request");

        let response = self.transport.send(request).await?;
        tracing::debug!(%method, %path, status = %response.status, "GitLab response received");

        ensure_success(response)
    }
}

/// Pass 2xx responses through; convert anything else into a `GitLabError`.
fn ensure_success(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.status.is_success() {
        return Ok(response);
    }

    let message = match response.body {
        Ok(text) => text,
        Err(err) => {
            tracing::debug!(error = %err, "error response body unreadable, using empty message");
            String::new()
        }
    };
    tracing::warn!(status = %response.status, %message, "GitLab API rejected request");

    Err(GitLabError::new(response.status, message).into())
}

/// Decode a success body. An empty body decodes as JSON `null`, which `()`
/// and `Option<_>` targets accept.
fn read_response<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    let text = response.body?;
    let json = if text.trim().is_empty() { "null" } else { text.as_str() };

    serde_json::from_str(json).map_err(|source| ApiError::Deserialization { source, body: text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use async_trait::async_trait;
    use http::header::{HeaderValue, CONTENT_TYPE, LINK};
    use http::StatusCode;
    use serde::Deserialize;
    use std::sync::Mutex;

    /// Records every request and replays a canned response.
    struct StubTransport {
        status: StatusCode,
        body: Option<String>,
        headers: HeaderMap,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl StubTransport {
        fn new(status: StatusCode, body: &str) -> Arc<Self> {
            Arc::new(Self {
                status,
                body: Some(body.to_string()),
                headers: HeaderMap::new(),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn unreadable(status: StatusCode) -> Arc<Self> {
            Arc::new(Self {
                status,
                body: None,
                headers: HeaderMap::new(),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn last(&self) -> HttpRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            let mut response = match &self.body {
                Some(body) => HttpResponse::new(self.status, body.clone()),
                None => HttpResponse::unreadable(
                    self.status,
                    TransportError::Other("stream reset".into()),
                ),
            };
            response.headers = self.headers.clone();
            Ok(response)
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl Transport for FailingTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::Other("connection refused".into()))
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Created {
        id: u64,
    }

    #[derive(Serialize)]
    struct Edit {
        a: Option<String>,
        b: u32,
    }

    fn requestor(stub: &Arc<StubTransport>) -> Requestor {
        Requestor::new(Arc::clone(stub))
    }

    #[tokio::test]
    async fn get_normalizes_path_and_decodes() {
        let stub = StubTransport::new(StatusCode::OK, r#"{"id":7}"#);
        let created: Created = requestor(&stub).get("projects/7").await.unwrap();
        assert_eq!(created, Created { id: 7 });

        let req = stub.last();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "/api/v4/projects/7");
        assert!(req.body.is_none());
        assert!(req.headers.get(CONTENT_TYPE).is_none());
    }

    #[tokio::test]
    async fn post_decodes_created_resource() {
        let stub = StubTransport::new(StatusCode::CREATED, r#"{"id":5}"#);
        let created: Created = requestor(&stub)
            .post("/projects", Some(&Edit { a: None, b: 1 }))
            .await
            .unwrap();
        assert_eq!(created.id, 5);
    }

    #[tokio::test]
    async fn post_omits_null_members() {
        let stub = StubTransport::new(StatusCode::CREATED, "{}");
        let _: serde_json::Value = requestor(&stub)
            .post("projects", Some(&Edit { a: None, b: 1 }))
            .await
            .unwrap();

        let req = stub.last();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "/api/v4/projects");
        assert_eq!(req.body.as_deref(), Some(r#"{"b":1}"#));
        assert_eq!(req.headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[tokio::test]
    async fn post_without_payload_sends_empty_body() {
        let stub = StubTransport::new(StatusCode::CREATED, "{}");
        let _: serde_json::Value = requestor(&stub).post_empty("projects/1/star").await.unwrap();

        let req = stub.last();
        assert_eq!(req.body.as_deref(), Some(""));
        assert_eq!(req.headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[tokio::test]
    async fn put_keeps_null_members() {
        let stub = StubTransport::new(StatusCode::OK, r#"{"id":1}"#);
        let _: Created = requestor(&stub)
            .put("/api/v4/projects/1", &Edit { a: None, b: 1 })
            .await
            .unwrap();

        let req = stub.last();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "/api/v4/projects/1");
        assert_eq!(req.body.as_deref(), Some(r#"{"a":null,"b":1}"#));
        assert_eq!(req.headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[tokio::test]
    async fn delete_sends_no_body_and_ignores_response() {
        let stub = StubTransport::new(StatusCode::ACCEPTED, "this is not json");
        requestor(&stub).delete("projects/1").await.unwrap();

        let req = stub.last();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.path, "/api/v4/projects/1");
        assert!(req.body.is_none());
        assert!(req.headers.get(CONTENT_TYPE).is_none());
    }

    #[tokio::test]
    async fn rejection_carries_raw_body_for_every_verb() {
        let stub = StubTransport::new(StatusCode::NOT_FOUND, "not found");
        let r = requestor(&stub);

        let errors = vec![
            r.get::<Created>("x").await.unwrap_err(),
            r.get_with_headers::<Created>("x").await.unwrap_err(),
            r.post::<Created, _>("x", Some(&Edit { a: None, b: 1 })).await.unwrap_err(),
            r.post_empty::<Created>("x").await.unwrap_err(),
            r.put::<Created, _>("x", &Edit { a: None, b: 1 }).await.unwrap_err(),
            r.delete("x").await.unwrap_err(),
        ];
        for err in errors {
            let rejection = err.rejection().expect("expected a GitLab rejection");
            assert_eq!(rejection.message(), "not found");
            assert_eq!(rejection.status(), StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn unreadable_error_body_becomes_empty_message() {
        let stub = StubTransport::unreadable(StatusCode::INTERNAL_SERVER_ERROR);
        let err = requestor(&stub).delete("projects/1").await.unwrap_err();
        assert_eq!(err.rejection().unwrap().message(), "");
    }

    #[tokio::test]
    async fn unreadable_success_body_is_transport_error() {
        let stub = StubTransport::unreadable(StatusCode::OK);
        let err = requestor(&stub).get::<Created>("projects/1").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[tokio::test]
    async fn unreadable_success_body_is_fine_for_delete() {
        let stub = StubTransport::unreadable(StatusCode::NO_CONTENT);
        requestor(&stub).delete("projects/1").await.unwrap();
    }

    #[tokio::test]
    async fn non_json_success_is_decode_failure() {
        let stub = StubTransport::new(StatusCode::OK, "not json");
        let err = requestor(&stub).get::<Created>("users").await.unwrap_err();
        assert!(err.is_decode_failure());
        assert!(!err.is_rejection());
        match err {
            ApiError::Deserialization { body, .. } => assert_eq!(body, "not json"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_success_body_decodes_as_null() {
        let stub = StubTransport::new(StatusCode::CREATED, "");
        let r = requestor(&stub);
        r.post_empty::<()>("projects/1/archive").await.unwrap();
        let nothing: Option<Created> = r.get("projects/1").await.unwrap();
        assert!(nothing.is_none());
        assert!(r.get::<Created>("projects/1").await.unwrap_err().is_decode_failure());
    }

    #[tokio::test]
    async fn get_with_headers_returns_headers_unmodified() {
        let mut headers = HeaderMap::new();
        headers.append("x-total", HeaderValue::from_static("42"));
        let next = "<https://gitlab/api/v4/users?page=2>; rel=\"next\"";
        let last = "<https://gitlab/api/v4/users?page=5>; rel=\"last\"";
        headers.append(LINK, HeaderValue::from_static(next));
        headers.append(LINK, HeaderValue::from_static(last));
        let stub = Arc::new(StubTransport {
            status: StatusCode::OK,
            body: Some("[]".to_string()),
            headers: headers.clone(),
            seen: Mutex::new(Vec::new()),
        });

        let (users, returned): (Vec<Created>, HeaderMap) =
            requestor(&stub).get_with_headers("users").await.unwrap();
        assert!(users.is_empty());
        assert_eq!(returned, headers);
        assert_eq!(returned.get("x-total").unwrap(), "42");
        assert_eq!(returned.get_all("link").iter().count(), 2);
    }

    #[tokio::test]
    async fn transport_failure_is_not_a_rejection() {
        let err = Requestor::new(FailingTransport)
            .get::<Created>("users")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(TransportError::Other(_))));
    }

    #[tokio::test]
    async fn serialization_failure_skips_transport() {
        use std::collections::HashMap;
        let stub = StubTransport::new(StatusCode::OK, "{}");
        let mut bad = HashMap::new();
        bad.insert((1, 2), "tuple keys are not JSON");
        let err = requestor(&stub)
            .put::<serde_json::Value, _>("x", &bad)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Serialization(_)));
        assert!(stub.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dropping_the_future_cancels_without_error() {
        struct Hanging;

        #[async_trait]
        impl Transport for Hanging {
            async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
                std::future::pending().await
            }
        }

        let r = Requestor::new(Hanging);
        let outcome = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            r.get::<Created>("users"),
        )
        .await;
        assert!(outcome.is_err(), "call should have been abandoned, not resolved");
    }
}
