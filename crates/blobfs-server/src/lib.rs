//! HTTP server for blobfs.
//!
//! Exposes any [`BlobStorage`](blobfs_store::BlobStorage) backend over
//! HTTP: `/b/{bucket}/{name}` for blobs, `/d/{bucket}` for buckets. Errors
//! leave as a status code plus a JSON [`ErrorBody`](blobfs_protocol::ErrorBody).

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ApiError, ServerError, ServerResult};
pub use handler::AppState;
pub use server::BlobServer;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use blobfs_protocol::{endpoints, ErrorBody, SetResponse};
    use blobfs_store::{FsBlobStore, StoreConfig};
    use blobfs_types::{ErrorKind, MimePolicy};
    use tower::util::ServiceExt;

    fn app(policy: MimePolicy) -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(StoreConfig::new(dir.path())).unwrap();
        let state = AppState::new(Arc::new(store), policy);
        (dir, router::build_router(state, 1024))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: &'static [u8],
    ) -> (StatusCode, Option<String>, Vec<u8>) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(ct) = content_type {
            req = req.header(header::CONTENT_TYPE, ct);
        }
        let response = app
            .clone()
            .oneshot(req.body(Body::from(body)).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let ct = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, ct, bytes.to_vec())
    }

    fn error_kind(body: &[u8]) -> ErrorKind {
        serde_json::from_slice::<ErrorBody>(body).unwrap().kind
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (_dir, app) = app(MimePolicy::Strict);
        let (status, _, _) = send(&app, Method::GET, endpoints::HEALTH, None, b"").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn add_get_json_blob() {
        let (dir, app) = app(MimePolicy::Strict);
        let (status, _, _) = send(&app, Method::POST, "/d/users", None, b"").await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _, _) =
            send(&app, Method::POST, "/b/users/alice", Some("application/json"), b"{\"x\":1}")
                .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(dir.path().join("users/ADalice").is_file());

        let (status, ct, body) = send(&app, Method::GET, "/b/users/alice", None, b"").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ct.as_deref(), Some("application/json"));
        assert_eq!(body, b"{\"x\":1}");
    }

    #[tokio::test]
    async fn duplicate_add_conflicts() {
        let (_dir, app) = app(MimePolicy::Strict);
        send(&app, Method::POST, "/d/b", None, b"").await;
        send(&app, Method::POST, "/b/b/x", Some("text/plain"), b"one").await;

        let (status, _, body) =
            send(&app, Method::POST, "/b/b/x", Some("text/plain"), b"two").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(error_kind(&body), ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn add_into_missing_bucket() {
        let (_dir, app) = app(MimePolicy::Strict);
        let (status, _, body) =
            send(&app, Method::POST, "/b/nope/x", Some("text/plain"), b"data").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_kind(&body), ErrorKind::NoSuchBucket);
    }

    #[tokio::test]
    async fn upload_validation() {
        let (_dir, app) = app(MimePolicy::Strict);
        send(&app, Method::POST, "/d/b", None, b"").await;

        let (status, _, body) = send(&app, Method::POST, "/b/b/x", None, b"data").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_kind(&body), ErrorKind::BadRequest);

        let (status, _, body) = send(&app, Method::POST, "/b/b/x", Some("text/plain"), b"").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_kind(&body), ErrorKind::BadRequest);

        let (status, _, body) =
            send(&app, Method::POST, "/b/b/x", Some("application/x-nope"), b"data").await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(error_kind(&body), ErrorKind::UnsupportedContentType);
    }

    #[tokio::test]
    async fn permissive_policy_stores_stream() {
        let (dir, app) = app(MimePolicy::Permissive);
        send(&app, Method::POST, "/d/b", None, b"").await;
        let (status, _, _) =
            send(&app, Method::POST, "/b/b/x", Some("application/x-nope"), b"data").await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(dir.path().join("b/AAx").is_file());
    }

    #[tokio::test]
    async fn set_reports_bytes_written() {
        let (_dir, app) = app(MimePolicy::Strict);
        send(&app, Method::POST, "/d/b", None, b"").await;
        let (status, _, body) =
            send(&app, Method::PUT, "/b/b/x", Some("text/plain"), b"data").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_kind(&body), ErrorKind::NotFound);

        send(&app, Method::POST, "/b/b/x", Some("text/plain"), b"data").await;
        let (status, _, body) =
            send(&app, Method::PUT, "/b/b/x", Some("text/plain"), b"longer").await;
        assert_eq!(status, StatusCode::OK);
        let resp: SetResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.written, 6);

        let (_, _, body) = send(&app, Method::GET, "/b/b/x", None, b"").await;
        assert_eq!(body, b"longer");
    }

    #[tokio::test]
    async fn delete_blob() {
        let (_dir, app) = app(MimePolicy::Strict);
        send(&app, Method::POST, "/d/b", None, b"").await;
        send(&app, Method::POST, "/b/b/x", Some("image/png"), b"png").await;

        let (status, _, _) = send(&app, Method::DELETE, "/b/b/x", None, b"").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _, body) = send(&app, Method::GET, "/b/b/x", None, b"").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_kind(&body), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn get_on_bucket_is_conflict() {
        let (_dir, app) = app(MimePolicy::Strict);
        send(&app, Method::POST, "/d/users", None, b"").await;
        let (status, _, body) = send(&app, Method::GET, "/b/users", None, b"").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(error_kind(&body), ErrorKind::IsDirectory);
    }

    #[tokio::test]
    async fn bucket_listing() {
        let (_dir, app) = app(MimePolicy::Strict);
        send(&app, Method::POST, "/d/b", None, b"").await;

        let (status, _, body) = send(&app, Method::GET, "/d/b", None, b"").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());

        send(&app, Method::POST, "/b/b/y", Some("text/plain"), b"y").await;
        send(&app, Method::POST, "/b/b/x", Some("application/json"), b"{}").await;
        let (status, _, body) = send(&app, Method::GET, "/d/b", None, b"").await;
        assert_eq!(status, StatusCode::OK);
        let listing: Vec<(String, String)> = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            listing,
            vec![
                ("application/json".to_string(), "x".to_string()),
                ("text/plain".to_string(), "y".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn bucket_lifecycle() {
        let (_dir, app) = app(MimePolicy::Strict);
        let (status, _, _) = send(&app, Method::POST, "/d/b", None, b"").await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _, body) = send(&app, Method::POST, "/d/b", None, b"").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(error_kind(&body), ErrorKind::AlreadyExists);

        send(&app, Method::POST, "/b/b/x", Some("text/plain"), b"x").await;
        let (status, _, body) = send(&app, Method::DELETE, "/d/b", None, b"").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_kind(&body), ErrorKind::NotEmpty);

        send(&app, Method::DELETE, "/b/b/x", None, b"").await;
        let (status, _, _) = send(&app, Method::DELETE, "/d/b", None, b"").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _, body) = send(&app, Method::GET, "/d/b", None, b"").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_kind(&body), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn bad_shapes_are_rejected() {
        let (_dir, app) = app(MimePolicy::Strict);
        let (status, _, body) = send(&app, Method::POST, "/d/a/b", None, b"").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_kind(&body), ErrorKind::BadPath);

        let (status, _, body) = send(&app, Method::GET, "/b/a/b/c", None, b"").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_kind(&body), ErrorKind::InvalidFormat);
    }

    #[tokio::test]
    async fn traversal_is_illegal() {
        let (_dir, app) = app(MimePolicy::Strict);
        let (status, _, body) = send(&app, Method::GET, "/b/%2E%2E/secret", None, b"").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_kind(&body), ErrorKind::IllegalPath);

        let (status, _, body) = send(&app, Method::POST, "/d/..", None, b"").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_kind(&body), ErrorKind::IllegalPath);
    }

    #[tokio::test]
    async fn oversized_body_is_refused() {
        let (_dir, app) = app(MimePolicy::Strict);
        send(&app, Method::POST, "/d/b", None, b"").await;
        static BIG: [u8; 2048] = [7u8; 2048];
        let (status, _, _) =
            send(&app, Method::POST, "/b/b/x", Some("application/octet-stream"), &BIG).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }
}
