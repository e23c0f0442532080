//! HTTP client implementing [`BlobStorage`].

use std::time::Duration;

use async_trait::async_trait;
use blobfs_protocol::{endpoints, kind_for_status, ErrorBody, HealthResponse, SetResponse};
use blobfs_store::{BlobStorage, BlobStream, ListEntry};
use blobfs_types::path::{denotes_bucket, validate, SEPARATOR};
use blobfs_types::{BlobError, BlobPath, BlobResult, BucketPath, ContentType};
use bytes::Bytes;
use futures::TryStreamExt;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode, Url};
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::config::RemoteConfig;

/// Route family of a request.
#[derive(Clone, Copy, Debug)]
enum Route {
    Blob,
    Bucket,
}

impl Route {
    fn segment(self) -> &'static str {
        let path = match self {
            Self::Blob => endpoints::BLOB,
            Self::Bucket => endpoints::BUCKET,
        };
        path.trim_start_matches(SEPARATOR)
    }
}

/// Blob storage backed by a remote blobfs server.
///
/// # Example
///
/// ```rust,no_run
/// use blobfs_remote::{RemoteConfig, RemoteStore};
/// use blobfs_store::BlobStorage;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = RemoteStore::new(RemoteConfig::new("http://127.0.0.1:8085"))?;
/// store.mkdir("users").await?;
/// let (content_type, data) = store.read("users/alice").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RemoteStore {
    config: RemoteConfig,
    base: Url,
    virtual_root: Vec<String>,
    client: Client,
}

impl RemoteStore {
    pub fn new(config: RemoteConfig) -> BlobResult<Self> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            BlobError::Transport(format!("invalid base url {}: {e}", config.base_url))
        })?;
        if base.cannot_be_a_base() {
            return Err(BlobError::Transport(format!(
                "base url {} cannot carry a path",
                config.base_url
            )));
        }

        let virtual_root = match &config.virtual_root {
            Some(prefix) => {
                validate(prefix)?;
                prefix
                    .split(SEPARATOR)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            }
            None => Vec::new(),
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(transport)?;

        debug!(base = %base, virtual_root = ?config.virtual_root, "remote store created");
        Ok(Self {
            config,
            base,
            virtual_root,
            client,
        })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Ask the server whether it is up.
    pub async fn health(&self) -> BlobResult<HealthResponse> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| pathless_base(&self.base))?
            .pop_if_empty()
            .extend(endpoints::HEALTH.split(SEPARATOR).filter(|s| !s.is_empty()));
        let resp = check(self.client.get(url).send().await.map_err(transport)?).await?;
        resp.json().await.map_err(transport)
    }

    /// `{base}/{route}/{virtual_root...}/{path...}`, each segment percent-encoded.
    fn url(&self, route: Route, path: &str) -> BlobResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| pathless_base(&self.base))?
            .pop_if_empty()
            .push(route.segment())
            .extend(&self.virtual_root)
            .extend(path.split(SEPARATOR));
        Ok(url)
    }

    fn request(&self, method: Method, route: Route, path: &str) -> BlobResult<RequestBuilder> {
        let url = self.url(route, path)?;
        debug!(%method, %url, "remote request");
        Ok(self.client.request(method, url))
    }

    fn upload(
        &self,
        method: Method,
        content_type: ContentType,
        path: &str,
        data: Bytes,
    ) -> BlobResult<RequestBuilder> {
        Ok(self
            .request(method, Route::Blob, path)?
            .header(header::CONTENT_TYPE, content_type.mime())
            .body(data))
    }
}

fn pathless_base(base: &Url) -> BlobError {
    BlobError::Transport(format!("base url {base} cannot carry a path"))
}

fn transport(err: reqwest::Error) -> BlobError {
    BlobError::Transport(err.to_string())
}

/// Rebuild the error a failed response describes.
///
/// The JSON error body carries the exact kind; without one the status code
/// is mapped back through [`kind_for_status`].
fn decode_error(status: StatusCode, body: &[u8]) -> BlobError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(err) => err.into_error(),
        Err(_) => {
            let detail = String::from_utf8_lossy(body);
            let detail = if detail.trim().is_empty() {
                status.to_string()
            } else {
                detail.trim().to_string()
            };
            BlobError::from_kind(kind_for_status(status), detail)
        }
    }
}

/// Pass successful responses through, turn the rest into errors.
async fn check(resp: Response) -> BlobResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.bytes().await.map_err(transport)?;
    Err(decode_error(status, &body))
}

#[async_trait]
impl BlobStorage for RemoteStore {
    async fn add(&self, content_type: ContentType, path: &str, data: Bytes) -> BlobResult<()> {
        BlobPath::parse(path)?;
        let req = self.upload(Method::POST, content_type, path, data)?;
        check(req.send().await.map_err(transport)?).await?;
        Ok(())
    }

    async fn set(&self, content_type: ContentType, path: &str, data: Bytes) -> BlobResult<u64> {
        BlobPath::parse(path)?;
        let req = self.upload(Method::PUT, content_type, path, data)?;
        let resp = check(req.send().await.map_err(transport)?).await?;
        let body: SetResponse = resp.json().await.map_err(transport)?;
        Ok(body.written)
    }

    async fn get(&self, path: &str) -> BlobResult<BlobStream> {
        validate(path)?;
        // Bucket-shaped paths go to the server so it can answer IsDirectory.
        if !denotes_bucket(path) {
            BlobPath::parse(path)?;
        }
        let req = self.request(Method::GET, Route::Blob, path)?;
        let resp = check(req.send().await.map_err(transport)?).await?;

        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ContentType::from_mime_or_stream)
            .unwrap_or(ContentType::Stream);
        let body = resp.bytes_stream().map_err(std::io::Error::other);
        Ok(BlobStream::new(content_type, Box::pin(StreamReader::new(body))))
    }

    async fn del(&self, path: &str) -> BlobResult<()> {
        BlobPath::parse(path)?;
        let req = self.request(Method::DELETE, Route::Blob, path)?;
        check(req.send().await.map_err(transport)?).await?;
        Ok(())
    }

    async fn mkdir(&self, path: &str) -> BlobResult<()> {
        BucketPath::parse(path)?;
        let req = self.request(Method::POST, Route::Bucket, path)?;
        check(req.send().await.map_err(transport)?).await?;
        Ok(())
    }

    async fn rmdir(&self, path: &str) -> BlobResult<()> {
        BucketPath::parse(path)?;
        let req = self.request(Method::DELETE, Route::Bucket, path)?;
        check(req.send().await.map_err(transport)?).await?;
        Ok(())
    }

    async fn lsdir(&self, path: &str) -> BlobResult<Vec<ListEntry>> {
        BucketPath::parse(path)?;
        let req = self.request(Method::GET, Route::Bucket, path)?;
        let resp = check(req.send().await.map_err(transport)?).await?;
        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        resp.json().await.map_err(transport)
    }
}
