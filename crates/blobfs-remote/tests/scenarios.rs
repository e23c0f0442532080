//! One scenario suite, run against the local engine, against a remote
//! store talking to a live server, and against a server that itself
//! proxies to another server.

use std::net::SocketAddr;
use std::sync::Arc;

use blobfs_remote::{RemoteConfig, RemoteStore};
use blobfs_server::{BlobServer, ServerConfig};
use blobfs_store::{BlobStorage, FsBlobStore, StoreConfig};
use blobfs_types::{BlobError, ContentType};
use bytes::Bytes;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct RunningServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

impl RunningServer {
    async fn start(server: BlobServer) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            server
                .serve_on(listener, async move {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });
        Self {
            addr,
            shutdown: Some(tx),
            handle,
        }
    }

    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.unwrap();
    }
}

fn local_server(root: &std::path::Path) -> BlobServer {
    let mut config = ServerConfig::default();
    config.store = StoreConfig::new(root);
    BlobServer::new(config).unwrap()
}

fn bytes(s: &str) -> Bytes {
    Bytes::copy_from_slice(s.as_bytes())
}

async fn add_then_get(store: &dyn BlobStorage) {
    store.mkdir("users").await.unwrap();
    store
        .add(ContentType::Json, "users/alice", bytes("{\"x\":1}"))
        .await
        .unwrap();
    let (content_type, data) = store.read("users/alice").await.unwrap();
    assert_eq!(content_type, ContentType::Json);
    assert_eq!(data, b"{\"x\":1}");
}

async fn add_twice(store: &dyn BlobStorage) {
    store.mkdir("twice").await.unwrap();
    store.add(ContentType::Plain, "twice/x", bytes("first")).await.unwrap();
    let err = store.add(ContentType::Png, "twice/x", bytes("second")).await.unwrap_err();
    assert!(matches!(err, BlobError::AlreadyExists(_)), "{err}");
    let (content_type, data) = store.read("twice/x").await.unwrap();
    assert_eq!(content_type, ContentType::Plain);
    assert_eq!(data, b"first");
}

async fn set_overwrites(store: &dyn BlobStorage) {
    store.mkdir("set").await.unwrap();
    let err = store.set(ContentType::Plain, "set/x", bytes("nope")).await.unwrap_err();
    assert!(matches!(err, BlobError::NotFound(_)), "{err}");

    store.add(ContentType::Plain, "set/x", bytes("one")).await.unwrap();
    assert_eq!(store.set(ContentType::Plain, "set/x", bytes("three")).await.unwrap(), 5);
    assert_eq!(store.read("set/x").await.unwrap().1, b"three");
}

async fn del_then_get(store: &dyn BlobStorage) {
    store.mkdir("del").await.unwrap();
    store.add(ContentType::Stream, "del/x", bytes("data")).await.unwrap();
    store.del("del/x").await.unwrap();
    let err = store.get("del/x").await.unwrap_err();
    assert!(matches!(err, BlobError::NotFound(_)), "{err}");
    let err = store.del("del/x").await.unwrap_err();
    assert!(matches!(err, BlobError::NotFound(_)), "{err}");
}

async fn bucket_lifecycle(store: &dyn BlobStorage) {
    store.mkdir("life").await.unwrap();
    let err = store.mkdir("life").await.unwrap_err();
    assert!(matches!(err, BlobError::AlreadyExists(_)), "{err}");
    assert!(store.lsdir("life").await.unwrap().is_empty());

    store.add(ContentType::Mp4, "life/movie", bytes("frames")).await.unwrap();
    assert_eq!(
        store.lsdir("life").await.unwrap(),
        vec![("video/mp4".to_string(), "movie".to_string())]
    );

    let err = store.rmdir("life").await.unwrap_err();
    assert!(matches!(err, BlobError::NotEmpty(_)), "{err}");
    assert_eq!(store.read("life/movie").await.unwrap().1, b"frames");

    store.del("life/movie").await.unwrap();
    store.rmdir("life").await.unwrap();
    let err = store.lsdir("life").await.unwrap_err();
    assert!(matches!(err, BlobError::NotFound(_)), "{err}");
}

async fn shape_errors(store: &dyn BlobStorage) {
    store.mkdir("shape").await.unwrap();

    let err = store.add(ContentType::Stream, "missing/x", bytes("x")).await.unwrap_err();
    assert!(matches!(err, BlobError::NoSuchBucket(_)), "{err}");

    let err = store.get("shape").await.unwrap_err();
    assert!(matches!(err, BlobError::IsDirectory(_)), "{err}");

    let err = store.get("a/b/c").await.unwrap_err();
    assert!(matches!(err, BlobError::InvalidFormat { .. }), "{err}");

    let err = store.mkdir("a/b").await.unwrap_err();
    assert!(matches!(err, BlobError::BadPath(_)), "{err}");

    let err = store.add(ContentType::Stream, "shape/x", Bytes::new()).await.unwrap_err();
    assert!(matches!(err, BlobError::BadRequest(_)), "{err}");
}

async fn traversal(store: &dyn BlobStorage) {
    let err = store.add(ContentType::Stream, "../x", bytes("x")).await.unwrap_err();
    assert!(matches!(err, BlobError::IllegalPath(_)), "{err}");
    let err = store.get("users/../../etc").await.unwrap_err();
    assert!(matches!(err, BlobError::IllegalPath(_)), "{err}");
    let err = store.mkdir("..").await.unwrap_err();
    assert!(matches!(err, BlobError::IllegalPath(_)), "{err}");
}

async fn concurrent_adds(store: Arc<dyn BlobStorage>) {
    store.mkdir("race").await.unwrap();
    let a = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.add(ContentType::Stream, "race/x", bytes("a")).await })
    };
    let b = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.add(ContentType::Stream, "race/x", bytes("b")).await })
    };
    let results = [a.await.unwrap(), b.await.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(BlobError::AlreadyExists(_)))));
    assert_eq!(store.lsdir("race").await.unwrap().len(), 1);
}

async fn run_suite(store: Arc<dyn BlobStorage>) {
    add_then_get(store.as_ref()).await;
    add_twice(store.as_ref()).await;
    set_overwrites(store.as_ref()).await;
    del_then_get(store.as_ref()).await;
    bucket_lifecycle(store.as_ref()).await;
    shape_errors(store.as_ref()).await;
    traversal(store.as_ref()).await;
    concurrent_adds(store).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn local_engine() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsBlobStore::open(StoreConfig::new(dir.path())).unwrap();
    run_suite(Arc::new(store)).await;
    assert!(dir.path().join("users/ADalice").is_file());
    assert!(dir.path().join("race/AAx").is_file());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn remote_store() {
    let dir = tempfile::tempdir().unwrap();
    let server = RunningServer::start(local_server(dir.path())).await;

    let remote = RemoteStore::new(RemoteConfig::new(server.url())).unwrap();
    assert_eq!(remote.health().await.unwrap().status, "ok");
    run_suite(Arc::new(remote)).await;

    server.stop().await;
    assert!(dir.path().join("users/ADalice").is_file());
    assert!(dir.path().join("race/AAx").is_file());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn server_fronting_remote_store() {
    let dir = tempfile::tempdir().unwrap();
    let backend = RunningServer::start(local_server(dir.path())).await;

    let upstream = RemoteStore::new(RemoteConfig::new(backend.url())).unwrap();
    let gateway = RunningServer::start(BlobServer::with_storage(
        ServerConfig::default(),
        Arc::new(upstream),
    ))
    .await;

    let remote = RemoteStore::new(RemoteConfig::new(gateway.url())).unwrap();
    run_suite(Arc::new(remote)).await;

    gateway.stop().await;
    backend.stop().await;
    assert!(dir.path().join("users/ADalice").is_file());
}

#[tokio::test]
async fn reopened_server_sees_earlier_writes() {
    let dir = tempfile::tempdir().unwrap();

    let server = RunningServer::start(local_server(dir.path())).await;
    let remote = RemoteStore::new(RemoteConfig::new(server.url())).unwrap();
    remote.mkdir("keep").await.unwrap();
    remote.add(ContentType::Gif, "keep/cat", bytes("GIF89a")).await.unwrap();
    server.stop().await;

    let server = RunningServer::start(local_server(dir.path())).await;
    let remote = RemoteStore::new(RemoteConfig::new(server.url())).unwrap();
    let (content_type, data) = remote.read("keep/cat").await.unwrap();
    assert_eq!(content_type, ContentType::Gif);
    assert_eq!(data, b"GIF89a");
    server.stop().await;
}
