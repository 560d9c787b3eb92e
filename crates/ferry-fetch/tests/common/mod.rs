//! Test doubles shared by the ferry-fetch integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::{StreamExt, stream};
use tokio::sync::mpsc;
use url::Url;

use ferry_fetch::{HttpClient, RemoteBody};

#[derive(Debug)]
pub struct MockError(pub String);

impl std::fmt::Display for MockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

impl std::error::Error for MockError {}

type Chunk = Result<Bytes, MockError>;

enum Route {
    Body {
        content_length: Option<u64>,
        chunks:         mpsc::UnboundedReceiver<Chunk>,
    },
    Fail(String),
    Hang,
}

/// Remote side of a mocked response body. Chunks are delivered as they are
/// pushed; dropping the feed ends the body.
pub struct Feed {
    tx: mpsc::UnboundedSender<Chunk>,
}

impl Feed {
    pub fn chunk(&self, len: usize) { self.bytes(vec![0xAB; len]); }

    pub fn bytes(&self, data: impl Into<Bytes>) { let _ = self.tx.send(Ok(data.into())); }

    pub fn fail(&self, message: &str) { let _ = self.tx.send(Err(MockError(message.to_string()))); }
}

/// HTTP client whose responses are scripted per URL. Each route answers once.
#[derive(Clone, Default)]
pub struct MockClient {
    routes: Arc<Mutex<HashMap<String, Route>>>,
}

impl MockClient {
    pub fn new() -> Self { Self::default() }

    /// Answer `url` with a body fed through the returned [`Feed`].
    pub fn stream(&self, url: &str, content_length: Option<u64>) -> Feed {
        let (tx, chunks) = mpsc::unbounded_channel();
        self.insert(url, Route::Body { content_length, chunks });
        Feed { tx }
    }

    /// Fail the request for `url` before any header arrives.
    pub fn fail(&self, url: &str, message: &str) { self.insert(url, Route::Fail(message.to_string())); }

    /// Never answer `url`.
    pub fn hang(&self, url: &str) { self.insert(url, Route::Hang); }

    fn insert(&self, url: &str, route: Route) {
        let url = Url::parse(url).unwrap();
        self.routes.lock().unwrap().insert(url.to_string(), route);
    }
}

impl HttpClient for MockClient {
    type Error = MockError;

    fn get(&self, url: &Url) -> impl Future<Output = Result<RemoteBody<Self::Error>, Self::Error>> + Send {
        let route = self.routes.lock().unwrap().remove(url.as_str());
        let url = url.to_string();

        async move {
            match route {
                Some(Route::Body { content_length, chunks }) => {
                    let body = stream::unfold(chunks, |mut rx| async move { rx.recv().await.map(|c| (c, rx)) });
                    Ok(RemoteBody {
                        content_length,
                        body: body.boxed(),
                    })
                }
                Some(Route::Fail(message)) => Err(MockError(message)),
                Some(Route::Hang) => std::future::pending().await,
                None => Err(MockError(format!("no route for {url}"))),
            }
        }
    }
}

/// Poll `condition` until it holds, failing the test after five seconds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
