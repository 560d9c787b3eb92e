use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use url::Url;

/// A boxed, sendable stream.
///
/// Used for remote response bodies and for stored-file bodies served back
/// to consumers.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Response headers of interest plus the streaming body.
pub struct RemoteBody<E> {
    /// Value of the Content-Length header, if the remote sent one.
    ///
    /// `None` with chunked transfer encoding.
    pub content_length: Option<u64>,

    /// Response body, chunk by chunk, in arrival order.
    pub body: BoxStream<'static, Result<Bytes, E>>,
}

impl<E> std::fmt::Debug for RemoteBody<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteBody")
            .field("content_length", &self.content_length)
            .field("body", &"{ ... }")
            .finish()
    }
}

/// Asynchronous HTTP client abstraction.
///
/// This trait provides the minimal interface the orchestrator needs. The
/// returned future is raced against the job's cancellation token, so
/// dropping it must abort the request.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync + 'static {
    /// Error type for HTTP operations.
    type Error: std::error::Error + Send + 'static;

    /// Issue a GET request and return the headers of interest and the body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails (DNS failure, connection error,
    /// non-success HTTP status, etc.).
    fn get(&self, url: &Url) -> impl Future<Output = Result<RemoteBody<Self::Error>, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;
    use futures_util::StreamExt;

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a new ReqwestClient with default configuration.
        pub fn new() -> Self { Self::default() }

        /// Wrap an already configured client.
        pub fn with_client(client: reqwest::Client) -> Self { Self { client } }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn get(&self, url: &Url) -> Result<RemoteBody<Self::Error>, Self::Error> {
            let response = self.client.get(url.clone()).send().await?.error_for_status()?;
            let content_length = response.content_length();
            let body = response.bytes_stream().boxed();

            Ok(RemoteBody { content_length, body })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
