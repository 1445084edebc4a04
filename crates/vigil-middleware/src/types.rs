//! Common HTTP types used by the middleware.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use http_body_util::Full;

/// The HTTP request type flowing through the middleware.
///
/// A standard `http::Request` with a fully-buffered `Full<Bytes>` body.
/// Conformance checking needs the complete body on both sides of the
/// exchange, so streaming bodies are out of scope.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type flowing through the middleware.
pub type Response = http::Response<Full<Bytes>>;

/// A boxed future returned by handlers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Collects a fully-buffered body into its bytes.
pub(crate) async fn collect_bytes(body: Full<Bytes>) -> Bytes {
    match http_body_util::BodyExt::collect(body).await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => match err {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_bytes_round_trips() {
        let body = Full::new(Bytes::from_static(b"hello"));
        let bytes = collect_bytes(body).await;
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn test_collect_empty_body() {
        let bytes = collect_bytes(Full::new(Bytes::new())).await;
        assert!(bytes.is_empty());
    }
}
