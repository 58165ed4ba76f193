//! Bounded reading of the one-shot request body.

use crate::error::ExtractionError;
use bytes::Bytes;
use encore_core::{BoxError, EncoreError, EncoreResult, RequestEnv, Task};
use http_body::Body;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use std::pin::Pin;

type LimitedBody = Pin<Box<dyn Body<Data = Bytes, Error = BoxError> + Send>>;

/// Default maximum body size (1 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Reads the whole request body, up to `max_bytes`.
///
/// Returns `Ok(None)` when the body exceeds the limit. The body handle is
/// released either way.
///
/// # Errors
///
/// [`EncoreError::BodyConsumed`] if the body was already taken, and
/// [`EncoreError::BodyRead`] if the transport fails mid-read.
pub async fn read_limited(env: &RequestEnv, max_bytes: usize) -> EncoreResult<Option<Bytes>> {
    let body: LimitedBody = Box::pin(Limited::new(env.take_body()?, max_bytes));
    match body.collect().await {
        Ok(collected) => Ok(Some(collected.to_bytes())),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            tracing::warn!(
                request_id = %env.request_id(),
                max_bytes,
                error = %ExtractionError::payload_too_large(max_bytes),
                "request body exceeds limit"
            );
            Ok(None)
        }
        Err(err) => Err(EncoreError::body_read(err.to_string())),
    }
}

/// A memoized task reading the body once per request.
pub fn read_body(max_bytes: usize) -> Task<Option<Bytes>> {
    Task::from_async(move |env| Box::pin(read_limited(env, max_bytes))).memo()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body::Frame;
    use http_body_util::{combinators::UnsyncBoxBody, StreamBody};

    #[tokio::test]
    async fn test_reads_whole_body() {
        let env = RequestEnv::builder().body("Title=Foo").build();
        let bytes = read_limited(&env, DEFAULT_MAX_BODY_SIZE).await.unwrap().unwrap();
        assert_eq!(&bytes[..], b"Title=Foo");
    }

    #[tokio::test]
    async fn test_over_limit_is_none() {
        let env = RequestEnv::builder().body(vec![b'a'; 32]).build();
        assert!(read_limited(&env, 16).await.unwrap().is_none());
        assert!(!env.body_available());
    }

    #[tokio::test]
    async fn test_second_read_reports_consumed() {
        let env = RequestEnv::builder().body("x").build();
        read_limited(&env, 16).await.unwrap();
        assert_eq!(
            read_limited(&env, 16).await.unwrap_err(),
            EncoreError::BodyConsumed
        );
    }

    #[tokio::test]
    async fn test_memoized_read_shares_bytes() {
        let env = RequestEnv::builder().body("once").build();
        let task = read_body(16);

        let first = task.run(&env).await.unwrap();
        let second = task.run(&env).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.as_deref(), Some(&b"once"[..]));
    }

    #[tokio::test]
    async fn test_transport_error_is_body_read() {
        let frames: Vec<Result<Frame<Bytes>, BoxError>> = vec![
            Ok(Frame::data(Bytes::from_static(b"par"))),
            Err("connection reset".into()),
        ];
        let stream = futures_util::stream::iter(frames);
        let body: UnsyncBoxBody<Bytes, BoxError> = StreamBody::new(stream).boxed_unsync();
        let env = RequestEnv::builder().raw_body(body).build();

        let err = read_limited(&env, 16).await.unwrap_err();
        assert!(matches!(err, EncoreError::BodyRead { .. }));
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_memoized_read_runs_on_spawned_task() {
        let env = std::sync::Arc::new(RequestEnv::builder().body("spawned").build());
        let task = read_body(64);

        let handle = tokio::spawn({
            let env = std::sync::Arc::clone(&env);
            async move { task.run(&env).await }
        });
        let bytes = handle.await.unwrap().unwrap();
        assert_eq!(bytes.as_deref(), Some(&b"spawned"[..]));
    }
}
