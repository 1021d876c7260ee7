//! Server-sent events push endpoint
//!
//! Each subscriber is one long-lived GET whose body is an endless sequence of
//! `data: <payload>\n\n` frames (EventSource wire format). The response body
//! stream owns the broker subscription: when the client goes away hyper drops
//! the stream, the subscription's drop guard deregisters, and a deregistered
//! subscriber's stream ends instead of blocking forever.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::{BufMut, Bytes, BytesMut};
use futures::Stream;

use crate::broker::Subscription;
use crate::server::AppState;

/// Frame one payload as a server-sent event: `data: <payload>\n\n`
pub fn frame(payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(payload.len() + 8);
    buf.put_slice(b"data: ");
    buf.put_slice(payload);
    buf.put_slice(b"\n\n");
    buf.freeze()
}

/// Body stream over one subscription.
///
/// Every yielded chunk is handed to hyper as its own body frame and written
/// out immediately; no buffering delay sits between a publish and the wire.
struct EventStream {
    subscription: Subscription,
}

impl Stream for EventStream {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        match this.subscription.poll_recv(cx) {
            Poll::Ready(Some(payload)) => Poll::Ready(Some(Ok(frame(&payload)))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// GET handler for the push listener.
///
/// Registers a subscriber with the broadcast core and streams frames until
/// the client disconnects or the subscriber is deregistered. If the core is
/// unavailable the endpoint answers 500 and registers nothing.
pub async fn subscribe_events(State(state): State<AppState>) -> Response {
    let subscription = match state.broker.subscribe().await {
        Ok(subscription) => subscription,
        Err(e) => {
            tracing::error!(error = %e, "Subscription rejected, broadcast core unavailable");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    tracing::debug!(subscriber = %subscription.id(), "Event stream opened");

    let body = Body::from_stream(EventStream { subscription });

    Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
