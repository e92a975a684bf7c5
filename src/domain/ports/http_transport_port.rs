//! Port for plain HTTP GET requests.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::errors::TransportError;

/// A completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Raw body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status <= 299
    }
}

/// Shared network session used by search and image download.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issues a GET to `url` with the given query parameters appended.
    async fn get(&self, url: &str, query: &[(String, String)])
    -> Result<HttpResponse, TransportError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use tokio::sync::Notify;

    /// Transport replaying queued responses in order.
    pub struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
        calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedTransport {
        /// Creates a transport with no queued responses.
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                gate: None,
            }
        }

        /// Blocks every request until `gate` is notified.
        pub fn gated(gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::new()
            }
        }

        /// Queues a response.
        pub fn push(&self, response: Result<HttpResponse, TransportError>) {
            self.responses.lock().push_back(response);
        }

        /// Queues a successful response.
        pub fn push_ok(&self, status: u16, body: impl Into<Bytes>) {
            self.push(Ok(HttpResponse::new(status, body)));
        }

        /// Number of requests issued so far.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Query parameters of the `n`th request.
        pub fn query(&self, n: usize) -> Vec<(String, String)> {
            self.requests.lock()[n].1.clone()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn get(
            &self,
            url: &str,
            query: &[(String, String)],
        ) -> Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .push((url.to_string(), query.to_vec()));

            if let Some(gate) = &self.gate {
                gate.notified().await;
            }

            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::other("no scripted response")))
        }
    }
}
