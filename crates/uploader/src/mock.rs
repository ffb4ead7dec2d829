//! Scripted transport and chunk sources for tests.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use mediadrop_protocol::{ApiResponse, HttpMethod};
use mediadrop_transfer::{Chunk, ChunkSource, TransferError, checksum_bytes};

use crate::transport::{Transport, TransportError, TransportFuture};

/// A request as the transport saw it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub method: HttpMethod,
    pub endpoint: String,
    pub params: serde_json::Value,
}

impl Call {
    pub fn command(&self) -> &str {
        self.params
            .get("command")
            .and_then(|c| c.as_str())
            .unwrap_or("")
    }
}

/// Transport that records requests and replays scripted responses in order.
///
/// Tracks how many calls are in flight at once so tests can assert that
/// sends are serialized.
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn push_ok(&self, body: serde_json::Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(ApiResponse::ok(body)));
    }

    pub fn push_err(&self, err: TransportError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| c.command().to_string())
            .collect()
    }

    pub fn count(&self, command: &str) -> usize {
        self.calls().iter().filter(|c| c.command() == command).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn respond(
        &self,
        method: HttpMethod,
        endpoint: &str,
        params: &serde_json::Value,
    ) -> TransportFuture<'_> {
        self.calls.lock().unwrap().push(Call {
            method,
            endpoint: endpoint.to_string(),
            params: params.clone(),
        });

        Box::pin(async move {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            // Give any concurrent caller a chance to overlap.
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let next = self.responses.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Err(TransportError::Http("no mock response available".into())))
        })
    }
}

impl Transport for MockTransport {
    fn get(&self, endpoint: &str, params: &serde_json::Value) -> TransportFuture<'_> {
        self.respond(HttpMethod::Get, endpoint, params)
    }

    fn post(&self, endpoint: &str, params: &serde_json::Value) -> TransportFuture<'_> {
        self.respond(HttpMethod::Post, endpoint, params)
    }
}

/// In-memory chunk source.
///
/// With `eager_end` the source reports exhaustion together with the last
/// chunk; otherwise exhaustion is only discovered by the pull after it.
pub(crate) struct ScriptedSource {
    chunks: VecDeque<Vec<u8>>,
    next_index: u32,
    offset: u64,
    eager_end: bool,
    exhausted: bool,
    pub fail_at: Option<u32>,
}

impl ScriptedSource {
    pub fn new(chunks: Vec<Vec<u8>>, eager_end: bool) -> Self {
        Self {
            chunks: chunks.into(),
            next_index: 0,
            offset: 0,
            eager_end,
            exhausted: false,
            fail_at: None,
        }
    }
}

impl ChunkSource for ScriptedSource {
    fn next_chunk(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Chunk>, TransferError>> + Send + '_>> {
        Box::pin(async move {
            if self.fail_at == Some(self.next_index) {
                return Err(TransferError::Io(std::io::Error::other("disk went away")));
            }
            let Some(data) = self.chunks.pop_front() else {
                self.exhausted = true;
                return Ok(None);
            };
            let chunk = Chunk {
                segment_index: self.next_index,
                offset: self.offset,
                checksum: checksum_bytes(&data),
                data,
            };
            self.next_index += 1;
            self.offset += chunk.data.len() as u64;
            if self.eager_end && self.chunks.is_empty() {
                self.exhausted = true;
            }
            Ok(Some(chunk))
        })
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}
