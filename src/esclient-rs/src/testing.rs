//! In-memory transport for unit tests: records every request and answers
//! from a responder closure.

use std::sync::{Arc, Mutex};

use crate::transport::{HttpRequest, HttpResponse, Transport};
use crate::Result;

type Responder = Box<dyn Fn(&HttpRequest, usize) -> HttpResponse + Send + Sync>;

pub(crate) struct RecordingTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responder: Responder,
}

pub(crate) fn response(status: u16, body: &str) -> HttpResponse {
    let reason = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or_default();

    HttpResponse {
        status,
        reason: reason.to_string(),
        body: body.to_string(),
    }
}

impl RecordingTransport {
    /// Responder gets the request and its zero-based position in the call sequence
    pub fn with_responder(
        responder: impl Fn(&HttpRequest, usize) -> HttpResponse + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        })
    }

    pub fn respond_with(status: u16, body: &str) -> Arc<Self> {
        let body = body.to_string();
        Self::with_responder(move |_, _| response(status, &body))
    }

    pub fn ok(body: &str) -> Arc<Self> {
        Self::respond_with(200, body)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Transport for RecordingTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut requests = self.requests.lock().unwrap();
        let response = (self.responder)(&request, requests.len());
        requests.push(request);
        Ok(response)
    }
}
