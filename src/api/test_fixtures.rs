//! Shared test fixtures for code built on [`HttpClient`].

use std::sync::Mutex;

use http::StatusCode;

use super::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// Mock transport returning queued results and recording every request.
///
/// Once the queue is drained, the optional fallback response is repeated.
#[derive(Debug)]
pub struct MockClient {
    responses: Mutex<Vec<Result<HttpResponse, HttpError>>>,
    fallback: Option<HttpResponse>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockClient {
    pub fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Replies once with `status` and `body`.
    pub fn replying(status: StatusCode, body: &str) -> Self {
        Self::new(vec![Ok(HttpResponse::with_status(status, body))])
    }

    /// Replies with `status` and `body` to every request.
    pub fn always(status: StatusCode, body: &str) -> Self {
        Self::new(vec![]).then_always(status, body)
    }

    /// Sets the response used after the queue is drained.
    pub fn then_always(mut self, status: StatusCode, body: &str) -> Self {
        self.fallback = Some(HttpResponse::with_status(status, body));
        self
    }

    pub fn captured_requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl HttpClient for MockClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push(req);

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return self
                .fallback
                .clone()
                .map_or(Err(HttpError::Timeout), Ok);
        }
        responses.remove(0)
    }
}

impl<T: HttpClient> HttpClient for std::sync::Arc<T> {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        (**self).request(req).await
    }
}
