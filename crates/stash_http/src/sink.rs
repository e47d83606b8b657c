use bytes::BytesMut;
use http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode};

use crate::body::{ProxyBody, full};
use crate::headers::strip_hop_by_hop;

/// Write side of an HTTP response: what a handler needs to produce one.
///
/// Calls may come in any order; the status defaults to `200 OK` when a
/// handler never sets one.
pub trait ResponseSink {
    fn set_status(&mut self, status: StatusCode);

    /// Appends a value; existing values for `name` are kept.
    fn add_header(&mut self, name: HeaderName, value: HeaderValue);

    fn write_body(&mut self, chunk: &[u8]);
}

/// The sink that ends up on the client connection.
///
/// Buffers like the capture does, then turns into the hyper response the
/// connection writes out. Hop-by-hop headers are dropped on the way out.
#[derive(Debug, Default)]
pub struct ClientResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl ClientResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to exactly `value`, replacing anything written before.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn into_response(self) -> Response<ProxyBody> {
        let mut headers = self.headers;
        strip_hop_by_hop(&mut headers);

        let mut response = Response::new(full(self.body.freeze()));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = headers;
        response
    }
}

impl ResponseSink for ClientResponse {
    fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn add_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.append(name, value);
    }

    fn write_body(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }
}
