use bytes::{Bytes, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode};
use http_body_util::BodyExt;
use stash_http::{ProxyBody, ResponseSink};

use crate::error::ForwardError;
use crate::forwarder::Upstream;

/// In-memory stand-in for the client connection.
///
/// Records whatever a handler writes so the response can be cached and then
/// replayed. One capture per request; it is consumed by [`into_parts`].
///
/// [`into_parts`]: ResponseCapture::into_parts
#[derive(Debug, Default)]
pub struct ResponseCapture {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status(), self.headers, self.body.freeze())
    }
}

impl ResponseSink for ResponseCapture {
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

/// Runs `req` through `upstream` and writes the whole response into `sink`.
///
/// On error the sink may hold a partial response; callers must discard it.
pub async fn forward_into<U, S>(
    upstream: &U,
    req: Request<ProxyBody>,
    sink: &mut S,
) -> Result<(), ForwardError>
where
    U: Upstream,
    S: ResponseSink,
{
    let response = upstream.forward(req).await?;
    let (parts, mut body) = response.into_parts();

    sink.set_status(parts.status);
    for (name, value) in &parts.headers {
        sink.add_header(name.clone(), value.clone());
    }

    while let Some(frame) = body.frame().await {
        if let Some(chunk) = frame?.data_ref() {
            sink.write_body(chunk);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ResponseCapture, forward_into};
    use crate::{ForwardError, Upstream};
    use bytes::Bytes;
    use http::{HeaderName, HeaderValue, Request, Response, StatusCode};
    use stash_http::body::{empty, full};
    use stash_http::{ProxyBody, ResponseSink};

    struct Fixed;

    impl Upstream for Fixed {
        async fn forward(&self, _req: Request<ProxyBody>) -> Result<Response<ProxyBody>, ForwardError> {
            let response = Response::builder()
                .status(StatusCode::ACCEPTED)
                .header("vary", "accept")
                .header("vary", "origin")
                .body(full(Bytes::from_static(b"captured")))
                .expect("response");
            Ok(response)
        }
    }

    #[test]
    fn capture_accepts_writes_in_any_order() {
        let mut capture = ResponseCapture::new();
        capture.write_body(b"ab");
        capture.add_header(HeaderName::from_static("x-a"), HeaderValue::from_static("1"));
        capture.set_status(StatusCode::NOT_FOUND);
        capture.write_body(b"cd");
        capture.add_header(HeaderName::from_static("x-a"), HeaderValue::from_static("2"));

        let (status, headers, body) = capture.into_parts();
        assert_eq!(status, StatusCode::NOT_FOUND);
        let values: Vec<_> = headers.get_all("x-a").iter().collect();
        assert_eq!(values, vec!["1", "2"]);
        assert_eq!(&body[..], b"abcd");
    }

    #[test]
    fn capture_without_status_reports_ok() {
        assert_eq!(ResponseCapture::new().status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn forward_into_records_full_response() {
        let mut capture = ResponseCapture::new();
        let req = Request::get("/anything").body(empty()).expect("request");

        forward_into(&Fixed, req, &mut capture).await.expect("fixed upstream");

        assert_eq!(capture.status(), StatusCode::ACCEPTED);
        assert_eq!(capture.headers().get_all("vary").iter().count(), 2);
        assert_eq!(capture.body(), b"captured");
    }
}
