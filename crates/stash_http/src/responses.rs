use http::{HeaderValue, Response, StatusCode, header};

use crate::body::{ProxyBody, full};

pub const SERVER_NAME: &str = "stash/0.1.0";

/// Generic helper for a fully buffered response.
pub fn send_response(status: StatusCode, content_type: &str, body: impl Into<bytes::Bytes>) -> Response<ProxyBody> {
    let mut response = Response::new(full(body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(header::SERVER, HeaderValue::from_static(SERVER_NAME));
    if let Ok(value) = HeaderValue::from_str(content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    response
}

fn send_text_response(status: StatusCode, body: String) -> Response<ProxyBody> {
    send_response(status, "text/plain; charset=utf-8", body)
}

/// Upstream unreachable, refused, or returned garbage.
pub fn send_502(detail: &str) -> Response<ProxyBody> {
    send_text_response(
        StatusCode::BAD_GATEWAY,
        format!("502 Bad Gateway\nupstream request failed: {detail}\n"),
    )
}

/// Upstream did not answer within the client timeout.
pub fn send_504(detail: &str) -> Response<ProxyBody> {
    send_text_response(
        StatusCode::GATEWAY_TIMEOUT,
        format!("504 Gateway Timeout\nupstream request failed: {detail}\n"),
    )
}

pub fn send_404() -> Response<ProxyBody> {
    send_text_response(StatusCode::NOT_FOUND, "404 Not Found\n".to_string())
}

pub fn send_405_with_allow(allow: &'static str) -> Response<ProxyBody> {
    let mut response = send_text_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "405 Method Not Allowed\n".to_string(),
    );
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(allow));
    response
}

pub fn send_json(body: String) -> Response<ProxyBody> {
    send_response(StatusCode::OK, "application/json; charset=utf-8", body)
}
