//! Runs a handler against a recorder and serializes what it wrote into an ALB reply.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use futures::FutureExt;
use http::{HeaderMap, HeaderValue, Response, StatusCode};
use lambda_runtime::tracing::{debug, error};

use crate::Request;
use crate::config::AdapterOptions;
use crate::models::{AdapterError, AlbTargetGroupResponse, HeaderForm, MultiValueMap};
use crate::recorder::ResponseRecorder;
use crate::service::Handler;
use crate::utils::canonical_header_key;

/// Invokes `handler` once and captures its complete response.
///
/// Non-2xx statuses, empty bodies and header-only responses are valid handler
/// decisions and produce an ordinary reply.
///
/// # Errors
///
/// Returns `AdapterError::HandlerPanicked` if the handler panics; whatever it
/// had recorded is discarded.
pub async fn run_handler<H>(
    handler: &H,
    request: Request,
    form: HeaderForm,
    options: &AdapterOptions,
) -> Result<AlbTargetGroupResponse, AdapterError>
where
    H: Handler + ?Sized,
{
    let mut recorder = ResponseRecorder::new();
    let outcome = AssertUnwindSafe(handler.serve(request, &mut recorder))
        .catch_unwind()
        .await;

    if let Err(payload) = outcome {
        let message = panic_message(payload.as_ref());
        error!(panic = %message, "Handler panicked");
        return Err(AdapterError::HandlerPanicked(message));
    }

    Ok(into_reply(recorder.into_response(), form, options))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

/// Serializes a recorded response into the reply shape ALB expects.
#[must_use]
pub fn into_reply(
    response: Response<Bytes>,
    form: HeaderForm,
    options: &AdapterOptions,
) -> AlbTargetGroupResponse {
    let (parts, body) = response.into_parts();
    let force_binary = options.forces_binary(&parts.headers);
    let (body, is_base64_encoded) = encode_body(body, force_binary);

    debug!(
        status = %parts.status,
        body_size = body.len(),
        base64 = is_base64_encoded,
        "Captured handler response"
    );

    let (headers, multi_value_headers) = match form {
        HeaderForm::Single => (Some(single_value_headers(&parts.headers)), None),
        HeaderForm::Multi => (None, Some(multi_value_headers(&parts.headers))),
    };

    AlbTargetGroupResponse {
        status_code: parts.status.as_u16(),
        status_description: status_description(parts.status),
        headers,
        multi_value_headers,
        body,
        is_base64_encoded,
    }
}

/// `"<code> <reason>"`. The reason is empty for unregistered codes (`"599 "`).
#[must_use]
pub fn status_description(status: StatusCode) -> String {
    format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    )
}

fn encode_body(body: Bytes, force_binary: bool) -> (String, bool) {
    if !force_binary && let Ok(text) = std::str::from_utf8(&body) {
        return (text.to_string(), false);
    }
    (STANDARD.encode(&body), true)
}

fn header_value_string(value: &HeaderValue) -> String {
    value.to_str().map_or_else(
        |_| String::from_utf8_lossy(value.as_bytes()).into_owned(),
        str::to_string,
    )
}

fn single_value_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .keys()
        .map(|name| {
            let joined = headers
                .get_all(name)
                .iter()
                .map(header_value_string)
                .collect::<Vec<_>>()
                .join(",");
            (canonical_header_key(name.as_str()), joined)
        })
        .collect()
}

fn multi_value_headers(headers: &HeaderMap) -> MultiValueMap {
    headers
        .keys()
        .map(|name| {
            let values = headers
                .get_all(name)
                .iter()
                .map(header_value_string)
                .collect();
            (canonical_header_key(name.as_str()), values)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use crate::service::handler_fn;
    use http::header::CONTENT_TYPE;

    fn run(
        handler: &dyn Handler,
        form: HeaderForm,
        options: &AdapterOptions,
    ) -> Result<AlbTargetGroupResponse, AdapterError> {
        tokio_test::block_on(run_handler(handler, Request::new(Bytes::new()), form, options))
    }

    #[test]
    fn test_status_description() {
        let test_cases = vec![
            (StatusCode::OK, "200 OK"),
            (StatusCode::CREATED, "201 Created"),
            (StatusCode::NO_CONTENT, "204 No Content"),
            (StatusCode::BAD_REQUEST, "400 Bad Request"),
            (StatusCode::NOT_FOUND, "404 Not Found"),
            (StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error"),
            (StatusCode::from_u16(599).unwrap(), "599 "),
        ];
        for (status, expected) in test_cases {
            assert_eq!(status_description(status), expected);
        }
    }

    #[test]
    fn test_encode_body() {
        assert_eq!(
            encode_body(Bytes::from("Hello, 世界! 🌍"), false),
            ("Hello, 世界! 🌍".to_string(), false)
        );
        assert_eq!(
            encode_body(Bytes::from_static(&[0x00, 0x01, 0x02, 0xFF, 0xFE]), false),
            ("AAEC//4=".to_string(), true)
        );
        assert_eq!(
            encode_body(Bytes::from("hello"), true),
            ("aGVsbG8=".to_string(), true)
        );
        assert_eq!(encode_body(Bytes::new(), false), (String::new(), false));
    }

    #[test]
    fn test_single_value_headers_joined_in_order() {
        let handler = handler_fn(|_req, w: &mut ResponseRecorder| {
            w.headers_mut()
                .append("x-multi", HeaderValue::from_static("first"));
            w.headers_mut()
                .append("x-multi", HeaderValue::from_static("second"));
            w.write_header(StatusCode::OK);
        });
        let reply = run(&handler, HeaderForm::Single, &AdapterOptions::default()).unwrap();
        let headers = reply.headers.unwrap();
        assert_eq!(headers["X-Multi"], "first,second");
        assert!(reply.multi_value_headers.is_none());
    }

    #[test]
    fn test_multi_value_headers_verbatim() {
        let handler = handler_fn(|_req, w: &mut ResponseRecorder| {
            w.headers_mut()
                .append("set-cookie", HeaderValue::from_static("a=1"));
            w.headers_mut()
                .append("set-cookie", HeaderValue::from_static("b=2"));
        });
        let reply = run(&handler, HeaderForm::Multi, &AdapterOptions::default()).unwrap();
        assert!(reply.headers.is_none());
        assert_eq!(reply.multi_value_headers.unwrap()["Set-Cookie"], vec!["a=1", "b=2"]);
    }

    #[test]
    fn test_forced_binary_media_type() {
        let handler = handler_fn(|_req, w: &mut ResponseRecorder| {
            w.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("image/svg+xml"));
            w.write_body("<svg/>");
        });
        let options = AdapterOptions::default().with_binary_media_type("image/*");
        let reply = run(&handler, HeaderForm::Single, &options).unwrap();
        assert!(reply.is_base64_encoded);
        assert_eq!(reply.body, STANDARD.encode("<svg/>"));
    }

    #[test]
    fn test_panic_translated() {
        let handler = handler_fn(|_req, _w: &mut ResponseRecorder| panic!("boom"));
        let err = run(&handler, HeaderForm::Single, &AdapterOptions::default()).unwrap_err();
        assert_eq!(err, AdapterError::HandlerPanicked("boom".to_string()));
    }

    #[test]
    fn test_panic_with_formatted_message() {
        let handler = handler_fn(|_req, _w: &mut ResponseRecorder| panic!("code {}", 42));
        let err = run(&handler, HeaderForm::Single, &AdapterOptions::default()).unwrap_err();
        assert_eq!(err, AdapterError::HandlerPanicked("code 42".to_string()));
    }
}
