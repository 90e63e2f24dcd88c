//! Rebuilds an `http::Request` from an ALB event.

use std::time::{Duration, SystemTime};

use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use base64::{Engine, alphabet};
use bytes::Bytes;
use http::header::HOST;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Version};
use lambda_runtime::Context;
use lambda_runtime::tracing::debug;

use crate::Request;
use crate::models::{AdapterError, AlbTargetGroupRequest, MultiValueMap};
use crate::url::build_uri;
use crate::utils::parse_query;

/// Standard alphabet with padding, tolerant of non-zero trailing bits.
const BODY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Reconstructs the request a handler will see.
///
/// The request always declares HTTP/1.1, carries the invocation `context` in its
/// extensions, and owns its whole body in memory.
///
/// # Errors
///
/// - `MalformedURL`: path and query do not form a valid request target
/// - `MalformedBody`: `isBase64Encoded` is set but the body is not valid base64
/// - `MalformedHeader`: a header name or value is not representable
/// - `MalformedMethod`: the method is not a valid HTTP token
pub fn build_request(
    event: AlbTargetGroupRequest,
    context: Context,
) -> Result<Request, AdapterError> {
    if let Some(arn) = event.target_group_arn() {
        debug!(target_group_arn = %arn, "Received ALB event");
    }
    let event = event.resolve();

    let method = parse_method(&event.method)?;
    let uri = build_uri(&event.path, &event.query.into_multi())?;
    let headers = build_headers(event.headers.into_multi())?;
    let body = decode_body(event.body, event.body_encoded)?;

    debug!(
        method = %method,
        path = %uri.path(),
        body_size = body.len(),
        "Reconstructed request"
    );

    let mut request = Request::new(body);
    *request.method_mut() = method;
    *request.uri_mut() = uri;
    *request.version_mut() = Version::HTTP_11;
    *request.headers_mut() = headers;
    request.extensions_mut().insert(context);
    Ok(request)
}

fn parse_method(method: &str) -> Result<Method, AdapterError> {
    if method.is_empty() {
        return Ok(Method::GET);
    }
    Method::from_bytes(method.as_bytes())
        .map_err(|e| AdapterError::MalformedMethod(format!("{method:?}: {e}")))
}

fn build_headers(provided: MultiValueMap) -> Result<HeaderMap, AdapterError> {
    let mut headers = HeaderMap::with_capacity(provided.len());
    for (key, values) in provided {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| AdapterError::MalformedHeader(format!("name {key:?}: {e}")))?;
        for value in values {
            let value = HeaderValue::from_bytes(value.as_bytes()).map_err(|e| {
                AdapterError::MalformedHeader(format!("value of {key:?}: {e}"))
            })?;
            headers.append(name.clone(), value);
        }
    }
    Ok(headers)
}

/// Line breaks inside a base64 body are skipped.
fn decode_body(body: String, encoded: bool) -> Result<Bytes, AdapterError> {
    if !encoded {
        return Ok(Bytes::from(body));
    }
    let decoded = if body.contains(['\r', '\n']) {
        let compact: Vec<u8> = body
            .bytes()
            .filter(|b| !matches!(b, b'\r' | b'\n'))
            .collect();
        BODY_ENGINE.decode(compact)
    } else {
        BODY_ENGINE.decode(body.as_bytes())
    };
    decoded
        .map(Bytes::from)
        .map_err(|e| AdapterError::MalformedBody(e.to_string()))
}

/// Accessors for data the adapter attaches to reconstructed requests.
pub trait RequestExt {
    /// Decoded query parameters, values in the order they appear.
    fn query_params(&self) -> MultiValueMap;

    /// First decoded value of the query parameter `name`.
    fn query(&self, name: &str) -> Option<String>;

    /// Value of the `Host` header, empty when absent.
    fn host(&self) -> &str;

    /// Exact body length in bytes.
    fn content_length(&self) -> u64;

    /// Lambda invocation context of the current request.
    fn invocation_context(&self) -> Option<&Context>;

    /// Point in time after which the invocation is cancelled by the runtime.
    fn deadline(&self) -> Option<SystemTime>;
}

impl RequestExt for Request {
    fn query_params(&self) -> MultiValueMap {
        self.uri().query().map(parse_query).unwrap_or_default()
    }

    fn query(&self, name: &str) -> Option<String> {
        self.query_params()
            .remove(name)
            .and_then(|values| values.into_iter().next())
    }

    fn host(&self) -> &str {
        self.headers()
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    fn content_length(&self) -> u64 {
        self.body().len() as u64
    }

    fn invocation_context(&self) -> Option<&Context> {
        self.extensions().get::<Context>()
    }

    fn deadline(&self) -> Option<SystemTime> {
        self.invocation_context()
            .filter(|ctx| ctx.deadline > 0)
            .map(|ctx| SystemTime::UNIX_EPOCH + Duration::from_millis(ctx.deadline))
    }
}
