//! In-memory response sink handed to handlers.

use std::io;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderValue, Response, StatusCode};
use lambda_runtime::tracing::warn;

use crate::sniff::detect_content_type;

/// Records the status, headers and body a handler writes.
///
/// Mirrors a conventional response writer: only the first status counts, the
/// first body write commits status 200 if none was set, and headers are frozen
/// at the moment the status is committed.
#[derive(Debug, Default)]
pub struct ResponseRecorder {
    headers: HeaderMap,
    snapshot: Option<HeaderMap>,
    status: Option<StatusCode>,
    body: Vec<u8>,
}

impl ResponseRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Live header map. Changes after the status is committed are not recorded.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub const fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Commits the response status and freezes the headers.
    pub fn write_header(&mut self, status: StatusCode) {
        if let Some(committed) = self.status {
            warn!(
                committed = %committed,
                ignored = %status,
                "Superfluous write_header call"
            );
            return;
        }
        self.status = Some(status);
        self.snapshot = Some(self.headers.clone());
    }

    /// Appends `data` to the body, committing status 200 first if needed.
    ///
    /// When the status is committed here and no `Content-Type` was set, one is
    /// detected from `data`.
    pub fn write_body(&mut self, data: impl AsRef<[u8]>) {
        let data = data.as_ref();
        if self.status.is_none() {
            if !self.headers.contains_key(CONTENT_TYPE)
                && !self.headers.contains_key(TRANSFER_ENCODING)
            {
                self.headers.insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static(detect_content_type(data)),
                );
            }
            self.write_header(StatusCode::OK);
        }
        self.body.extend_from_slice(data);
    }

    /// Status written so far, 200 when the handler never set one.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Finalizes the recording into a response.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        let status = self.status();
        let mut response = Response::new(Bytes::from(self.body));
        *response.status_mut() = status;
        *response.headers_mut() = self.snapshot.unwrap_or(self.headers);
        response
    }
}

impl io::Write for ResponseRecorder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_body(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
