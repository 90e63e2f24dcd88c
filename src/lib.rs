//! Run ordinary HTTP handlers inside AWS Lambda functions that sit behind an
//! Application Load Balancer.
//!
//! ALB delivers each HTTP request as a flat JSON event and expects a flat JSON
//! reply. This crate rebuilds an [`http::Request`] from the event, lets a
//! [`Handler`] write its response into an in-memory [`ResponseRecorder`], and
//! serializes the recording back into the reply ALB understands.
//!
//! ```no_run
//! use alb_http_adapter::{Request, RequestExt, ResponseRecorder, handler_fn};
//!
//! fn hello(req: Request, w: &mut ResponseRecorder) {
//!     let name = req.query("name").unwrap_or_else(|| "world".to_string());
//!     w.write_body(format!("Hello, {name}!"));
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), lambda_runtime::Error> {
//!     lambda_runtime::tracing::init_default_subscriber();
//!     alb_http_adapter::run(handler_fn(hello)).await
//! }
//! ```
//!
//! Both the event and the reply must fit Lambda's payload limits. Bodies that
//! are not valid UTF-8 are base64 encoded in the reply, which adds overhead.

pub mod capture;
pub mod config;
pub mod handler;
pub mod models;
pub mod recorder;
pub mod request;
pub mod service;
pub mod sniff;
pub mod url;
pub mod utils;

/// Request handed to handlers, with the whole body in memory.
pub type Request = http::Request<bytes::Bytes>;

pub use capture::{into_reply, run_handler, status_description};
pub use config::AdapterOptions;
pub use handler::{Adapter, run};
pub use models::{
    AdapterError, AlbTargetGroupRequest, AlbTargetGroupResponse, HeaderForm, MultiValueMap,
    Params,
};
pub use recorder::ResponseRecorder;
pub use request::{RequestExt, build_request};
pub use service::{Handler, HandlerFn, handler_fn};
pub use url::build_uri;
