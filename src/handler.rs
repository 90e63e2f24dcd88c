use std::sync::Arc;

use lambda_runtime::tracing::{error, info};
use lambda_runtime::{Context, Diagnostic, Error, LambdaEvent, service_fn};

use crate::capture::run_handler;
use crate::config::AdapterOptions;
use crate::models::{AdapterError, AlbTargetGroupRequest, AlbTargetGroupResponse};
use crate::request::build_request;
use crate::service::Handler;

/// Bridges ALB Lambda events to an HTTP [`Handler`].
///
/// The adapter holds no per-invocation state: every call builds its own request
/// and recorder, so one adapter can serve every invocation of the process.
#[derive(Debug)]
pub struct Adapter<H> {
    handler: H,
    options: AdapterOptions,
}

impl<H: Handler> Adapter<H> {
    #[must_use]
    pub fn new(handler: H) -> Self {
        Self::with_options(handler, AdapterOptions::default())
    }

    #[must_use]
    pub const fn with_options(handler: H, options: AdapterOptions) -> Self {
        Self { handler, options }
    }

    #[must_use]
    pub const fn options(&self) -> &AdapterOptions {
        &self.options
    }

    /// Handles one Lambda invocation.
    ///
    /// # Errors
    ///
    /// See [`Adapter::invoke`].
    pub async fn call(
        &self,
        event: LambdaEvent<AlbTargetGroupRequest>,
    ) -> Result<AlbTargetGroupResponse, AdapterError> {
        let (payload, context) = event.into_parts();
        self.invoke(context, payload).await
    }

    /// Translates `event`, runs the handler and translates its response back.
    ///
    /// Reply headers take the same single- or multi-value form as the event's.
    ///
    /// # Errors
    ///
    /// Returns an `AdapterError` with one of the following kinds:
    ///
    /// - `MalformedURL`: path and query cannot form a valid request target
    /// - `MalformedBody`: the body is flagged as base64 but does not decode
    /// - `MalformedHeader`: a header name or value is not representable
    /// - `MalformedMethod`: the method is not a valid HTTP token
    /// - `HandlerPanicked`: the handler panicked
    pub async fn invoke(
        &self,
        context: Context,
        event: AlbTargetGroupRequest,
    ) -> Result<AlbTargetGroupResponse, AdapterError> {
        let request_id = context.request_id.clone();
        let form = event.header_form();

        let request = build_request(event, context).inspect_err(|e| {
            error!(request_id = %request_id, error = %e, "Failed to reconstruct request");
        })?;

        info!(
            request_id = %request_id,
            method = %request.method(),
            path = %request.uri().path(),
            "Invoking handler"
        );

        let reply = run_handler(&self.handler, request, form, &self.options).await?;

        info!(
            request_id = %request_id,
            status = reply.status_code,
            "Handler completed"
        );
        Ok(reply)
    }
}

/// Starts the Lambda runtime loop serving `handler` behind ALB.
///
/// Options are read from the environment, see [`AdapterOptions::from_env`].
///
/// # Errors
///
/// Returns an error if the runtime loop fails; per-invocation adapter errors are
/// reported to Lambda as a `Diagnostic` with the error kind as `errorType`.
pub async fn run<H>(handler: H) -> Result<(), Error>
where
    H: Handler + 'static,
{
    let adapter = Arc::new(Adapter::with_options(handler, AdapterOptions::from_env()));
    lambda_runtime::run(service_fn(move |event: LambdaEvent<AlbTargetGroupRequest>| {
        let adapter = Arc::clone(&adapter);
        async move { adapter.call(event).await.map_err(Diagnostic::from) }
    }))
    .await
}
