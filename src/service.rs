use std::sync::Arc;

use async_trait::async_trait;

use crate::Request;
use crate::recorder::ResponseRecorder;

/// Application logic run once per translated request.
///
/// The handler answers by writing a status, headers and body to the
/// [`ResponseRecorder`]. HTTP error statuses are ordinary answers; the adapter
/// reports them to ALB unchanged.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn serve(&self, req: Request, w: &mut ResponseRecorder);
}

/// Handler backed by a synchronous function or closure. See [`handler_fn`].
#[derive(Clone, Copy, Debug)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wraps a synchronous function into a [`Handler`].
///
/// ```
/// use alb_http_adapter::{handler_fn, Request, ResponseRecorder};
///
/// let hello = handler_fn(|_req: Request, w: &mut ResponseRecorder| {
///     w.write_body("hello");
/// });
/// # let _ = hello;
/// ```
#[must_use]
pub const fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(Request, &mut ResponseRecorder) + Send + Sync,
{
    HandlerFn { f }
}

#[async_trait]
impl<F> Handler for HandlerFn<F>
where
    F: Fn(Request, &mut ResponseRecorder) + Send + Sync,
{
    async fn serve(&self, req: Request, w: &mut ResponseRecorder) {
        (self.f)(req, w);
    }
}

#[async_trait]
impl<H: Handler + ?Sized> Handler for Arc<H> {
    async fn serve(&self, req: Request, w: &mut ResponseRecorder) {
        (**self).serve(req, w).await;
    }
}

#[async_trait]
impl<H: Handler + ?Sized> Handler for Box<H> {
    async fn serve(&self, req: Request, w: &mut ResponseRecorder) {
        (**self).serve(req, w).await;
    }
}
