use alb_http_adapter::{Request, RequestExt, ResponseRecorder, handler_fn};
use http::StatusCode;
use http::header::{CONTENT_TYPE, HeaderValue};
use lambda_runtime::Error;

fn hello(req: Request, w: &mut ResponseRecorder) {
    if req.uri().path() != "/" {
        w.write_header(StatusCode::NOT_FOUND);
        w.write_body("not found\n");
        return;
    }
    let name = req.query("name").unwrap_or_else(|| "world".to_string());
    w.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    w.write_body(format!("Hello, {name}, from AWS Lambda behind ALB\n"));
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Use Lambda runtime's built-in tracing subscriber for CloudWatch Logs
    lambda_runtime::tracing::init_default_subscriber();

    alb_http_adapter::run(handler_fn(hello)).await
}
