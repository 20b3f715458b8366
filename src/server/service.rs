use super::request::parse_request;
use super::response::{flush, write_plain_error};
use crate::context::{ErrorPages, RequestContext};
use crate::dispatcher::DispatchEngine;
use crate::metrics::RequestMetrics;
use http::Method;
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// The transport-facing service: parses the raw request, builds the
/// per-request context, runs the dispatch engine, and flushes the buffered
/// response. One instance is cloned per connection; all shared state is
/// behind `Arc` and read-only on this path.
#[derive(Clone)]
pub struct AppService {
    pub engine: Arc<DispatchEngine>,
    pub error_pages: Arc<ErrorPages>,
    metrics: Arc<RequestMetrics>,
}

impl AppService {
    pub fn new(engine: Arc<DispatchEngine>) -> Self {
        Self {
            engine,
            error_pages: Arc::new(ErrorPages::new()),
            metrics: Arc::new(RequestMetrics::new()),
        }
    }

    pub fn with_error_pages(mut self, pages: Arc<ErrorPages>) -> Self {
        self.error_pages = pages;
        self
    }

    pub fn metrics(&self) -> Arc<RequestMetrics> {
        Arc::clone(&self.metrics)
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let parsed = parse_request(req);
        let started = Instant::now();

        let method: Method = match parsed.method.parse() {
            Ok(m) => m,
            Err(_) => {
                write_plain_error(res, 400, "Bad Request");
                return Ok(());
            }
        };

        let mut ctx = RequestContext::new(method, parsed, Arc::clone(&self.error_pages));
        self.engine.dispatch(&mut ctx);

        let latency = started.elapsed();
        self.metrics.record(ctx.response().status(), latency);
        info!(
            request_id = %ctx.id,
            method = %ctx.method(),
            path = ctx.path(),
            status = ctx.response().status(),
            latency_ms = latency.as_millis() as u64,
            "request complete"
        );

        flush(res, ctx.response());
        Ok(())
    }
}
