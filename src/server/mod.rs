//! HTTP integration seam: request parsing, the buffered response, the
//! `may_minihttp` service adapter and a thin server wrapper.
//!
//! Everything in here is the boundary with the transport; the dispatch core
//! never touches `may_minihttp` types directly.

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_cookies, parse_query_params, parse_request, ParsedRequest};
pub use response::{flush, status_reason, ResponseBuffer};
pub use service::AppService;
