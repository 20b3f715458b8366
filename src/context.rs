//! Per-request context: the isolation unit of the dispatch core.
//!
//! A [`RequestContext`] is created fresh for every inbound request, owns
//! exactly one request/response pair, and is never shared or reused across
//! requests — every guard and action receives the single owning context
//! explicitly rather than reaching for ambient state. It also owns the
//! failure classifier: the one place guard/action failures are turned into
//! a status code, a user-safe message, and a negotiated body.

use crate::error::{DispatchError, HttpFailure};
use crate::ids::RequestId;
use crate::pattern::ParamVec;
use crate::server::request::ParsedRequest;
use crate::server::response::{is_known_status, status_reason, ResponseBuffer};
use http::Method;
use minijinja::Environment;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, warn};

/// Per-status error page table rendered by the collaborating template
/// layer. A status with no page falls back to plain text.
pub struct ErrorPages {
    env: Environment<'static>,
    pages: HashMap<u16, PageEntry>,
}

struct PageEntry {
    template: String,
    data: Option<Value>,
}

impl Default for ErrorPages {
    fn default() -> Self {
        Self {
            env: Environment::new(),
            pages: HashMap::new(),
        }
    }
}

impl ErrorPages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template for a status code, with optional static data
    /// merged into every render.
    pub fn page(
        &mut self,
        status: u16,
        source: &str,
        data: Option<Value>,
    ) -> Result<(), DispatchError> {
        let name = format!("status-{status}");
        self.env
            .add_template_owned(name.clone(), source.to_string())
            .map_err(|e| DispatchError::Config(format!("error page for {status}: {e}")))?;
        self.pages.insert(status, PageEntry { template: name, data });
        Ok(())
    }

    pub fn has(&self, status: u16) -> bool {
        self.pages.contains_key(&status)
    }

    /// Render the page for a status; the failure context wins over the
    /// page's static data on key collisions.
    pub fn render(&self, status: u16, ctx: &Value) -> Option<String> {
        let entry = self.pages.get(&status)?;
        let tmpl = self.env.get_template(&entry.template).ok()?;
        let mut merged = match &entry.data {
            Some(Value::Object(m)) => m.clone(),
            _ => Map::new(),
        };
        if let Value::Object(m) = ctx {
            for (k, v) in m {
                merged.insert(k.clone(), v.clone());
            }
        }
        tmpl.render(Value::Object(merged)).ok()
    }
}

/// The negotiated error representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repr {
    Text,
    Json,
    Html,
}

/// Exclusively-owned state and behavior for one inbound request.
pub struct RequestContext {
    pub id: RequestId,
    method: Method,
    request: ParsedRequest,
    response: ResponseBuffer,
    /// Matched controller name, set by the engine during matching.
    pub controller: Option<String>,
    /// Matched action name, set by the engine during matching.
    pub action: Option<String>,
    params: ParamVec,
    positional: SmallVec<[String; 8]>,
    view_data: Map<String, Value>,
    error_pages: Arc<ErrorPages>,
    failed: bool,
}

impl RequestContext {
    pub fn new(method: Method, request: ParsedRequest, error_pages: Arc<ErrorPages>) -> Self {
        Self {
            id: RequestId::new(),
            method,
            request,
            response: ResponseBuffer::new(),
            controller: None,
            action: None,
            params: ParamVec::new(),
            positional: SmallVec::new(),
            view_data: Map::new(),
            error_pages,
            failed: false,
        }
    }

    // ----- request accessors -----

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.request.path
    }

    /// Header value; lookup is case-insensitive (keys are stored lowercase).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request
            .headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.request.headers
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.request.query_params.get(name).map(String::as_str)
    }

    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.request.query_params
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.request.cookies.get(name).map(String::as_str)
    }

    pub fn body(&self) -> Option<&Value> {
        self.request.body.as_ref()
    }

    // ----- matched parameters -----

    /// Named path parameter; last write wins on duplicate names.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> &ParamVec {
        &self.params
    }

    /// Merge named capture bindings into the parameter view. The engine
    /// calls this before the guard chain runs so guards observe them.
    pub fn merge_params<'a, I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (k, v) in pairs {
            self.params.push((k.to_string(), v.to_string()));
        }
    }

    /// Positional parameters from a convention-fallback match.
    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    pub(crate) fn set_positional(&mut self, params: Vec<String>) {
        self.positional = params.into();
    }

    // ----- per-request render state (explicit, never ambient) -----

    pub fn view_data(&self) -> &Map<String, Value> {
        &self.view_data
    }

    pub fn set_view(&mut self, key: &str, value: Value) {
        self.view_data.insert(key.to_string(), value);
    }

    // ----- response emission -----

    pub fn status(&mut self, status: u16) {
        self.response.set_status(status);
    }

    pub fn set_header(&mut self, name: &str, value: &str) {
        self.response.set_header(name, value);
    }

    /// Send a text body; Content-Type defaults to `text/plain` unless the
    /// controller set one.
    pub fn send(&mut self, body: &str) {
        if self.response.header_value("Content-Type").is_none() {
            self.response.set_header("Content-Type", "text/plain");
        }
        self.response.set_body(body.as_bytes().to_vec());
    }

    /// Send a JSON body.
    pub fn json(&mut self, body: Value) {
        self.response.set_header("Content-Type", "application/json");
        self.response
            .set_body(serde_json::to_vec(&body).unwrap_or_default());
    }

    /// Emit a redirect and finalize the response.
    pub fn redirect(&mut self, status: u16, location: &str) {
        self.response.set_status(status);
        self.response.set_header("Location", location);
        self.response.set_body(Vec::new());
    }

    pub fn response(&self) -> &ResponseBuffer {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut ResponseBuffer {
        &mut self.response
    }

    // ----- failure classification -----

    /// Classify a failure and emit the error response.
    ///
    /// Called exactly once per failed request, at the engine boundary. If
    /// the response was already finalized, or the transport reported the
    /// stream unwritable, nothing is rewritten — the failure is only
    /// reported to diagnostics.
    pub fn fail(&mut self, err: DispatchError) {
        if self.failed {
            warn!(request_id = %self.id, error = %err, "failure classifier invoked twice; ignoring");
            return;
        }
        self.failed = true;

        if self.response.is_sent() || !self.response.is_writable() {
            error!(
                request_id = %self.id,
                error = %err,
                detail = ?err,
                "failure after response was finalized; not rewriting"
            );
            return;
        }

        let (status, message, extra) = classify(&err);

        if status == 500 {
            // always reported with full detail, regardless of what the
            // client is shown
            error!(
                request_id = %self.id,
                status,
                controller = self.controller.as_deref(),
                action = self.action.as_deref(),
                error = %err,
                detail = ?err,
                "request failed"
            );
        } else {
            warn!(
                request_id = %self.id,
                status,
                error = %err,
                "request failed"
            );
        }

        self.response.set_status(status);
        match self.negotiate() {
            Repr::Json => {
                let mut body = Map::new();
                body.insert("error".to_string(), Value::String(message));
                if let Some(extra) = extra {
                    for (k, v) in extra {
                        body.entry(k).or_insert(v);
                    }
                }
                self.json(Value::Object(body));
            }
            Repr::Html => {
                let mut data = Map::new();
                data.insert("status".to_string(), Value::from(status));
                data.insert("error".to_string(), Value::String(message.clone()));
                for (k, v) in self.view_data.clone() {
                    data.entry(k).or_insert(v);
                }
                if let Some(extra) = extra {
                    for (k, v) in extra {
                        data.entry(k).or_insert(v);
                    }
                }
                let pages = Arc::clone(&self.error_pages);
                match pages.render(status, &Value::Object(data)) {
                    Some(html) => {
                        self.set_header("Content-Type", "text/html");
                        self.send(&html);
                    }
                    None => {
                        self.set_header("Content-Type", "text/plain");
                        self.send(&message);
                    }
                }
            }
            Repr::Text => {
                self.set_header("Content-Type", "text/plain");
                self.send(&message);
            }
        }
    }

    /// Pick the error representation: an explicit response Content-Type set
    /// before the failure wins, then the Accept header in listed order;
    /// nothing recognized defaults to plain text.
    fn negotiate(&self) -> Repr {
        let accept = match self.response.header_value("Content-Type") {
            Some(ct) => ct,
            None => self.header("accept").unwrap_or("*/*"),
        };
        for item in accept.split(',') {
            let mime = item.trim().split(';').next().unwrap_or("").trim();
            match mime {
                "text/plain" | "*/*" => return Repr::Text,
                "application/json" => return Repr::Json,
                "text/html" => return Repr::Html,
                _ => {}
            }
        }
        Repr::Text
    }
}

/// Classification rules, applied in order: missing filesystem entities map
/// to 404; a failure without a recognized status defaults to 500; the
/// message is exposed only when the failure says so.
fn classify(err: &DispatchError) -> (u16, String, Option<Map<String, Value>>) {
    match err {
        DispatchError::Http(f) => {
            let status = if is_known_status(f.status) { f.status } else { 500 };
            if f.expose {
                (status, f.message.clone(), f.extra.clone())
            } else {
                (status, status_reason(status).to_string(), None)
            }
        }
        DispatchError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (404, status_reason(404).to_string(), None)
        }
        _ => (500, status_reason(500).to_string(), None),
    }
}

/// Convenience constructor mirroring the context surface: raise a failure
/// with an explicit status and message.
pub fn raise(status: u16, message: impl Into<String>) -> DispatchError {
    DispatchError::Http(HttpFailure::new(status, message))
}
