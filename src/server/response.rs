use may_minihttp::Response;

/// Owned, buffered response state for one request.
///
/// The dispatch core writes into this buffer; the service flushes it to the
/// transport exactly once, after dispatch returns. `sent` means the body was
/// finalized by an explicit send — the classifier treats that as "response
/// already begun" and will not rewrite it. `suppressed` means a guard exited
/// the request on purpose and nothing should be written at all. `writable`
/// is cleared by the transport when the client is known to be gone.
#[derive(Debug, Clone)]
pub struct ResponseBuffer {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    sent: bool,
    suppressed: bool,
    writable: bool,
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
            sent: false,
            suppressed: false,
            writable: true,
        }
    }
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Set or replace a header (name comparison is case-insensitive).
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers
            .retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Finalize the body. After this the failure classifier only logs.
    pub fn set_body(&mut self, bytes: Vec<u8>) {
        self.body = bytes;
        self.sent = true;
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Mark the response as intentionally unsent (guard exit); the flush
    /// writes nothing and the transport's bare default goes out.
    pub fn suppress(&mut self) {
        self.suppressed = true;
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Transport hook: the client disconnected or the stream broke.
    pub fn mark_unwritable(&mut self) {
        self.writable = false;
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }
}

/// Reason phrase for a status code; the generic user-facing message when a
/// failure is not safe to expose.
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Not Authorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown",
    }
}

/// Whether a status code is part of the recognized table; failures carrying
/// anything else are coerced to 500 by the classifier.
pub fn is_known_status(status: u16) -> bool {
    !matches!(status_reason(status), "Unknown")
}

/// Common headers as static strings so the hot path avoids leaking.
fn static_header(name: &str, value: &str) -> Option<&'static str> {
    match (name, value) {
        ("Content-Type", "text/plain") => Some("Content-Type: text/plain"),
        ("Content-Type", "text/html") => Some("Content-Type: text/html"),
        ("Content-Type", "application/json") => Some("Content-Type: application/json"),
        _ => None,
    }
}

/// Flush the buffered response to the transport. A suppressed, unsent
/// buffer writes nothing.
pub fn flush(res: &mut Response, buf: &ResponseBuffer) {
    if buf.is_suppressed() && !buf.is_sent() {
        return;
    }
    res.status_code(buf.status() as usize, status_reason(buf.status()));
    for (name, value) in buf.headers() {
        match static_header(name, value) {
            Some(header) => {
                res.header(header);
            }
            None => {
                let header = format!("{name}: {value}").into_boxed_str();
                res.header(Box::leak(header));
            }
        }
    }
    res.body_vec(buf.body().to_vec());
}

/// Write a plain-text error directly, bypassing the buffer; used before a
/// request context exists (e.g. an unparseable method token).
pub fn write_plain_error(res: &mut Response, status: u16, message: &str) {
    res.status_code(status as usize, status_reason(status));
    res.header("Content-Type: text/plain");
    res.body_vec(message.as_bytes().to_vec());
}
