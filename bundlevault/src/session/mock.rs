//! Scriptable in-memory transport for tests.

use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::sync::Arc;

use parking_lot::Mutex;

use super::http::{HttpRequest, HttpResponse, HttpTransport, Method, TransportFailure};

/// A file served by the mock, with controllable header hints.
#[derive(Debug, Clone)]
pub struct MockFile {
    data: Vec<u8>,
    filename: Option<String>,
    report_size: bool,
    honour_range: bool,
    fail_after: Option<usize>,
}

impl MockFile {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            filename: None,
            report_size: true,
            honour_range: true,
            fail_after: None,
        }
    }

    /// Advertise a filename via `Content-Disposition`.
    pub fn named(mut self, filename: &str) -> Self {
        self.filename = Some(filename.to_string());
        self
    }

    /// Omit `Content-Length` from HEAD replies.
    pub fn without_size(mut self) -> Self {
        self.report_size = false;
        self
    }

    /// Reply 200 with the full body even when a range was requested.
    pub fn ignoring_range(mut self) -> Self {
        self.honour_range = false;
        self
    }

    /// Break the body stream after `bytes` bytes.
    pub fn failing_after(mut self, bytes: usize) -> Self {
        self.fail_after = Some(bytes);
        self
    }
}

#[derive(Debug, Clone)]
enum MockRoute {
    Page(String),
    Status(u16),
    File(MockFile),
}

/// A request as seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
    pub range_start: Option<u64>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default)]
struct MockState {
    routes: HashMap<String, MockRoute>,
    requests: Vec<RecordedRequest>,
    body_bytes_served: u64,
}

/// Mock transport answering from a fixed route table.
///
/// Unknown URLs fail like an unreachable host.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, body: &str) -> Self {
        self.route(url, MockRoute::Page(body.to_string()))
    }

    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.route(url, MockRoute::Status(status))
    }

    pub fn with_file(self, url: &str, file: MockFile) -> Self {
        self.route(url, MockRoute::File(file))
    }

    fn route(self, url: &str, route: MockRoute) -> Self {
        self.state.lock().routes.insert(url.to_string(), route);
        self
    }

    /// Every request issued so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// Requests for one URL.
    pub fn requests_for(&self, url: &str) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|r| r.url == url).collect()
    }

    /// Total file body bytes handed out by GET replies.
    pub fn body_bytes_served(&self) -> u64 {
        self.state.lock().body_bytes_served
    }
}

impl HttpTransport for MockTransport {
    fn execute(&self, request: &HttpRequest<'_>) -> Result<HttpResponse, TransportFailure> {
        let mut state = self.state.lock();
        state.requests.push(RecordedRequest {
            method: request.method,
            url: request.url.to_string(),
            headers: request
                .headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            form: request
                .form
                .map(|f| f.fields().to_vec())
                .unwrap_or_default(),
            range_start: request.range_start,
        });

        let route = state
            .routes
            .get(request.url)
            .cloned()
            .ok_or_else(|| TransportFailure(format!("connection refused: {}", request.url)))?;

        let response = match route {
            MockRoute::Page(body) => respond(200, Vec::new(), body.into_bytes(), None),
            MockRoute::Status(status) => respond(status, Vec::new(), Vec::new(), None),
            MockRoute::File(file) => {
                let (response, served) = serve_file(&file, request);
                state.body_bytes_served += served;
                response
            }
        };
        Ok(response)
    }
}

fn serve_file(file: &MockFile, request: &HttpRequest<'_>) -> (HttpResponse, u64) {
    let len = file.data.len() as u64;

    if request.method == Method::Head {
        let mut headers = Vec::new();
        if file.report_size {
            headers.push(("content-length".to_string(), len.to_string()));
        }
        if let Some(name) = &file.filename {
            headers.push((
                "content-disposition".to_string(),
                format!("attachment; filename=\"{}\"", name),
            ));
        }
        return (respond(200, headers, Vec::new(), None), 0);
    }

    let offset = request.range_start.unwrap_or(0);
    let (status, body) = if !file.honour_range || request.range_start.is_none() {
        (200, file.data.clone())
    } else if offset >= len {
        (416, Vec::new())
    } else {
        (206, file.data[offset as usize..].to_vec())
    };

    let served = file
        .fail_after
        .map_or(body.len(), |limit| limit.min(body.len())) as u64;
    (respond(status, Vec::new(), body, file.fail_after), served)
}

fn respond(
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    fail_after: Option<usize>,
) -> HttpResponse {
    HttpResponse {
        status,
        headers,
        body: Box::new(BrokenStream {
            inner: Cursor::new(body),
            remaining: fail_after,
        }),
    }
}

/// Reader that errors once `remaining` bytes have been handed out.
struct BrokenStream {
    inner: Cursor<Vec<u8>>,
    remaining: Option<usize>,
}

impl Read for BrokenStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.remaining {
            None => self.inner.read(buf),
            Some(0) => Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )),
            Some(left) => {
                let cap = left.min(buf.len());
                let n = self.inner.read(&mut buf[..cap])?;
                if n == 0 {
                    return Ok(0);
                }
                self.remaining = Some(left - n);
                Ok(n)
            }
        }
    }
}
