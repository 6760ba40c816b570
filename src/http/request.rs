/// HTTP methods the server distinguishes.
///
/// Anything outside GET, HEAD and POST is preserved as `Other` and rejected
/// during dispatch with 405 rather than at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    GET,
    HEAD,
    POST,
    Other(String),
}

/// HTTP protocol versions, ordered so that `v > Version::V10` selects the
/// chunked framing used for HTTP/1.1 responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Version {
    V09,
    V10,
    V11,
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub version: Version,
    /// Raw request-URI as received, percent-encoding and query string intact.
    pub url: String,
    /// Header pairs in arrival order. Lookup is case-insensitive and returns
    /// the first match, so duplicates keep their relative order.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Index of the realm that authenticated this request, set by the auth
    /// engine.
    pub realm: Option<usize>,
}

impl Method {
    pub fn from_token(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            "POST" => Method::POST,
            other => Method::Other(other.to_string()),
        }
    }
}

impl Version {
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "HTTP/0.9" => Some(Version::V09),
            "HTTP/1.0" => Some(Version::V10),
            "HTTP/1.1" => Some(Version::V11),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Version::V09 => "HTTP/0.9",
            Version::V10 => "HTTP/1.0",
            Version::V11 => "HTTP/1.1",
        }
    }
}

impl Request {
    /// Returns the first header whose name matches case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_length(&self) -> usize {
        self.header("Content-Length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
}
