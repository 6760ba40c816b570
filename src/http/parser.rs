use crate::http::request::{Method, Request, Version};

/// Ways a buffered request can fail to parse.
#[derive(Debug)]
pub enum ParseError {
    /// Request line does not have the expected shape
    InvalidRequest,
    /// Version token is not one of HTTP/0.9, 1.0 or 1.1
    InvalidVersion,
    /// A header line has no colon separator
    InvalidHeader,
    /// Content-Length is not a number
    InvalidContentLength,
    /// More bytes are needed before a verdict is possible
    Incomplete,
}

/// Parses one HTTP request out of `buf`.
///
/// The buffer is everything received so far; the caller keeps appending
/// bytes and retrying until the outcome is something other than
/// [`ParseError::Incomplete`]. On success the number of consumed bytes is
/// returned alongside the request so the caller can drain its buffer.
///
/// Two quirks of the wire format are handled here rather than downstream:
/// a request line with no version token is the HTTP/0.9 simple form, and
/// methods outside GET/HEAD/POST survive parsing as [`Method::Other`] so
/// the dispatcher can answer 405 instead of dropping the connection.
/// Header pairs keep their arrival order, and the body length comes from
/// Content-Length, defaulting to zero.
pub fn parse_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    // Nothing can be decided until the blank line ending the head is in.
    let head_end = find_blank_line(buf).ok_or(ParseError::Incomplete)?;
    let body_bytes = &buf[head_end + 4..];

    let head = std::str::from_utf8(&buf[..head_end])
        .map_err(|_| ParseError::InvalidRequest)?;

    let mut lines = head.split("\r\n");
    let mut parts = lines
        .next()
        .ok_or(ParseError::InvalidRequest)?
        .split_whitespace();

    let method = Method::from_token(parts.next().ok_or(ParseError::InvalidRequest)?);
    let url = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = match parts.next() {
        Some(token) => Version::from_token(token).ok_or(ParseError::InvalidVersion)?,
        // bare "METHOD /path" simple form
        None => Version::V09,
    };

    let mut headers = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (name, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    let content_length = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("Content-Length"))
        .map(|(_, v)| v.parse::<usize>().map_err(|_| ParseError::InvalidContentLength))
        .transpose()?
        .unwrap_or(0);

    if body_bytes.len() < content_length {
        return Err(ParseError::Incomplete);
    }

    let request = Request {
        method,
        version,
        url: url.to_string(),
        headers,
        body: body_bytes[..content_length].to_vec(),
        realm: None,
    };

    Ok((request, head_end + 4 + content_length))
}

fn find_blank_line(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}
