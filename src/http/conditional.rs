//! Conditional-request evaluation and entity-tag construction.

use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::http::request::{Method, Request};

/// Outcome of evaluating the conditional headers of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Serve the entity normally.
    Pass,
    /// Answer 304 Not Modified.
    NotModified,
    /// Answer 412 Precondition Failed.
    Failed,
}

/// Builds the weak entity tag `"<hex-inode>-<hex-size>-<hex-mtime>"`.
pub fn entity_tag(stat: &Metadata) -> String {
    format!(
        "\"{:x}-{:x}-{:x}\"",
        stat.ino(),
        stat.size(),
        stat.mtime() as u64
    )
}

/// Modification time as a `SystemTime` with second precision, matching the
/// resolution of HTTP dates.
pub fn modified_time(stat: &Metadata) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(stat.mtime() as u64)
}

/// Formats a timestamp as an RFC 1123 HTTP date.
pub fn http_date(t: SystemTime) -> String {
    httpdate::fmt_http_date(t)
}

/// Parses an HTTP date; anything unparsable collapses to the epoch, which
/// makes a garbled If-Modified-Since ineffective and a garbled
/// If-Unmodified-Since fail.
pub fn parse_date(s: &str) -> SystemTime {
    httpdate::parse_http_date(s).unwrap_or(UNIX_EPOCH)
}

/// Evaluates the conditional headers against the entity metadata.
///
/// Headers are checked in a fixed order and the first failing one decides
/// the response; later headers are not consulted.
pub fn evaluate(req: &Request, stat: &Metadata) -> Precondition {
    let tag = entity_tag(stat);
    let modified = modified_time(stat);

    // Legacy evaluation order: If-Modified-Since runs before If-Match, the
    // reverse of the RFC 2616 precedence. Kept for compatibility.
    if let Some(h) = req.header("If-Modified-Since") {
        if parse_date(h) >= modified {
            return Precondition::NotModified;
        }
    }

    if let Some(h) = req.header("If-Match") {
        if !tag_list_matches(h, &tag) {
            return Precondition::Failed;
        }
    }

    // Ranges are unsupported; any If-Range fails the request outright.
    if req.header("If-Range").is_some() {
        return Precondition::Failed;
    }

    if let Some(h) = req.header("If-Unmodified-Since") {
        if parse_date(h) <= modified {
            return Precondition::Failed;
        }
    }

    if let Some(h) = req.header("If-None-Match") {
        if tag_list_matches(h, &tag) {
            return if matches!(req.method, Method::GET | Method::HEAD) {
                Precondition::NotModified
            } else {
                Precondition::Failed
            };
        }
    }

    Precondition::Pass
}

/// Splits an entity-tag list on commas and spaces; `*` matches anything.
fn tag_list_matches(list: &str, tag: &str) -> bool {
    list.split([',', ' '])
        .filter(|t| !t.is_empty())
        .any(|t| t == "*" || t == tag)
}
