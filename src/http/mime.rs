/// Ordered extension-to-MIME table. Earlier entries win, and multi-part
/// extensions like `tar.gz` must appear before their suffixes.
pub type MimeTable = &'static [(&'static str, &'static str)];

pub const MIME_TYPES: MimeTable = &[
    ("txt", "text/plain"),
    ("log", "text/plain"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "text/javascript"),
    ("json", "application/json"),
    ("xml", "text/xml"),
    ("svg", "image/svg+xml"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("ico", "image/x-icon"),
    ("pdf", "application/pdf"),
    ("tar.gz", "application/x-gtar-compressed"),
    ("tgz", "application/x-gtar-compressed"),
    ("gz", "application/x-gzip"),
    ("tar", "application/x-tar"),
    ("zip", "application/zip"),
    ("mp3", "audio/mpeg"),
    ("ogg", "audio/x-ogg"),
    ("wav", "audio/x-wav"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("bin", "application/octet-stream"),
];

/// Looks up the MIME type for a path against an ordered table.
///
/// For each table entry the path is scanned right to left; at every `.` or
/// `/` boundary the remaining suffix is compared case-insensitively against
/// the entry's extension. Unknown extensions fall back to
/// `application/octet-stream`.
pub fn lookup(table: MimeTable, path: &str) -> &'static str {
    let bytes = path.as_bytes();

    for (extn, mime) in table {
        for i in (0..bytes.len()).rev() {
            if (bytes[i] == b'.' || bytes[i] == b'/')
                && bytes[i + 1..].eq_ignore_ascii_case(extn.as_bytes())
            {
                return mime;
            }
        }
    }

    "application/octet-stream"
}

/// MIME lookup against the built-in table.
pub fn content_type(path: &str) -> &'static str {
    lookup(MIME_TYPES, path)
}
