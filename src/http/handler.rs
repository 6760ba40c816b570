//! Static file and directory-index responses.

use std::fs::Metadata;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::time::SystemTime;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::config::Config;
use crate::encode;
use crate::http::conditional::{self, Precondition};
use crate::http::io::HttpStream;
use crate::http::mime;
use crate::http::request::{Method, Request, Version};
use crate::http::response::StatusCode;
use crate::resolver::PathInfo;

/// Read size for streaming file bodies.
const BUFFER_SIZE: usize = 8192;

const WORLD_READ: u32 = 0o004;
const WORLD_EXEC: u32 = 0o001;

/// Serves a resolved path: a regular file is streamed (after precondition
/// checks), a directory is rendered as an HTML listing when listings are
/// enabled, and everything else is answered with 403.
///
/// Returns the status code that was sent, for request logging.
pub async fn serve<S: AsyncRead + AsyncWrite + Unpin>(
    io: &mut HttpStream<S>,
    cfg: &Config,
    req: &Request,
    pi: &PathInfo,
) -> io::Result<u16> {
    if pi.stat.is_file() {
        if let Ok(file) = File::open(&pi.phys).await {
            return serve_file(io, req, pi, file).await;
        }
    } else if pi.stat.is_dir() && !cfg.static_files.no_dirlists {
        return serve_dirlist(io, req, pi).await;
    }

    io.send_error(StatusCode::Forbidden, "Access to this resource is forbidden")
        .await?;
    Ok(403)
}

async fn serve_file<S: AsyncRead + AsyncWrite + Unpin>(
    io: &mut HttpStream<S>,
    req: &Request,
    pi: &PathInfo,
    mut file: File,
) -> io::Result<u16> {
    match conditional::evaluate(req, &pi.stat) {
        Precondition::Pass => {}

        Precondition::NotModified => {
            send_status(io, req.version, StatusCode::NotModified).await?;
            send_ok_headers(io, Some(&pi.stat)).await?;
            io.send(b"\r\n").await?;
            return Ok(304);
        }

        Precondition::Failed => {
            send_status(io, req.version, StatusCode::PreconditionFailed).await?;
            io.send(b"Connection: close\r\n\r\n").await?;
            return Ok(412);
        }
    }

    send_status(io, req.version, StatusCode::Ok).await?;
    send_ok_headers(io, Some(&pi.stat)).await?;

    io.send(format!("Content-Type: {}\r\n", mime::content_type(&pi.name)).as_bytes())
        .await?;
    io.send(format!("Content-Length: {}\r\n", pi.stat.len()).as_bytes())
        .await?;

    let head_only = req.method == Method::HEAD;

    // HTTP/1.1 responses are chunked, except for HEAD where no body follows.
    if req.version > Version::V10 && !head_only {
        io.send(b"Transfer-Encoding: chunked\r\n").await?;
    }

    io.send(b"\r\n").await?;

    if head_only {
        return Ok(200);
    }

    let mut buf = [0u8; BUFFER_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        io.send_body(req.version, &buf[..n]).await?;
    }

    // Terminates the chunked stream; a no-op for HTTP/1.0.
    io.send_body(req.version, b"").await?;
    Ok(200)
}

/// Renders the directory listing in two passes: world-executable
/// subdirectories first, then world-readable files, each pass in byte-wise
/// alphabetical order.
async fn serve_dirlist<S: AsyncRead + AsyncWrite + Unpin>(
    io: &mut HttpStream<S>,
    req: &Request,
    pi: &PathInfo,
) -> io::Result<u16> {
    send_status(io, req.version, StatusCode::Ok).await?;
    send_ok_headers(io, None).await?;

    if req.version > Version::V10 {
        io.send(b"Transfer-Encoding: chunked\r\n").await?;
    }
    io.send(b"Content-Type: text/html\r\n\r\n").await?;

    io.send_body(
        req.version,
        format!(
            "<html><head><title>Index of {0}</title></head>\
             <body><h1>Index of {0}</h1><hr /><ol>",
            pi.name
        )
        .as_bytes(),
    )
    .await?;

    // read_dir skips the dot entries, so the parent link is put back by hand.
    let mut entries = Vec::new();
    if pi.phys.parent().is_some() {
        entries.push("..".to_string());
    }
    if let Ok(dir) = std::fs::read_dir(&pi.phys) {
        for entry in dir.flatten() {
            entries.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    entries.sort();

    for entry in &entries {
        let Ok(stat) = std::fs::metadata(pi.phys.join(entry)) else {
            continue;
        };

        if stat.is_dir() && stat.mode() & WORLD_EXEC != 0 {
            io.send_body(req.version, dir_row(pi, entry, &stat).as_bytes())
                .await?;
        }
    }

    for entry in &entries {
        let Ok(stat) = std::fs::metadata(pi.phys.join(entry)) else {
            continue;
        };

        if !stat.is_dir() && stat.mode() & WORLD_READ != 0 {
            io.send_body(req.version, file_row(pi, entry, &stat).as_bytes())
                .await?;
        }
    }

    io.send_body(req.version, b"</ol><hr /></body></html>").await?;
    io.send_body(req.version, b"").await?;
    Ok(200)
}

fn dir_row(pi: &PathInfo, entry: &str, stat: &Metadata) -> String {
    format!(
        "<li><strong><a href='{}{}'>{}</a>/</strong><br />\
         <small>modified: {}<br />directory - {:.2} kbyte<br /><br /></small></li>",
        pi.name,
        encode::url_encode(entry.as_bytes()),
        entry,
        conditional::http_date(conditional::modified_time(stat)),
        stat.len() as f64 / 1024.0
    )
}

fn file_row(pi: &PathInfo, entry: &str, stat: &Metadata) -> String {
    format!(
        "<li><strong><a href='{}{}'>{}</a></strong><br />\
         <small>modified: {}<br />{} - {:.2} kbyte<br /><br /></small></li>",
        pi.name,
        encode::url_encode(entry.as_bytes()),
        entry,
        conditional::http_date(conditional::modified_time(stat)),
        mime::content_type(entry),
        stat.len() as f64 / 1024.0
    )
}

async fn send_status<S: AsyncRead + AsyncWrite + Unpin>(
    io: &mut HttpStream<S>,
    version: Version,
    status: StatusCode,
) -> io::Result<()> {
    io.send(
        format!(
            "{} {} {}\r\n",
            version.as_str(),
            status.as_u16(),
            status.reason_phrase()
        )
        .as_bytes(),
    )
    .await
}

/// Common headers of 200 and 304 responses. The validator headers are only
/// present when entity metadata is (directory listings carry none).
async fn send_ok_headers<S: AsyncRead + AsyncWrite + Unpin>(
    io: &mut HttpStream<S>,
    stat: Option<&Metadata>,
) -> io::Result<()> {
    io.send(b"Connection: close\r\n").await?;

    if let Some(stat) = stat {
        io.send(format!("ETag: {}\r\n", conditional::entity_tag(stat)).as_bytes())
            .await?;
        io.send(
            format!(
                "Last-Modified: {}\r\n",
                conditional::http_date(conditional::modified_time(stat))
            )
            .as_bytes(),
        )
        .await?;
    }

    io.send(format!("Date: {}\r\n", conditional::http_date(SystemTime::now())).as_bytes())
        .await
}
