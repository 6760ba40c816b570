//! Request-URI to filesystem path resolution.
//!
//! A URL is split from its query string, percent-decoded, prefixed with the
//! document root, and then canonicalized by walking candidate prefixes from
//! longest to shortest at `/` boundaries. The first prefix that exists on
//! disk and is world-readable wins; whatever follows it is kept as residual
//! path info. The canonical result must stay inside the document root or the
//! whole lookup fails.
//!
//! Directories get special treatment: a request without a trailing slash is
//! answered with a redirect, otherwise the configured index files are tried
//! in order before falling back to the directory itself.

use std::ffi::OsStr;
use std::fs::{self, Metadata};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;

use crate::config::Config;
use crate::encode;

const WORLD_READ: u32 = 0o004;

/// A resolved request target.
///
/// Invariant: `phys` always lies inside `root`, and `stat` is the metadata
/// of `phys`.
#[derive(Debug)]
pub struct PathInfo {
    pub root: PathBuf,
    /// Physical path of the file or directory to serve.
    pub phys: PathBuf,
    /// URL-visible path, `phys` minus the document root prefix.
    pub name: String,
    /// Residual URL suffix not matched by the filesystem, kept for CGI.
    pub info: Option<String>,
    /// Query string, verbatim.
    pub query: Option<String>,
    pub stat: Metadata,
}

/// Outcome of a path lookup.
#[derive(Debug)]
pub enum Lookup {
    Found(PathInfo),
    /// The URL names a directory but lacks its trailing slash; the dispatcher
    /// must answer 302 with this location.
    Redirect { location: String },
    NotFound,
}

/// Resolves a raw request-URI against the document root.
pub fn resolve(cfg: &Config, url: &str) -> Lookup {
    let docroot = cfg.static_files.root.as_os_str().as_bytes();

    // Separate the query string; an empty query counts as none.
    let (path_part, query) = match url.find('?') {
        Some(pos) => {
            let q = &url[pos + 1..];
            (&url[..pos], (!q.is_empty()).then(|| q.to_string()))
        }
        None => (url, None),
    };

    let decoded = match encode::url_decode(path_part.as_bytes()) {
        Some(d) if !d.contains(&0) => d,
        _ => return Lookup::NotFound,
    };

    let mut full = Vec::with_capacity(docroot.len() + decoded.len());
    full.extend_from_slice(docroot);
    full.extend_from_slice(&decoded);

    let had_slash = full.last() == Some(&b'/');

    // Walk candidate prefixes from longest to shortest at slash boundaries;
    // adopt the first that canonicalizes to something readable on disk.
    let mut found = None;
    for end in (0..=full.len()).rev() {
        if end < full.len() && full[end] != b'/' {
            continue;
        }

        let candidate = if end == full.len() {
            &full[..]
        } else {
            &full[..end + 1]
        };

        if let Some((phys, stat)) = canonicalize(candidate, cfg.static_files.no_symlinks) {
            found = Some((phys, stat, end));
            break;
        }
    }

    let (mut phys, mut stat, split) = match found {
        Some(f) => f,
        None => return Lookup::NotFound,
    };

    if !within_docroot(&phys, docroot) {
        return Lookup::NotFound;
    }

    let info_bytes = &full[split..];

    if stat.is_file() {
        let Some(name) = utf8(&phys[docroot.len()..]) else {
            return Lookup::NotFound;
        };
        let info = if info_bytes.is_empty() {
            None
        } else {
            match utf8(info_bytes) {
                Some(i) => Some(i),
                None => return Lookup::NotFound,
            }
        };

        return Lookup::Found(PathInfo {
            root: cfg.static_files.root.clone(),
            phys: bytes_to_path(&phys),
            name,
            info,
            query,
            stat,
        });
    }

    // A directory only matches when the whole URL was consumed.
    if stat.is_dir() && info_bytes.is_empty() {
        if phys.last() != Some(&b'/') {
            phys.push(b'/');
        }

        let Some(name) = utf8(&phys[docroot.len()..]) else {
            return Lookup::NotFound;
        };

        if !had_slash {
            let location = match &query {
                Some(q) => format!("{}?{}", name, q),
                None => name,
            };
            return Lookup::Redirect { location };
        }

        // Index fallback: the first configured index file that exists as a
        // regular file replaces the directory.
        for idx in &cfg.static_files.index {
            let mut candidate = phys.clone();
            candidate.extend_from_slice(idx.as_bytes());

            if let Ok(s) = fs::metadata(bytes_to_path(&candidate)) {
                if s.is_file() {
                    phys = candidate;
                    stat = s;
                    break;
                }
            }
        }

        let Some(name) = utf8(&phys[docroot.len()..]) else {
            return Lookup::NotFound;
        };

        return Lookup::Found(PathInfo {
            root: cfg.static_files.root.clone(),
            phys: bytes_to_path(&phys),
            name,
            info: None,
            query,
            stat,
        });
    }

    Lookup::NotFound
}

/// Canonicalizes a candidate path and checks that the result exists and is
/// world-readable.
///
/// With `no_symlinks` the OS realpath is used, so every symlink is resolved
/// before the jail check sees the result. Otherwise the collapse is purely
/// lexical and symlinks are left in place.
fn canonicalize(candidate: &[u8], no_symlinks: bool) -> Option<(Vec<u8>, Metadata)> {
    let resolved = if no_symlinks {
        let real = fs::canonicalize(bytes_to_path(candidate)).ok()?;
        real.into_os_string().as_bytes().to_vec()
    } else {
        normalize(candidate)
    };

    let stat = fs::metadata(bytes_to_path(&resolved)).ok()?;
    if stat.mode() & WORLD_READ == 0 {
        return None;
    }

    Some((resolved, stat))
}

/// Lexically collapses a path: `//` sequences, `/./` segments, and `/x/..`
/// pairs are removed, and a trailing slash is dropped unless the result is
/// the root. No filesystem access.
pub fn normalize(path: &[u8]) -> Vec<u8> {
    let mut src = Vec::new();

    if path.first() != Some(&b'/') {
        if let Ok(cwd) = std::env::current_dir() {
            src.extend_from_slice(cwd.as_os_str().as_bytes());
        }
        src.push(b'/');
    }
    src.extend_from_slice(path);

    let mut out: Vec<u8> = Vec::with_capacity(src.len());
    let mut i = 0;

    while i < src.len() {
        if src[i] == b'/' {
            // skip repeating /
            if src.get(i + 1) == Some(&b'/') {
                i += 1;
                continue;
            }

            if src.get(i + 1) == Some(&b'.') {
                // skip /./
                if matches!(src.get(i + 2), None | Some(&b'/')) {
                    i += 2;
                    continue;
                }

                // collapse /x/../
                if src.get(i + 2) == Some(&b'.') && matches!(src.get(i + 3), None | Some(&b'/')) {
                    while let Some(b) = out.pop() {
                        if b == b'/' {
                            break;
                        }
                    }
                    i += 3;
                    continue;
                }
            }
        }

        out.push(src[i]);
        i += 1;
    }

    if out.len() > 1 && out.last() == Some(&b'/') {
        out.pop();
    }
    if out.is_empty() {
        out.push(b'/');
    }

    out
}

/// The jail check: the canonical path must be the docroot itself or extend
/// it at a path-component boundary.
fn within_docroot(phys: &[u8], docroot: &[u8]) -> bool {
    phys.len() >= docroot.len()
        && &phys[..docroot.len()] == docroot
        && (phys.len() == docroot.len() || phys[docroot.len()] == b'/')
}

fn bytes_to_path(bytes: &[u8]) -> PathBuf {
    PathBuf::from(OsStr::from_bytes(bytes))
}

fn utf8(bytes: &[u8]) -> Option<String> {
    String::from_utf8(bytes.to_vec()).ok()
}
