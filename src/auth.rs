//! HTTP Basic authentication against URL-prefix realms.
//!
//! Realms are registered at startup and scanned in insertion order; the
//! first realm whose path is a case-insensitive prefix of the requested name
//! protects the request. Secrets are either inline (compared as plaintext
//! and as a crypt-style hash) or resolved from a system password database
//! when given as `$p$account`.

use crate::http::request::Request;
use crate::resolver::PathInfo;

/// Source of stored password hashes for `$p$account` credentials.
///
/// The system implementation consults the shadow database first and falls
/// back to passwd; tests substitute an in-memory map.
pub trait PasswordDb {
    fn stored_hash(&self, account: &str) -> Option<String>;
}

/// The real system databases.
pub struct SystemDb;

impl PasswordDb for SystemDb {
    fn stored_hash(&self, account: &str) -> Option<String> {
        if let Some(hash) = system::shadow_hash(account) {
            return Some(hash);
        }

        // passwd fallback; locked and empty entries are unusable
        let user = nix::unistd::User::from_name(account).ok().flatten()?;
        let hash = user.passwd.to_str().ok()?.to_string();
        if hash.is_empty() || hash.starts_with('!') {
            return None;
        }
        Some(hash)
    }
}

/// One protected URL prefix.
#[derive(Debug, Clone)]
pub struct AuthRealm {
    pub path: String,
    pub user: String,
    secret: String,
}

impl AuthRealm {
    /// Whether this realm covers the given URL-visible name.
    fn covers(&self, name: &str) -> bool {
        let path = self.path.as_bytes();
        let name = name.as_bytes();
        name.len() >= path.len() && name[..path.len()].eq_ignore_ascii_case(path)
    }

    /// Verifies a presented password: plaintext equality first, then the
    /// system crypt of the password under the stored value as salt.
    pub fn verify(&self, pass: &str) -> bool {
        if self.secret == pass {
            return true;
        }

        system::crypt(pass, &self.secret)
            .map_or(false, |hashed| hashed == self.secret)
    }
}

/// Insertion-ordered realm table.
#[derive(Debug, Default)]
pub struct AuthTable {
    realms: Vec<AuthRealm>,
}

impl AuthTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a realm. A `pass` of the form `$p$account` is resolved
    /// through the password database; entries that yield no usable secret
    /// are dropped and `false` is returned.
    pub fn add(&mut self, path: &str, user: &str, pass: &str, db: &dyn PasswordDb) -> bool {
        let secret = match pass.strip_prefix("$p$") {
            Some(account) => db.stored_hash(account).unwrap_or_default(),
            None => pass.to_string(),
        };

        if secret.is_empty() {
            return false;
        }

        self.realms.push(AuthRealm {
            path: path.to_string(),
            user: user.to_string(),
            secret,
        });
        true
    }

    /// Gates a resolved request.
    ///
    /// Returns `true` when the path is unprotected or the presented Basic
    /// credentials verify against a realm covering both path and user;
    /// `false` means the dispatcher must send the 401 challenge. The index
    /// of the adopted realm is recorded on the request.
    pub fn check(&self, req: &mut Request, pi: &PathInfo) -> bool {
        let Some(idx) = self.realms.iter().position(|r| r.covers(&pi.name)) else {
            return true;
        };
        req.realm = Some(idx);

        let Some((user, pass)) = basic_credentials(req) else {
            return false;
        };

        for (i, realm) in self.realms.iter().enumerate() {
            if realm.covers(&pi.name) && realm.user == user {
                req.realm = Some(i);
                return realm.verify(&pass);
            }
        }

        false
    }

    pub fn is_empty(&self) -> bool {
        self.realms.is_empty()
    }
}

/// Extracts and decodes `Authorization: Basic` credentials into
/// `(user, pass)`. Undecodable or malformed values count as absent.
fn basic_credentials(req: &Request) -> Option<(String, String)> {
    let value = req.header("Authorization")?;
    let encoded = value.strip_prefix("Basic ")?;

    let decoded = base64::decode(encoded).ok()?;
    let text = String::from_utf8(decoded).ok()?;

    let (user, pass) = text.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Thin unsafe shims over the libc password facilities. Both are only used
/// from the single-threaded runtime, which is what the static result
/// buffers of crypt(3) and getspnam(3) require.
mod system {
    use std::ffi::{CStr, CString};

    #[link(name = "crypt")]
    extern "C" {
        #[link_name = "crypt"]
        fn crypt_ffi(key: *const libc::c_char, salt: *const libc::c_char) -> *mut libc::c_char;
    }

    pub fn crypt(pass: &str, salt: &str) -> Option<String> {
        let pass = CString::new(pass).ok()?;
        let salt = CString::new(salt).ok()?;

        unsafe {
            let out = crypt_ffi(pass.as_ptr(), salt.as_ptr());
            if out.is_null() {
                return None;
            }
            Some(CStr::from_ptr(out).to_string_lossy().into_owned())
        }
    }

    pub fn shadow_hash(account: &str) -> Option<String> {
        let name = CString::new(account).ok()?;

        unsafe {
            let entry = libc::getspnam(name.as_ptr());
            if entry.is_null() || (*entry).sp_pwdp.is_null() {
                return None;
            }
            let hash = CStr::from_ptr((*entry).sp_pwdp).to_string_lossy().into_owned();
            (!hash.is_empty()).then_some(hash)
        }
    }
}
