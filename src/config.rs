use std::ffi::OsString;
use std::os::unix::ffi::OsStringExt;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Upper bound in seconds for every single network read or write.
    pub network_timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Document root; must be absolute.
    pub root: PathBuf,
    /// Index files tried in order when a directory is requested.
    pub index: Vec<String>,
    /// Resolve paths with realpath and refuse anything a symlink escapes through.
    pub no_symlinks: bool,
    /// Answer directory requests without an index file with 403 instead of a listing.
    pub no_dirlists: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Realm name presented in the Basic authentication challenge.
    pub realm: String,
    pub credentials: Vec<Credential>,
}

/// One protected URL prefix. A `pass` of the form `$p$account` refers to a
/// system password database entry instead of an inline secret.
#[derive(Debug, Clone, Deserialize)]
pub struct Credential {
    pub path: String,
    pub user: String,
    pub pass: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            network_timeout: 30,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/var/www"),
            index: vec!["index.html".to_string()],
            no_symlinks: false,
            no_dirlists: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            realm: "Protected Area".to_string(),
            credentials: Vec::new(),
        }
    }
}

impl Config {
    /// Loads `config.yaml` from the working directory when present, then
    /// applies `LISTEN` and `DOCROOT` environment overrides.
    pub fn load() -> Self {
        let mut cfg: Config = std::fs::read_to_string("config.yaml")
            .ok()
            .and_then(|text| match serde_yaml::from_str(&text) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring unparsable config.yaml");
                    None
                }
            })
            .unwrap_or_default();

        if let Ok(addr) = std::env::var("LISTEN") {
            cfg.server.listen_addr = addr;
        }
        if let Ok(root) = std::env::var("DOCROOT") {
            cfg.static_files.root = PathBuf::from(root);
        }

        cfg.static_files.root = strip_trailing_slash(cfg.static_files.root);
        cfg
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.static_files.root.is_absolute() {
            anyhow::bail!("document root must be an absolute path");
        }
        if self.server.network_timeout == 0 {
            anyhow::bail!("network timeout must be at least one second");
        }
        Ok(())
    }
}

/// The resolver concatenates the docroot with URL paths that always begin with
/// a slash, so the stored root must not end in one.
fn strip_trailing_slash(root: PathBuf) -> PathBuf {
    let mut bytes = root.into_os_string().into_vec();
    while bytes.len() > 1 && bytes.last() == Some(&b'/') {
        bytes.pop();
    }
    PathBuf::from(OsString::from_vec(bytes))
}
