use crate::CoreError;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const NET_FILE: &str = "algod.net";
pub const TOKEN_FILE: &str = "algod.token";
pub const ADMIN_TOKEN_FILE: &str = "algod.admin.token";

/// Connection inputs as supplied on the command line or environment.
#[derive(Debug, Clone, Default)]
pub struct ConnectionArgs {
    pub url: Option<String>,
    pub token: Option<String>,
    pub admin_token: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl ConnectionArgs {
    #[must_use]
    pub fn from_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Self::default()
        }
    }
}

/// A fully resolved way to reach a node's REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConnectionConfig {
    pub rest_url: String,
    pub api_token: String,
    pub admin_token: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl NodeConnectionConfig {
    /// Resolve a connection from explicit URL/token or from a node data directory.
    ///
    /// Returns `Ok(None)` when nothing usable was supplied, which means the
    /// installer should run instead.
    ///
    /// # Errors
    /// Returns `CoreError` when a data directory was given but its credential
    /// files cannot be read.
    pub fn resolve(args: &ConnectionArgs) -> Result<Option<Self>, CoreError> {
        let mut url = non_empty(args.url.as_deref());
        let mut token = non_empty(args.token.as_deref());
        let mut admin_token = non_empty(args.admin_token.as_deref());
        let mut data_dir = args.data_dir.clone();

        if data_dir.is_some() && (url.is_some() || token.is_some()) {
            warn!("Ignoring ALGORAND_DATA/-d in favor of -u/-t");
            data_dir = None;
        }

        if let Some(dir) = data_dir.as_deref() {
            url = Some(read_credential(dir, NET_FILE, "URL")?);
            token = Some(read_credential(dir, TOKEN_FILE, "token")?);
            admin_token = read_optional_credential(dir, ADMIN_TOKEN_FILE)?;
            info!("Resolved node connection from {}", dir.display());
        }

        let (Some(url), Some(token)) = (url, token) else {
            return Ok(None);
        };

        Ok(Some(Self {
            rest_url: with_scheme(&url),
            api_token: token,
            admin_token,
            data_dir,
        }))
    }

    #[must_use]
    pub fn can_administer(&self) -> bool {
        self.admin_token.is_some()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn with_scheme(url: &str) -> String {
    if url.starts_with("http") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

fn read_credential(dir: &Path, file: &str, what: &'static str) -> Result<String, CoreError> {
    let path = dir.join(file);
    let contents = std::fs::read_to_string(&path).map_err(|source| CoreError::CredentialFile {
        what,
        path: path.clone(),
        source,
    })?;
    non_empty(Some(&contents)).ok_or(CoreError::EmptyCredential(path))
}

fn read_optional_credential(dir: &Path, file: &str) -> Result<Option<String>, CoreError> {
    let path = dir.join(file);
    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(non_empty(Some(&contents))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(CoreError::CredentialFile {
            what: "admin token",
            path,
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_data_dir(dir: &Path, admin: bool) {
        std::fs::write(dir.join(NET_FILE), "127.0.0.1:8080\n").unwrap();
        std::fs::write(dir.join(TOKEN_FILE), "tok").unwrap();
        if admin {
            std::fs::write(dir.join(ADMIN_TOKEN_FILE), "admin\n").unwrap();
        }
    }

    #[test]
    fn test_explicit_values_win_over_data_dir() {
        let args = ConnectionArgs {
            url: Some("localhost:1".into()),
            token: Some("abc".into()),
            admin_token: None,
            data_dir: Some(PathBuf::from("/tmp/x")),
        };

        let config = NodeConnectionConfig::resolve(&args).unwrap().unwrap();
        assert_eq!(config.rest_url, "http://localhost:1");
        assert_eq!(config.api_token, "abc");
        assert_eq!(config.data_dir, None);
        assert!(!config.can_administer());
    }

    #[test]
    fn test_resolve_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_data_dir(dir.path(), true);

        let args = ConnectionArgs::from_data_dir(dir.path());
        let config = NodeConnectionConfig::resolve(&args).unwrap().unwrap();
        assert_eq!(config.rest_url, "http://127.0.0.1:8080");
        assert_eq!(config.api_token, "tok");
        assert_eq!(config.admin_token.as_deref(), Some("admin"));
        assert_eq!(config.data_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_admin_token_file_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        write_data_dir(dir.path(), false);

        let config = NodeConnectionConfig::resolve(&ConnectionArgs::from_data_dir(dir.path()))
            .unwrap()
            .unwrap();
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_missing_net_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = NodeConnectionConfig::resolve(&ConnectionArgs::from_data_dir(dir.path()))
            .unwrap_err();
        assert!(matches!(err, CoreError::CredentialFile { what: "URL", .. }));
    }

    #[test]
    fn test_nothing_supplied_means_installer() {
        assert!(
            NodeConnectionConfig::resolve(&ConnectionArgs::default())
                .unwrap()
                .is_none()
        );

        let url_only = ConnectionArgs {
            url: Some("localhost:1".into()),
            ..ConnectionArgs::default()
        };
        assert!(NodeConnectionConfig::resolve(&url_only).unwrap().is_none());
    }

    #[test]
    fn test_https_url_is_kept() {
        let args = ConnectionArgs {
            url: Some("https://node.example.com".into()),
            token: Some("t".into()),
            ..ConnectionArgs::default()
        };
        let config = NodeConnectionConfig::resolve(&args).unwrap().unwrap();
        assert_eq!(config.rest_url, "https://node.example.com");
    }
}
