use crate::error::{ForgeError, Result};
use git2::{Cred, RemoteCallbacks};
use std::fmt;
use std::path::PathBuf;

/// libgit2 keeps asking while credentials are rejected; stop after this many.
const MAX_AUTH_ATTEMPTS: u32 = 3;

/// Authentication material for clone and push
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Private key file; the user comes from the URL, falling back to `git`
    Ssh { key_path: PathBuf },
    /// Basic auth with a personal access token
    Http { username: String, token: String },
}

impl Credentials {
    /// Pick the auth method from the URL scheme: `http(s)` uses the token,
    /// anything else the SSH key.
    pub fn for_url(
        url: &str,
        ssh_key_path: Option<&str>,
        username: Option<&str>,
        token: Option<&str>,
    ) -> Result<Self> {
        if url.starts_with("http") {
            let username = username.filter(|s| !s.is_empty()).ok_or_else(|| {
                ForgeError::config("git_username is required for http(s) clone URLs")
            })?;
            let token = token.filter(|s| !s.is_empty()).ok_or_else(|| {
                ForgeError::config("git_access_token is required for http(s) clone URLs")
            })?;
            Ok(Credentials::Http {
                username: username.to_string(),
                token: token.to_string(),
            })
        } else {
            let key_path = ssh_key_path.filter(|s| !s.is_empty()).ok_or_else(|| {
                ForgeError::config("ssh_key_save_path is required for ssh clone URLs")
            })?;
            let key_path = PathBuf::from(key_path);
            if !key_path.is_file() {
                return Err(ForgeError::config(format!(
                    "SSH key not found: {}",
                    key_path.display()
                )));
            }
            Ok(Credentials::Ssh { key_path })
        }
    }

    /// Callbacks answering libgit2's credential requests.
    pub fn remote_callbacks(&self) -> RemoteCallbacks<'_> {
        let mut callbacks = RemoteCallbacks::new();
        let mut attempts = 0;
        callbacks.credentials(move |_url, username_from_url, _allowed_types| {
            attempts += 1;
            if attempts > MAX_AUTH_ATTEMPTS {
                return Err(git2::Error::from_str("authentication failed"));
            }
            match self {
                Credentials::Ssh { key_path } => {
                    Cred::ssh_key(username_from_url.unwrap_or("git"), None, key_path, None)
                }
                Credentials::Http { username, token } => Cred::userpass_plaintext(username, token),
            }
        });
        callbacks
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Ssh { key_path } => f
                .debug_struct("Ssh")
                .field("key_path", key_path)
                .finish(),
            Credentials::Http { username, .. } => f
                .debug_struct("Http")
                .field("username", username)
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Ssh { key_path } => write!(f, "ssh key {}", key_path.display()),
            Credentials::Http { username, .. } => write!(f, "http token for {}", username),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_http_url_uses_token() {
        let creds = Credentials::for_url(
            "https://github.com/acme/app.git",
            None,
            Some("ci-bot"),
            Some("s3cret"),
        )
        .unwrap();
        assert_eq!(
            creds,
            Credentials::Http {
                username: "ci-bot".to_string(),
                token: "s3cret".to_string()
            }
        );
    }

    #[test]
    fn test_http_url_requires_token() {
        let err = Credentials::for_url("https://h/r.git", None, Some("ci-bot"), Some(""))
            .unwrap_err();
        assert!(err.to_string().contains("git_access_token"));
    }

    #[test]
    fn test_ssh_url_uses_key() {
        let key = NamedTempFile::new().unwrap();
        let creds = Credentials::for_url(
            "git@github.com:acme/app.git",
            key.path().to_str(),
            None,
            None,
        )
        .unwrap();
        assert!(matches!(creds, Credentials::Ssh { .. }));
    }

    #[test]
    fn test_ssh_key_must_exist() {
        let err = Credentials::for_url(
            "git@github.com:acme/app.git",
            Some("/definitely/not/here/id_rsa"),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ForgeError::Config(_)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let creds = Credentials::Http {
            username: "ci-bot".to_string(),
            token: "s3cret".to_string(),
        };
        let shown = format!("{:?} {}", creds, creds);
        assert!(!shown.contains("s3cret"));
        assert!(shown.contains("ci-bot"));
    }
}
