//! Infrastructure implementations of the `ContentFetcher` port.

use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::application::ports::ContentFetcher;
use crate::domain::error::FetchError;

/// Per-request bound for HTTP fetches.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches `<base>/<path>` over HTTP(S).
#[derive(Clone)]
pub struct HttpFetcher {
    base: String,
    agent: ureq::Agent,
}

impl HttpFetcher {
    #[must_use]
    pub fn new(base: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("rigup/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            base: base.trim_end_matches('/').to_string(),
            agent,
        }
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }
}

impl ContentFetcher for HttpFetcher {
    async fn fetch_content(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let url = format!("{}/{}", self.base, path.trim_start_matches('/'));
        let agent = self.agent.clone();
        let owned_path = path.to_string();
        tracing::debug!(%url, "fetching");
        tokio::task::spawn_blocking(move || get(&agent, &url, &owned_path))
            .await
            .map_err(|e| FetchError::Transport {
                path: path.to_string(),
                reason: format!("fetch task failed: {e}"),
            })?
    }
}

fn get(agent: &ureq::Agent, url: &str, path: &str) -> Result<Vec<u8>, FetchError> {
    let transport = |reason: String| FetchError::Transport {
        path: path.to_string(),
        reason,
    };
    match agent.get(url).call() {
        Ok(resp) => {
            let mut body = Vec::new();
            resp.into_reader()
                .read_to_end(&mut body)
                .map_err(|e| transport(format!("reading response: {e}")))?;
            Ok(body)
        }
        Err(ureq::Error::Status(404, _)) => Err(FetchError::NotFound {
            path: path.to_string(),
        }),
        Err(ureq::Error::Status(code, _)) => Err(transport(format!("HTTP {code}"))),
        Err(ureq::Error::Transport(t)) => Err(transport(t.to_string())),
    }
}

/// Reads files below a local directory.
#[derive(Debug, Clone)]
pub struct LocalFetcher {
    root: PathBuf,
}

impl LocalFetcher {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `path` below the root, rejecting anything that could escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(path);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe || path.is_empty() {
            return Err(FetchError::Transport {
                path: path.to_string(),
                reason: "path must be relative and stay inside the source directory".to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

impl ContentFetcher for LocalFetcher {
    async fn fetch_content(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let full = self.resolve(path)?;
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::NotFound {
                path: path.to_string(),
            }),
            Err(e) => Err(FetchError::Transport {
                path: path.to_string(),
                reason: format!("cannot read {}: {e}", full.display()),
            }),
        }
    }
}

/// The fetcher selected from configuration.
#[derive(Clone)]
pub enum SourceFetcher {
    Http(HttpFetcher),
    Local(LocalFetcher),
}

impl SourceFetcher {
    /// Interpret `location` as an http(s) URL or a directory path.
    #[must_use]
    pub fn from_location(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Http(HttpFetcher::new(location))
        } else {
            Self::Local(LocalFetcher::new(location))
        }
    }

    /// Human-readable source location.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Http(f) => f.base().to_string(),
            Self::Local(f) => f.root().display().to_string(),
        }
    }
}

impl ContentFetcher for SourceFetcher {
    async fn fetch_content(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        match self {
            Self::Http(f) => f.fetch_content(path).await,
            Self::Local(f) => f.fetch_content(path).await,
        }
    }
}
