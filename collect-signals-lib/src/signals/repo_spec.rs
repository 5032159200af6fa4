use crate::Result;
use core::fmt::{Display, Formatter};
use core::str::FromStr;
use ohno::{IntoAppError, bail};
use std::sync::Arc;
use url::Url;

/// Resolved identity of a project repository.
///
/// The identity is immutable and compared only by its canonical form
/// `scheme://host/owner/repo`; trailing `.git` and deeper paths are dropped during
/// parsing so that different links to the same project compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoSpec {
    canonical: Arc<str>,
    host: Arc<str>,
    owner: Arc<str>,
    repo: Arc<str>,
}

impl RepoSpec {
    /// Parse a repository URL.
    ///
    /// # Errors
    ///
    /// Fails when the URL lacks a host or an `owner/repo` path.
    pub fn parse(url: &Url) -> Result<Self> {
        let Some(host) = url.host_str().filter(|h| !h.is_empty()) else {
            bail!("repository URL has no host: {url}");
        };

        let mut segments = url.path_segments().into_iter().flatten();
        let owner = segments.next().unwrap_or_default();
        let repo = segments.next().unwrap_or_default().trim_end_matches(".git");

        if owner.is_empty() || repo.is_empty() {
            bail!("repository URL must name an owner and a repository: {url}");
        }

        let host = host.to_ascii_lowercase();
        let canonical = format!("{}://{host}/{owner}/{repo}", url.scheme());

        Ok(Self {
            canonical: Arc::from(canonical),
            host: Arc::from(host),
            owner: Arc::from(owner),
            repo: Arc::from(repo),
        })
    }

    /// The canonical string form used for equality and output.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// `owner/repo`, the form used by hosting APIs and search queries.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoSpec {
    type Err = ohno::AppError;

    fn from_str(s: &str) -> Result<Self> {
        let url = Url::parse(s.trim()).into_app_err_with(|| format!("invalid repository URL '{s}'"))?;
        Self::parse(&url)
    }
}

impl Display for RepoSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.canonical)
    }
}
