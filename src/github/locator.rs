//! Identity wrappers and repository addressing for the GitHub layer.

use url::Url;

use super::error::RemoteError;

/// Repository owner wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    pub(crate) fn new(value: &str) -> Result<Self, RemoteError> {
        if value.is_empty() {
            return Err(RemoteError::MissingPathSegments);
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName(String);

impl RepositoryName {
    pub(crate) fn new(value: &str) -> Result<Self, RemoteError> {
        if value.is_empty() {
            return Err(RemoteError::MissingPathSegments);
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Personal access token wrapper enforcing presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::MissingToken`] when the supplied string is
    /// blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, RemoteError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(RemoteError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

/// Identifies one repository on one GitHub instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocator {
    owner: RepositoryOwner,
    repository: RepositoryName,
    api_base: Url,
}

impl RepositoryLocator {
    /// Creates a locator for a `github.com` repository.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::MissingPathSegments`] when owner or repository
    /// is empty.
    pub fn from_owner_repo(owner: &str, repository: &str) -> Result<Self, RemoteError> {
        let api_base = Url::parse("https://api.github.com")
            .map_err(|error| RemoteError::InvalidUrl(error.to_string()))?;
        Ok(Self {
            owner: RepositoryOwner::new(owner)?,
            repository: RepositoryName::new(repository)?,
            api_base,
        })
    }

    /// Parses a locator from a repository URL such as
    /// `https://github.com/owner/repo`.
    ///
    /// Non-`github.com` hosts are treated as GitHub Enterprise instances and
    /// use the `/api/v3` base path.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidUrl`] when the URL cannot be parsed and
    /// [`RemoteError::MissingPathSegments`] when owner or repository is
    /// absent.
    pub fn parse(repository_url: &str) -> Result<Self, RemoteError> {
        let parsed =
            Url::parse(repository_url).map_err(|error| RemoteError::InvalidUrl(error.to_string()))?;

        let mut segments = parsed
            .path_segments()
            .ok_or(RemoteError::MissingPathSegments)?
            .filter(|segment| !segment.is_empty());
        let owner = segments.next().ok_or(RemoteError::MissingPathSegments)?;
        let repository = segments.next().ok_or(RemoteError::MissingPathSegments)?;

        let api_base = derive_api_base(&parsed)?;
        Ok(Self {
            owner: RepositoryOwner::new(owner)?,
            repository: RepositoryName::new(repository)?,
            api_base,
        })
    }

    /// API base URL for this repository's GitHub instance.
    #[must_use]
    pub const fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    /// Returns the API path for listing pull requests.
    pub(crate) fn pulls_path(&self) -> String {
        format!(
            "/repos/{}/{}/pulls",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }

    /// Returns the API path for listing one pull request's reviews.
    pub(crate) fn reviews_path(&self, pull_request_number: u64) -> String {
        format!(
            "/repos/{}/{}/pulls/{pull_request_number}/reviews",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }
}

/// Derives the GitHub API base URL from a repository URL.
fn derive_api_base(parsed: &Url) -> Result<Url, RemoteError> {
    let host = parsed.host_str().ok_or(RemoteError::MissingPathSegments)?;

    if host.eq_ignore_ascii_case("github.com") {
        return Url::parse("https://api.github.com")
            .map_err(|error| RemoteError::InvalidUrl(error.to_string()));
    }

    let authority = if host.contains(':') {
        format!("[{host}]")
    } else {
        host.to_owned()
    };
    let mut api_url = Url::parse(&format!("{scheme}://{authority}", scheme = parsed.scheme()))
        .map_err(|error| RemoteError::InvalidUrl(error.to_string()))?;
    api_url
        .set_port(parsed.port())
        .map_err(|()| RemoteError::InvalidUrl("invalid port".to_owned()))?;
    api_url.set_path("api/v3");
    Ok(api_url)
}
