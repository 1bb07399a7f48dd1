use url::Url;

use crate::error::{Result, SandboxError};

const ALLOWED_SCHEMES: [&str; 4] = ["https", "http", "ssh", "git"];

/// A repository URL reduced to its `/owner/repo` root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocation {
    /// URL handed to `git clone`.
    pub clone_url: String,
    /// `/owner/repo`, used to name the sandbox directory.
    pub path: String,
}

/// Reduce a repository page URL to something `git clone` accepts.
///
/// Drops query and fragment and keeps the first two path segments, so
/// `https://github.com/owner/repo/tree/main?x=1` becomes
/// `https://github.com/owner/repo`.
pub fn normalize_repo_url(raw: &str) -> Result<RepoLocation> {
    let invalid = |reason: &str| SandboxError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let mut url = Url::parse(raw).map_err(|err| invalid(&err.to_string()))?;
    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(invalid("unsupported scheme"));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }

    let mut segments = url
        .path_segments()
        .into_iter()
        .flatten()
        .filter(|segment| !segment.is_empty());
    let (owner, repo) = match (segments.next(), segments.next()) {
        (Some(owner), Some(repo)) => (owner.to_string(), repo.to_string()),
        _ => return Err(invalid("expected /owner/repo path")),
    };

    let path = format!("/{owner}/{repo}");
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);

    Ok(RepoLocation {
        clone_url: url.to_string(),
        path,
    })
}
