use std::str::FromStr;

use http::Uri;

use crate::semver::Version;

/// A reference to the commit that introduced a change, as it appears at the
/// end of a changelog bullet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommitRef {
    /// The abbreviated object name, 7 to 40 hex characters.
    pub short_hash: String,
    pub url: Option<String>,
}

impl CommitRef {
    #[must_use]
    pub fn looks_like_hash(text: &str) -> bool {
        (7..=40).contains(&text.len()) && text.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Looser than [`Self::looks_like_hash`]: accepts over-abbreviated
    /// hashes so the linter can parse and then flag them.
    #[must_use]
    pub(crate) fn plausible_hash(text: &str) -> bool {
        (4..=40).contains(&text.len()) && text.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

/// A reference to the issue a change closes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IssueRef {
    pub number: u64,
    pub url: Option<String>,
}

/// The link a release header carries: either a comparison between the
/// previous tag and this release's tag, or a plain tag link for the first
/// recorded release.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompareLink {
    pub from_tag: Option<String>,
    pub to_tag: String,
    pub url: String,
}

impl CompareLink {
    /// Recover the tag pair from a forge URL, e.g.
    /// `…/compare/v1.3.2...v1.4.0` or `…/releases/tag/v0.1.0`.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        let last_segment = url.rsplit('/').next().unwrap_or(url);
        match last_segment.split_once("...") {
            Some((from, to)) => Self {
                from_tag: Some(from.to_string()),
                to_tag: to.to_string(),
                url: url.to_string(),
            },
            None => Self {
                from_tag: None,
                to_tag: last_segment.to_string(),
                url: url.to_string(),
            },
        }
    }

    /// Whether the right-hand tag names `version`.
    #[must_use]
    pub fn points_at(&self, version: &Version) -> bool {
        let tag = self.to_tag.strip_prefix('v').unwrap_or(&self.to_tag);
        version.to_string() == tag
    }
}

/// Builds forge URLs from a repository base URL, the way GitHub-style
/// forges lay them out.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RepoUrls {
    base: String,
}

impl RepoUrls {
    #[must_use]
    pub fn new(repository: &str) -> Self {
        Self {
            base: repository.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn commit(&self, short_hash: &str) -> String {
        format!("{base}/commit/{short_hash}", base = self.base)
    }

    #[must_use]
    pub fn issue(&self, number: u64) -> String {
        format!("{base}/issues/{number}", base = self.base)
    }

    #[must_use]
    pub fn compare(&self, previous: Option<&Version>, version: &Version) -> CompareLink {
        match previous {
            Some(previous) => CompareLink {
                url: format!(
                    "{base}/compare/{from}...{to}",
                    base = self.base,
                    from = previous.tag(),
                    to = version.tag()
                ),
                from_tag: Some(previous.tag()),
                to_tag: version.tag(),
            },
            None => CompareLink {
                url: format!("{base}/releases/tag/{tag}", base = self.base, tag = version.tag()),
                from_tag: None,
                to_tag: version.tag(),
            },
        }
    }
}

/// Structural well-formedness only: an absolute URI with a scheme and a
/// host. Reachability is out of scope.
pub fn check_url(url: &str) -> Result<(), LinkError> {
    let uri = Uri::from_str(url).map_err(|_| LinkError::Malformed(url.to_string()))?;
    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(LinkError::NotAbsolute(url.to_string()));
    }
    Ok(())
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "miette", derive(miette::Diagnostic))]
pub enum LinkError {
    #[error("`{0}` is not a valid URL")]
    #[cfg_attr(feature = "miette", diagnostic(code = "links::malformed"))]
    Malformed(String),
    #[error("`{0}` is not an absolute URL")]
    #[cfg_attr(
        feature = "miette",
        diagnostic(
            code = "links::not_absolute",
            help = "Changelog links must include a scheme and a host, like https://github.com/owner/repo"
        )
    )]
    NotAbsolute(String),
}
