use std::{fmt::Display, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::links::{CommitRef, IssueRef, RepoUrls};

pub mod conventional_commit;

/// One bullet entry of a changelog: a categorized change with an optional
/// scope tag and optional issue/commit references.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Change {
    pub change_type: ChangeType,
    pub scope: Option<String>,
    pub description: String,
    pub issue: Option<IssueRef>,
    pub commit: Option<CommitRef>,
}

impl Change {
    #[must_use]
    pub fn new(change_type: ChangeType, description: &str) -> Self {
        Self {
            change_type,
            scope: None,
            description: description.to_string(),
            issue: None,
            commit: None,
        }
    }

    /// Fill in forge URLs for the issue and commit references.
    #[must_use]
    pub fn linked(mut self, repo: &RepoUrls) -> Self {
        if let Some(issue) = &mut self.issue {
            issue.url = Some(repo.issue(issue.number));
        }
        if let Some(commit) = &mut self.commit {
            commit.url = Some(repo.commit(&commit.short_hash));
        }
        self
    }

    /// Render the bullet the way release tooling writes it:
    /// `* **scope:** description ([#41](…)) ([8f31c2a](…))`.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut line = String::from("* ");
        if let Some(scope) = &self.scope {
            line.push_str("**");
            line.push_str(scope);
            line.push_str(":** ");
        }
        line.push_str(&self.description);
        if let Some(issue) = &self.issue {
            match &issue.url {
                Some(url) => {
                    line.push_str(&format!(" ([#{number}]({url}))", number = issue.number));
                }
                None => line.push_str(&format!(" (#{number})", number = issue.number)),
            }
        }
        if let Some(commit) = &self.commit {
            match &commit.url {
                Some(url) => {
                    line.push_str(&format!(" ([{hash}]({url}))", hash = commit.short_hash));
                }
                None => line.push_str(&format!(" ({hash})", hash = commit.short_hash)),
            }
        }
        line
    }
}

/// The category a change belongs to, which determines the changelog section
/// it is recorded under and the version bump it implies.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ChangeType {
    Breaking,
    Feature,
    Fix,
    /// A non-standard conventional-commit type mapped to its own section,
    /// like `perf` or `revert`.
    Custom(CustomType),
}

/// A conventional-commit type other than `feat`/`fix`.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[repr(transparent)]
pub struct CustomType(pub String);

impl Display for CustomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CustomType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// The patterns are fixed, they can't fail to compile.
#[allow(clippy::unwrap_used)]
static SCOPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*(?<scope>[^*]+?):?\*\*:?\s+").unwrap());

#[allow(clippy::unwrap_used)]
static TRAILING_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+\((?:\[(?<text>[^\]]+)\]\((?<url>[^)]*)\)|(?<plain>#?\w+))\)$").unwrap()
});

/// Parse one bullet line (already known to start with `*` or `-`) into a
/// [`Change`] of the given type.
pub(crate) fn parse_bullet(line: &str, change_type: ChangeType) -> Result<Change, BulletError> {
    let trimmed = line.trim_start_matches(['*', '-']).trim();

    let (scope, mut rest) = match SCOPE.captures(trimmed) {
        Some(captures) => {
            let scope = captures["scope"].trim_end_matches(':').to_string();
            let body = trimmed.get(captures.get(0).map_or(0, |m| m.end())..);
            (Some(scope), body.unwrap_or_default())
        }
        None => (None, trimmed),
    };
    if rest.starts_with("**") {
        return Err(BulletError::UnterminatedScope(line.to_string()));
    }

    let mut issue = None;
    let mut commit = None;
    // References sit at the end of the bullet; strip them off right to left.
    while let Some(captures) = TRAILING_REF.captures(rest) {
        let (text, url) = match (captures.name("text"), captures.name("plain")) {
            (Some(text), _) => (text.as_str(), captures.name("url").map(|m| m.as_str())),
            (None, Some(plain)) => (plain.as_str(), None),
            (None, None) => break,
        };
        // An explicitly linked reference gets the looser hash shape so the
        // linter can flag over-abbreviated hashes instead of dropping them.
        let hash_shaped = if url.is_some() {
            CommitRef::plausible_hash(text)
        } else {
            CommitRef::looks_like_hash(text)
        };
        if let Some(number) = text.strip_prefix('#') {
            let Ok(number) = number.parse::<u64>() else {
                break;
            };
            // Leftmost reference wins when the same kind repeats.
            issue = Some(IssueRef {
                number,
                url: url.map(ToString::to_string),
            });
        } else if hash_shaped {
            commit = Some(CommitRef {
                short_hash: text.to_string(),
                url: url.map(ToString::to_string),
            });
        } else {
            break; // a parenthetical that is part of the description
        }
        rest = rest
            .get(..captures.get(0).map_or(0, |m| m.start()))
            .unwrap_or_default();
    }

    if rest.is_empty() {
        return Err(BulletError::EmptyDescription(line.to_string()));
    }

    Ok(Change {
        change_type,
        scope,
        description: rest.to_string(),
        issue,
        commit,
    })
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "miette", derive(miette::Diagnostic))]
pub enum BulletError {
    #[error("bullet entry `{0}` has no description")]
    #[cfg_attr(
        feature = "miette",
        diagnostic(
            code = "changelog::bullet::empty",
            help = "Every bullet needs a change description after the scope tag"
        )
    )]
    EmptyDescription(String),
    #[error("bullet entry `{0}` opens a scope tag it never closes")]
    #[cfg_attr(
        feature = "miette",
        diagnostic(
            code = "changelog::bullet::scope",
            help = "Scope tags are written `**scope:** description`"
        )
    )]
    UnterminatedScope(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test_parse_bullet {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn full_bullet() {
        let change = parse_bullet(
            "* **docker:** push image with correct tag \
             ([#38](https://github.com/acme/app/issues/38)) \
             ([c4d9e1b](https://github.com/acme/app/commit/c4d9e1b))",
            ChangeType::Fix,
        )
        .unwrap();
        assert_eq!(change.scope.as_deref(), Some("docker"));
        assert_eq!(change.description, "push image with correct tag");
        assert_eq!(change.issue.as_ref().unwrap().number, 38);
        assert_eq!(
            change.issue.unwrap().url.as_deref(),
            Some("https://github.com/acme/app/issues/38")
        );
        assert_eq!(change.commit.as_ref().unwrap().short_hash, "c4d9e1b");
    }

    #[test]
    fn bare_bullet() {
        let change = parse_bullet("- add cluster metrics endpoint", ChangeType::Feature).unwrap();
        assert_eq!(change.scope, None);
        assert_eq!(change.description, "add cluster metrics endpoint");
        assert_eq!(change.issue, None);
        assert_eq!(change.commit, None);
    }

    #[test]
    fn unlinked_references() {
        let change = parse_bullet("* fix healthcheck path (#12) (8f31c2a)", ChangeType::Fix).unwrap();
        assert_eq!(change.description, "fix healthcheck path");
        assert_eq!(change.issue.unwrap().number, 12);
        assert_eq!(change.commit.unwrap().short_hash, "8f31c2a");
    }

    #[test]
    fn parenthetical_kept_in_description() {
        let change = parse_bullet(
            "* support graceful shutdown (SIGTERM) ([abc1234](https://github.com/acme/app/commit/abc1234))",
            ChangeType::Feature,
        )
        .unwrap();
        assert_eq!(change.description, "support graceful shutdown (SIGTERM)");
        assert_eq!(change.commit.unwrap().short_hash, "abc1234");
    }

    #[test]
    fn scope_colon_variants() {
        for line in [
            "* **api:** add endpoint",
            "* **api**: add endpoint",
        ] {
            let change = parse_bullet(line, ChangeType::Feature).unwrap();
            assert_eq!(change.scope.as_deref(), Some("api"), "{line}");
            assert_eq!(change.description, "add endpoint", "{line}");
        }
    }

    #[test]
    fn malformed_bullets() {
        assert_eq!(
            parse_bullet("* ", ChangeType::Fix),
            Err(BulletError::EmptyDescription("* ".to_string()))
        );
        assert!(matches!(
            parse_bullet("* **api: missing close", ChangeType::Fix),
            Err(BulletError::UnterminatedScope(_))
        ));
    }

    #[test]
    fn round_trip() {
        let line = "* **api:** add cluster metrics endpoint ([#41](https://github.com/acme/app/issues/41)) ([8f31c2a](https://github.com/acme/app/commit/8f31c2a))";
        let change = parse_bullet(line, ChangeType::Feature).unwrap();
        assert_eq!(change.to_markdown(), line);
    }
}
