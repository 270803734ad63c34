use std::{cmp::Ordering, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

pub use self::rule::{BumpError, Rule, Stable};

mod rule;

/// A semantic version as it appears in a release header or a git tag.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Version {
    pub stable: StableVersion,
    pub pre: Option<Prerelease>,
}

impl Version {
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            stable: StableVersion {
                major,
                minor,
                patch,
            },
            pre: None,
        }
    }

    #[must_use]
    pub fn with_pre(mut self, label: &str, number: u64) -> Self {
        self.pre = Some(Prerelease {
            label: Label::from(label),
            number,
        });
        self
    }

    #[must_use]
    pub const fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }

    /// The git tag conventionally pointing at this version.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("v{self}")
    }
}

impl From<StableVersion> for Version {
    fn from(stable: StableVersion) -> Self {
        Self { stable, pre: None }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.stable.cmp(&other.stable).then_with(|| {
            // A prerelease precedes the stable release it leads up to.
            match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(pre), Some(other_pre)) => pre.cmp(other_pre),
            }
        })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.pre {
            None => write!(f, "{}", self.stable),
            Some(pre) => write!(f, "{}-{pre}", self.stable),
        }
    }
}

impl FromStr for Version {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Tags are conventionally prefixed, headers are not. Accept both.
        let s = s.strip_prefix('v').unwrap_or(s);
        let (stable, pre) = match s.split_once('-') {
            Some((stable, pre)) => (stable, Some(pre)),
            None => (s, None),
        };
        let mut parts = stable.split('.');
        let mut component = || {
            let part = parts
                .next()
                .ok_or_else(|| ParseError::WrongShape(s.to_string()))?;
            part.parse::<u64>()
                .map_err(|_| ParseError::Component(part.to_string()))
        };
        let stable = StableVersion {
            major: component()?,
            minor: component()?,
            patch: component()?,
        };
        if parts.next().is_some() {
            return Err(ParseError::WrongShape(s.to_string()));
        }
        let pre = pre.map(Prerelease::from_str).transpose()?;
        Ok(Self { stable, pre })
    }
}

/// The `MAJOR.MINOR.PATCH` component of a version.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct StableVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl StableVersion {
    #[must_use]
    pub const fn increment_major(self) -> Self {
        Self {
            major: self.major + 1,
            minor: 0,
            patch: 0,
        }
    }

    #[must_use]
    pub const fn increment_minor(self) -> Self {
        Self {
            major: self.major,
            minor: self.minor + 1,
            patch: 0,
        }
    }

    #[must_use]
    pub const fn increment_patch(self) -> Self {
        Self {
            major: self.major,
            minor: self.minor,
            patch: self.patch + 1,
        }
    }
}

impl Display for StableVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{major}.{minor}.{patch}",
            major = self.major,
            minor = self.minor,
            patch = self.patch
        )
    }
}

/// The component after the `-`, e.g. `rc.1` in `1.2.0-rc.1`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Prerelease {
    pub label: Label,
    pub number: u64,
}

impl Prerelease {
    #[must_use]
    pub const fn new(label: Label, number: u64) -> Self {
        Self { label, number }
    }
}

impl Display for Prerelease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.label, self.number)
    }
}

impl FromStr for Prerelease {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (label, number) = s
            .rsplit_once('.')
            .ok_or_else(|| ParseError::Prerelease(s.to_string()))?;
        let number = number
            .parse::<u64>()
            .map_err(|_| ParseError::Prerelease(s.to_string()))?;
        Ok(Self {
            label: Label(label.to_string()),
            number,
        })
    }
}

impl Ord for Prerelease {
    fn cmp(&self, other: &Self) -> Ordering {
        self.label
            .cmp(&other.label)
            .then(self.number.cmp(&other.number))
    }
}

impl PartialOrd for Prerelease {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The label of a prerelease, e.g. `rc` in `1.2.0-rc.1`.
#[derive(Clone, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[repr(transparent)]
pub struct Label(pub String);

impl Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "miette", derive(miette::Diagnostic))]
pub enum ParseError {
    #[error("version component `{0}` is not a number")]
    #[cfg_attr(
        feature = "miette",
        diagnostic(
            code = "semver::component",
            help = "Each of MAJOR, MINOR, and PATCH must be an unsigned integer"
        )
    )]
    Component(String),
    #[error("`{0}` does not have the shape MAJOR.MINOR.PATCH")]
    #[cfg_attr(
        feature = "miette",
        diagnostic(
            code = "semver::shape",
            help = "A semantic version has exactly three dot-separated components, \
                    optionally followed by a prerelease, for example `1.4.0` or `1.4.0-rc.2`"
        )
    )]
    WrongShape(String),
    #[error("invalid prerelease component `{0}`")]
    #[cfg_attr(
        feature = "miette",
        diagnostic(
            code = "semver::prerelease",
            help = "A prerelease component is a label followed by a number, for example `rc.0`"
        )
    )]
    Prerelease(String),
}
