use std::fmt::Display;

use tracing::debug;

use super::{Label, Prerelease, Version};
use crate::changes::{Change, ChangeType};

/// The rules a release can apply to the previously recorded version.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Rule {
    Major,
    Minor,
    Patch,
    /// Cut a prerelease leading up to the stable bump implied by `stable_rule`.
    Pre {
        label: Label,
        stable_rule: Stable,
    },
    /// Promote the current prerelease to its stable version.
    Release,
}

impl From<Stable> for Rule {
    fn from(stable: Stable) -> Self {
        match stable {
            Stable::Major => Self::Major,
            Stable::Minor => Self::Minor,
            Stable::Patch => Self::Patch,
        }
    }
}

/// The rules that apply to stable versions.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub enum Stable {
    #[default]
    Patch,
    Minor,
    Major,
}

impl Stable {
    /// The rule implied by a set of changes, scaled for the 0.x convention:
    /// before 1.0.0, breaking changes bump the minor component and features
    /// bump the patch component.
    pub fn implied_by<'a>(
        changes: impl IntoIterator<Item = &'a Change>,
        current: &Version,
    ) -> Self {
        let rule = changes
            .into_iter()
            .map(|change| {
                let rule = Self::from(&change.change_type);
                debug!("{summary} implies rule {rule}", summary = change.description);
                rule
            })
            .max()
            .unwrap_or_default();
        if current.stable.major == 0 {
            match rule {
                Self::Major => Self::Minor,
                Self::Minor | Self::Patch => Self::Patch,
            }
        } else {
            rule
        }
    }
}

impl From<&ChangeType> for Stable {
    fn from(change_type: &ChangeType) -> Self {
        match change_type {
            ChangeType::Breaking => Self::Major,
            ChangeType::Feature => Self::Minor,
            ChangeType::Fix | ChangeType::Custom(_) => Self::Patch,
        }
    }
}

impl Display for Stable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Major => f.write_str("MAJOR"),
            Self::Minor => f.write_str("MINOR"),
            Self::Patch => f.write_str("PATCH"),
        }
    }
}

impl Version {
    /// The version that `rule` produces from `self`.
    ///
    /// # Errors
    ///
    /// [`Rule::Release`] is only applicable to prereleases.
    pub fn bump(&self, rule: &Rule) -> Result<Self, BumpError> {
        match rule {
            Rule::Major => Ok(self.stable.increment_major().into()),
            Rule::Minor => Ok(self.stable.increment_minor().into()),
            Rule::Patch => Ok(self.stable.increment_patch().into()),
            Rule::Pre { label, stable_rule } => Ok(self.bump_pre(label, *stable_rule)),
            Rule::Release => {
                if self.pre.is_some() {
                    Ok(Self::from(self.stable))
                } else {
                    Err(BumpError::NotAPrerelease(self.clone()))
                }
            }
        }
    }

    fn bump_pre(&self, label: &Label, stable_rule: Stable) -> Self {
        // Continuing an in-flight prerelease only counts up its number.
        if let Some(pre) = &self.pre {
            if pre.label == *label {
                return Self {
                    stable: self.stable,
                    pre: Some(Prerelease::new(label.clone(), pre.number + 1)),
                };
            }
        }
        let stable = match stable_rule {
            Stable::Major => self.stable.increment_major(),
            Stable::Minor => self.stable.increment_minor(),
            Stable::Patch => self.stable.increment_patch(),
        };
        Self {
            stable,
            pre: Some(Prerelease::new(label.clone(), 0)),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "miette", derive(miette::Diagnostic))]
pub enum BumpError {
    #[error("{0} is not a prerelease")]
    #[cfg_attr(
        feature = "miette",
        diagnostic(
            code = "semver::not_a_prerelease",
            help = "The release rule strips the prerelease component from a version like \
                    1.2.0-rc.1, so the newest recorded version must be a prerelease"
        )
    )]
    NotAPrerelease(Version),
}
