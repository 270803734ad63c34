use std::path::Path;

use miette::Diagnostic;
use relative_path::RelativePathBuf;
use relog_changelog::{
    BumpError, Changelog, Label, Rule, Stable, Version,
    changes::{Change, conventional_commit},
};
use thiserror::Error;

use crate::{RuleArg, fs};

pub(crate) mod add;
pub(crate) mod bump;
pub(crate) mod check;
pub(crate) mod show;

/// Read the changelog at `path`, treating a missing file as empty so that
/// the first `add` can create it.
pub(crate) fn load_changelog(path: &Path) -> Result<Changelog, fs::Error> {
    let content = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };
    Ok(Changelog::new(display_path(path), content))
}

/// The path as shown in diagnostics. Absolute paths (e.g. from tests) fall
/// back to the file name.
fn display_path(path: &Path) -> RelativePathBuf {
    RelativePathBuf::from_path(path).unwrap_or_else(|_| {
        RelativePathBuf::from(
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "CHANGELOG.md".to_string()),
        )
    })
}

/// Turn commit messages into changes, the way release automation feeds them
/// in: one `<hash> <message>` or bare `<message>` per argument.
pub(crate) fn changes_from_messages(
    messages: &[String],
    sections: &relog_changelog::Sections,
) -> Vec<Change> {
    let commits = messages
        .iter()
        .map(|message| conventional_commit::Commit::from_line(message))
        .collect::<Vec<_>>();
    conventional_commit::changes_from_commits(&commits, sections)
}

/// Work out the version the next release gets, from an explicit version, an
/// explicit rule, or the rule the changes imply.
pub(crate) fn next_version(
    changelog: &Changelog,
    changes: &[Change],
    rule: Option<RuleArg>,
    version: Option<&str>,
    pre_label: Option<&str>,
) -> Result<Version, VersionError> {
    if let Some(version) = version {
        return version
            .parse::<Version>()
            .map_err(|source| VersionError::Invalid {
                text: version.to_string(),
                source,
            });
    }

    let current = changelog
        .latest_version()
        .unwrap_or_else(|| Version::new(0, 0, 0));
    let stable_rule = Stable::implied_by(changes, &current);
    let rule = match rule {
        Some(RuleArg::Major) => Rule::Major,
        Some(RuleArg::Minor) => Rule::Minor,
        Some(RuleArg::Patch) => Rule::Patch,
        Some(RuleArg::Release) => Rule::Release,
        Some(RuleArg::Pre) => Rule::Pre {
            label: Label::from(pre_label.unwrap_or("rc")),
            stable_rule,
        },
        // A label on its own is enough to ask for a prerelease.
        None => match pre_label {
            Some(label) => Rule::Pre {
                label: Label::from(label),
                stable_rule,
            },
            None => Rule::from(stable_rule),
        },
    };
    current.bump(&rule).map_err(VersionError::Bump)
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum VersionError {
    #[error("`{text}` is not a semantic version: {source}")]
    #[diagnostic(code(version::invalid))]
    Invalid {
        text: String,
        source: relog_changelog::semver::ParseError,
    },
    #[error(transparent)]
    #[diagnostic(transparent)]
    Bump(BumpError),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test_next_version {
    use pretty_assertions::assert_eq;
    use relog_changelog::Sections;

    use super::*;

    fn changelog(content: &str) -> Changelog {
        Changelog::new("CHANGELOG.md".into(), content.to_string())
    }

    fn next(content: &str, messages: &[&str], rule: Option<RuleArg>) -> String {
        let messages = messages.iter().map(ToString::to_string).collect::<Vec<_>>();
        let changes = changes_from_messages(&messages, &Sections::default());
        next_version(&changelog(content), &changes, rule, None, None)
            .unwrap()
            .to_string()
    }

    const CURRENT: &str = "# Changelog\n\n## 1.2.3 (2024-10-12)\n";

    #[test]
    fn implied_rules() {
        assert_eq!(next(CURRENT, &["fix: a bug"], None), "1.2.4");
        assert_eq!(next(CURRENT, &["feat: a feature"], None), "1.3.0");
        assert_eq!(next(CURRENT, &["feat!: an overhaul"], None), "2.0.0");
    }

    #[test]
    fn explicit_rule_wins() {
        assert_eq!(
            next(CURRENT, &["fix: a bug"], Some(RuleArg::Major)),
            "2.0.0"
        );
    }

    #[test]
    fn empty_changelog_starts_from_zero() {
        // 0.x scaling applies from the very first release: a feature is a
        // patch bump until 1.0.0.
        assert_eq!(next("", &["feat: first"], None), "0.0.1");
        assert_eq!(next("", &["feat: first"], Some(RuleArg::Minor)), "0.1.0");
    }

    #[test]
    fn explicit_version_wins() {
        let version = next_version(&changelog(CURRENT), &[], None, Some("3.0.0"), None).unwrap();
        assert_eq!(version.to_string(), "3.0.0");
        assert!(next_version(&changelog(CURRENT), &[], None, Some("3.0"), None).is_err());
    }

    #[test]
    fn prerelease_flow() {
        let changes = changes_from_messages(
            &["feat: a feature".to_string()],
            &Sections::default(),
        );
        let version = next_version(
            &changelog(CURRENT),
            &changes,
            Some(RuleArg::Pre),
            None,
            None,
        )
        .unwrap();
        assert_eq!(version.to_string(), "1.3.0-rc.0");

        let continued = next_version(
            &changelog("# Changelog\n\n## 1.3.0-rc.0 (2024-10-12)\n"),
            &changes,
            Some(RuleArg::Pre),
            None,
            None,
        )
        .unwrap();
        assert_eq!(continued.to_string(), "1.3.0-rc.1");

        let released = next_version(
            &changelog("# Changelog\n\n## 1.3.0-rc.1 (2024-10-13)\n"),
            &[],
            Some(RuleArg::Release),
            None,
            None,
        )
        .unwrap();
        assert_eq!(released.to_string(), "1.3.0");
    }
}
