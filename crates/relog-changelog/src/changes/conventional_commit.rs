use git_conventional::{Commit as ConventionalCommit, Type};
use tracing::debug;

use super::{Change, ChangeType};
use crate::{links::CommitRef, release_notes::Sections};

/// Footer tokens that reference the issue a commit closes.
const ISSUE_FOOTERS: [&str; 3] = ["closes", "fixes", "resolves"];

/// A commit message as release tooling receives it, e.g. one line of
/// `git log --format="%h %s%n%b"`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Commit {
    pub hash: Option<String>,
    pub message: String,
}

impl Commit {
    /// Split a leading abbreviated hash off the message, when present.
    #[must_use]
    pub fn from_line(line: &str) -> Self {
        if let Some((first, rest)) = line.split_once(char::is_whitespace) {
            if CommitRef::looks_like_hash(first) {
                return Self {
                    hash: Some(first.to_string()),
                    message: rest.trim_start().to_string(),
                };
            }
        }
        Self {
            hash: None,
            message: line.to_string(),
        }
    }

    fn commit_ref(&self) -> Option<CommitRef> {
        self.hash.as_ref().map(|hash| CommitRef {
            short_hash: hash.clone(),
            url: None,
        })
    }
}

/// Parse each commit message as a
/// [conventional commit](https://www.conventionalcommits.org/).
///
/// Messages that don't follow the format are ignored, as are types that no
/// configured section collects. A `!` or a `BREAKING CHANGE` footer makes a
/// change breaking; `Closes`-style footers attach an issue reference.
#[must_use]
pub fn changes_from_commits(commits: &[Commit], sections: &Sections) -> Vec<Change> {
    let mut changes = Vec::with_capacity(commits.len());
    for commit in commits {
        let Ok(parsed) = ConventionalCommit::parse(commit.message.trim()) else {
            debug!(
                "ignoring commit that is not a conventional commit: {message}",
                message = commit.message
            );
            continue;
        };
        let scope = parsed.scope().map(|scope| scope.to_string());
        let issue = parsed.footers().iter().find_map(|footer| {
            let token = footer.token().to_string();
            if !ISSUE_FOOTERS.iter().any(|it| token.eq_ignore_ascii_case(it)) {
                return None;
            }
            footer
                .value()
                .trim()
                .trim_start_matches('#')
                .parse::<u64>()
                .ok()
        });

        let mut has_breaking_footer = false;
        for footer in parsed.footers() {
            if footer.breaking() {
                has_breaking_footer = true;
                changes.push(Change {
                    change_type: ChangeType::Breaking,
                    scope: scope.clone(),
                    description: footer.value().to_string(),
                    issue: None,
                    commit: commit.commit_ref(),
                });
            }
        }

        let change_type = if parsed.breaking() && !has_breaking_footer {
            ChangeType::Breaking
        } else if parsed.type_() == Type::FEAT {
            ChangeType::Feature
        } else if parsed.type_() == Type::FIX {
            ChangeType::Fix
        } else if let Some(custom) = sections.custom_type(parsed.type_().as_str()) {
            ChangeType::Custom(custom)
        } else {
            debug!(
                "commit type {commit_type} is not mapped to a changelog section",
                commit_type = parsed.type_()
            );
            continue;
        };

        changes.push(Change {
            change_type,
            scope,
            description: parsed.description().to_string(),
            issue: issue.map(|number| crate::links::IssueRef { number, url: None }),
            commit: commit.commit_ref(),
        });
    }
    changes
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test_conventional_commits {
    use pretty_assertions::assert_eq;

    use super::*;

    fn commits(messages: &[&str]) -> Vec<Commit> {
        messages.iter().map(|it| Commit::from_line(it)).collect()
    }

    #[test]
    fn standard_types() {
        let changes = changes_from_commits(
            &commits(&["fix: a bug", "feat: add a feature", "chore: noise"]),
            &Sections::default(),
        );
        assert_eq!(
            changes,
            vec![
                Change::new(ChangeType::Fix, "a bug"),
                Change::new(ChangeType::Feature, "add a feature"),
            ]
        );
    }

    #[test]
    fn breaking_via_bang_and_footer() {
        let changes = changes_from_commits(
            &commits(&[
                "feat!: drop the v1 API",
                "fix: tighten validation\n\nBREAKING CHANGE: empty payloads are rejected",
            ]),
            &Sections::default(),
        );
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].change_type, ChangeType::Breaking);
        assert_eq!(changes[0].description, "drop the v1 API");
        assert_eq!(changes[1].change_type, ChangeType::Breaking);
        assert_eq!(changes[1].description, "empty payloads are rejected");
        assert_eq!(changes[2].change_type, ChangeType::Fix);
        assert_eq!(changes[2].description, "tighten validation");
    }

    #[test]
    fn custom_types_from_sections() {
        let changes = changes_from_commits(
            &commits(&["perf: cache cluster counts", "revert: undo the cache"]),
            &Sections::default(),
        );
        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes[0].change_type,
            ChangeType::Custom("perf".into()),
        );
        assert_eq!(
            changes[1].change_type,
            ChangeType::Custom("revert".into()),
        );
    }

    #[test]
    fn scope_and_hash_and_issue() {
        let changes = changes_from_commits(
            &commits(&["c4d9e1b fix(docker): push image with correct tag\n\nCloses: #38"]),
            &Sections::default(),
        );
        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.scope.as_deref(), Some("docker"));
        assert_eq!(change.description, "push image with correct tag");
        assert_eq!(change.issue.as_ref().unwrap().number, 38);
        assert_eq!(change.commit.as_ref().unwrap().short_hash, "c4d9e1b");
    }

    #[test]
    fn non_conventional_ignored() {
        let changes = changes_from_commits(
            &commits(&["merge branch main", "WIP"]),
            &Sections::default(),
        );
        assert_eq!(changes, vec![]);
    }

    #[test]
    fn hash_detection() {
        let commit = Commit::from_line("8f31c2a feat: add endpoint");
        assert_eq!(commit.hash.as_deref(), Some("8f31c2a"));
        assert_eq!(commit.message, "feat: add endpoint");

        let bare = Commit::from_line("feat: add endpoint");
        assert_eq!(bare.hash, None);
    }
}
