use std::cmp::Ordering;

use time::Date;

use crate::{
    changes::{self, BulletError, Change, ChangeType, CustomType},
    links::{self, CommitRef, LinkError},
    release_notes::{
        Changelog, Release, Section, SectionName, Sections, TitleError,
        changelog::{RawEntry, parse_title},
        release::format_date,
    },
    semver::Version,
};

/// The outcome of a lenient full parse: every release entry that could be
/// recovered, plus everything wrong with the document.
#[derive(Clone, Debug)]
pub struct Parsed {
    pub releases: Vec<Release>,
    pub report: LintReport,
}

/// Validate `changelog`, recovering as much structure as possible.
#[must_use]
pub fn parse(changelog: &Changelog, sections: &Sections) -> Parsed {
    let mut problems = Vec::new();
    let mut releases = Vec::new();
    let mut previous: Option<(Version, Option<Date>)> = None;

    for entry in changelog.entries() {
        let line = entry.line_number;
        let title = match parse_title(entry.title) {
            Ok(title) => title,
            Err(source) => {
                problems.push(Problem::Header { line, source });
                continue;
            }
        };

        if title.date.is_none() {
            problems.push(Problem::MissingDate {
                line,
                version: title.version.clone(),
            });
        }

        if let Some((previous_version, previous_date)) = &previous {
            match title.version.cmp(previous_version) {
                Ordering::Greater => problems.push(Problem::VersionOrder {
                    line,
                    version: title.version.clone(),
                    previous: previous_version.clone(),
                }),
                Ordering::Equal => problems.push(Problem::DuplicateVersion {
                    line,
                    version: title.version.clone(),
                }),
                Ordering::Less => {}
            }
            if let (Some(date), Some(previous_date)) = (title.date, previous_date) {
                if date > *previous_date {
                    problems.push(Problem::DateOrder {
                        line,
                        date: format_date(date),
                        previous: format_date(*previous_date),
                    });
                }
            }
        }
        previous = Some((title.version.clone(), title.date));

        if let Some(compare) = &title.compare {
            match links::check_url(&compare.url) {
                Err(source) => problems.push(Problem::Url {
                    line,
                    context: LinkContext::Compare,
                    source,
                }),
                Ok(()) => {
                    if !compare.points_at(&title.version) {
                        problems.push(Problem::CompareTag {
                            line,
                            tag: compare.to_tag.clone(),
                            version: title.version.clone(),
                        });
                    }
                }
            }
        }

        let body_sections = parse_body(&entry, sections, &mut problems);
        releases.push(Release {
            version: title.version,
            date: title.date,
            compare: title.compare,
            sections: body_sections,
        });
    }

    Parsed {
        releases,
        report: LintReport {
            path: changelog.path.to_string(),
            problems,
        },
    }
}

/// Validate `changelog` and return only the report.
#[must_use]
pub fn check(changelog: &Changelog, sections: &Sections) -> LintReport {
    parse(changelog, sections).report
}

fn parse_body(
    entry: &RawEntry<'_>,
    sections: &Sections,
    problems: &mut Vec<Problem>,
) -> Vec<Section> {
    let mut parsed: Vec<Section> = Vec::new();
    let mut current_type: Option<ChangeType> = None;

    for (line, text) in &entry.body {
        let line = *line;
        if text.starts_with('#') {
            let name = text.trim_start_matches('#').trim();
            current_type = Some(
                sections
                    .change_type_for(name)
                    .unwrap_or_else(|| ChangeType::Custom(CustomType::from(name))),
            );
            parsed.push(Section {
                name: SectionName::from(name),
                changes: Vec::new(),
            });
        } else if text.starts_with("* ") || text.starts_with("- ") {
            let Some(change_type) = &current_type else {
                continue; // free-form notes above the first section
            };
            match changes::parse_bullet(text, change_type.clone()) {
                Ok(change) => {
                    check_references(&change, line, problems);
                    if let Some(section) = parsed.last_mut() {
                        section.changes.push(change);
                    }
                }
                Err(source) => problems.push(Problem::Bullet { line, source }),
            }
        }
    }

    parsed.retain(|section| !section.changes.is_empty());
    parsed
}

fn check_references(change: &Change, line: usize, problems: &mut Vec<Problem>) {
    if let Some(issue) = &change.issue {
        if let Some(Err(source)) = issue.url.as_deref().map(links::check_url) {
            problems.push(Problem::Url {
                line,
                context: LinkContext::Issue,
                source,
            });
        }
    }
    if let Some(commit) = &change.commit {
        if let Some(Err(source)) = commit.url.as_deref().map(links::check_url) {
            problems.push(Problem::Url {
                line,
                context: LinkContext::Commit,
                source,
            });
        }
        if !CommitRef::looks_like_hash(&commit.short_hash) {
            problems.push(Problem::CommitHash {
                line,
                hash: commit.short_hash.clone(),
            });
        }
    }
}

/// Everything wrong with one changelog document.
#[derive(Clone, Debug, thiserror::Error)]
#[cfg_attr(feature = "miette", derive(miette::Diagnostic))]
#[error("{path} did not pass validation")]
pub struct LintReport {
    path: String,
    #[cfg_attr(feature = "miette", related)]
    problems: Vec<Problem>,
}

impl LintReport {
    #[must_use]
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    /// Whether the report fails a check run. Warnings only count when
    /// `strict` is set.
    #[must_use]
    pub fn fails(&self, strict: bool) -> bool {
        self.problems
            .iter()
            .any(|problem| strict || !problem.is_warning())
    }
}

/// One problem found in a changelog document.
#[derive(Clone, Debug, thiserror::Error)]
#[cfg_attr(feature = "miette", derive(miette::Diagnostic))]
pub enum Problem {
    #[error("line {line}: {source}")]
    #[cfg_attr(feature = "miette", diagnostic(code = "lint::header"))]
    Header {
        line: usize,
        source: TitleError,
    },
    #[error("line {line}: release {version} has no date")]
    #[cfg_attr(
        feature = "miette",
        diagnostic(
            code = "lint::missing_date",
            severity(Warning),
            help = "Release headers end with the release date, like `(2024-11-02)`"
        )
    )]
    MissingDate {
        line: usize,
        version: Version,
    },
    #[error("line {line}: version {version} is newer than {previous} above it")]
    #[cfg_attr(
        feature = "miette",
        diagnostic(
            code = "lint::version_order",
            help = "Entries are recorded newest first, so versions must strictly \
                    decrease from top to bottom"
        )
    )]
    VersionOrder {
        line: usize,
        version: Version,
        previous: Version,
    },
    #[error("line {line}: version {version} is recorded more than once")]
    #[cfg_attr(feature = "miette", diagnostic(code = "lint::duplicate_version"))]
    DuplicateVersion {
        line: usize,
        version: Version,
    },
    #[error("line {line}: date {date} is later than {previous} above it")]
    #[cfg_attr(
        feature = "miette",
        diagnostic(
            code = "lint::date_order",
            help = "A release cannot be older than the release recorded below it"
        )
    )]
    DateOrder {
        line: usize,
        date: String,
        previous: String,
    },
    #[error("line {line}: {context} link: {source}")]
    #[cfg_attr(feature = "miette", diagnostic(code = "lint::link"))]
    Url {
        line: usize,
        context: LinkContext,
        source: LinkError,
    },
    #[error("line {line}: `{hash}` does not look like an abbreviated commit hash")]
    #[cfg_attr(
        feature = "miette",
        diagnostic(
            code = "lint::commit_hash",
            severity(Warning),
            help = "Commit references are 7 to 40 hex characters"
        )
    )]
    CommitHash {
        line: usize,
        hash: String,
    },
    #[error("line {line}: compare link points at `{tag}`, not at {version}")]
    #[cfg_attr(
        feature = "miette",
        diagnostic(
            code = "lint::compare_tag",
            severity(Warning),
            help = "The right-hand tag of a release's compare link names that release"
        )
    )]
    CompareTag {
        line: usize,
        tag: String,
        version: Version,
    },
    #[error("line {line}: {source}")]
    #[cfg_attr(feature = "miette", diagnostic(code = "lint::bullet"))]
    Bullet {
        line: usize,
        source: BulletError,
    },
}

impl Problem {
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::Header { line, .. }
            | Self::MissingDate { line, .. }
            | Self::VersionOrder { line, .. }
            | Self::DuplicateVersion { line, .. }
            | Self::DateOrder { line, .. }
            | Self::Url { line, .. }
            | Self::CommitHash { line, .. }
            | Self::CompareTag { line, .. }
            | Self::Bullet { line, .. } => *line,
        }
    }

    /// A stable identifier for machine-readable output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Header { .. } => "header",
            Self::MissingDate { .. } => "missing-date",
            Self::VersionOrder { .. } => "version-order",
            Self::DuplicateVersion { .. } => "duplicate-version",
            Self::DateOrder { .. } => "date-order",
            Self::Url { .. } => "link-format",
            Self::CommitHash { .. } => "commit-hash",
            Self::CompareTag { .. } => "compare-tag",
            Self::Bullet { .. } => "bullet-format",
        }
    }

    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::MissingDate { .. } | Self::CommitHash { .. } | Self::CompareTag { .. }
        )
    }
}

/// Which kind of link a URL problem was found in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkContext {
    Compare,
    Issue,
    Commit,
}

impl std::fmt::Display for LinkContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compare => f.write_str("compare"),
            Self::Issue => f.write_str("issue"),
            Self::Commit => f.write_str("commit"),
        }
    }
}
