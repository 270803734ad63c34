use std::{fmt::Display, str::FromStr};

use itertools::Itertools;
use relative_path::RelativePathBuf;
use time::{Date, macros::format_description};

use super::Release;
use crate::{links::CompareLink, semver, semver::Version};

/// A changelog document: the raw content plus enough structure to find,
/// validate, and prepend release entries.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Changelog {
    /// Where the document lives, for display in diagnostics.
    pub path: RelativePathBuf,
    /// The content that's been read from (or will be written to) `path`.
    pub content: String,
    /// The header level of each release title (the version + date).
    release_header_level: HeaderLevel,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum HeaderLevel {
    H1,
    H2,
}

impl HeaderLevel {
    const fn as_str(self) -> &'static str {
        match self {
            Self::H1 => "#",
            Self::H2 => "##",
        }
    }
}

impl Display for HeaderLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Changelog {
    /// Wrap existing content, detecting the release header level from the
    /// second Markdown header (the first is usually the document title).
    #[must_use]
    pub fn new(path: RelativePathBuf, content: String) -> Self {
        let release_header_level = content
            .lines()
            .filter(|line| line.starts_with('#'))
            .nth(1)
            .and_then(|header| {
                if header.starts_with("##") {
                    Some(HeaderLevel::H2)
                } else if header.starts_with('#') {
                    Some(HeaderLevel::H1)
                } else {
                    None
                }
            })
            .unwrap_or(HeaderLevel::H2);
        Changelog {
            path,
            content,
            release_header_level,
        }
    }

    fn is_release_header(&self, line: &str) -> bool {
        let level = self.release_header_level.as_str();
        line.strip_prefix(level)
            .is_some_and(|rest| rest.starts_with(' '))
    }

    /// Every release entry in document order: the header line plus the body
    /// lines up to the next release header. Line numbers are 1-based.
    pub(crate) fn entries(&self) -> Vec<RawEntry<'_>> {
        let mut entries: Vec<RawEntry<'_>> = Vec::new();
        for (index, line) in self.content.lines().enumerate() {
            if self.is_release_header(line) {
                entries.push(RawEntry {
                    line_number: index + 1,
                    title: line,
                    body: Vec::new(),
                });
            } else if let Some(entry) = entries.last_mut() {
                entry.body.push((index + 1, line));
            }
        }
        entries
    }

    /// The newest recorded version: the first release header that parses.
    #[must_use]
    pub fn latest_version(&self) -> Option<Version> {
        self.content
            .lines()
            .filter(|line| self.is_release_header(line))
            .find_map(|line| parse_title(line).ok().map(|title| title.version))
    }

    /// Find a release matching `version`, if any, within the changelog.
    #[must_use]
    pub fn get_release(&self, version: &Version) -> Option<ReleaseNotes> {
        let mut lines = self.content.lines();
        let title = loop {
            let line = lines.next()?;
            if !self.is_release_header(line) {
                continue;
            }
            let Ok(title) = parse_title(line) else {
                continue;
            };
            if title.version == *version {
                // Release titles should not be markdown formatted
                break line.trim_start_matches('#').trim().to_string();
            }
        };
        let notes = lines
            .take_while(|line| !self.is_release_header(line))
            .join("\n");
        let notes = notes.trim().to_string();
        (!notes.is_empty()).then_some(ReleaseNotes { title, notes })
    }

    /// Prepend `release` above the newest recorded entry, preserving the
    /// preamble and trailing whitespace. Returns the text that was inserted.
    #[must_use]
    pub fn with_release(&mut self, release: &Release) -> String {
        let rendered = release.to_markdown();
        let new_entry = match self.release_header_level {
            HeaderLevel::H2 => rendered,
            // Entries render at H2; an H1-style changelog wants them one
            // level up.
            HeaderLevel::H1 => rendered
                .lines()
                .map(|line| {
                    line.strip_prefix('#')
                        .filter(|_| line.starts_with("##"))
                        .unwrap_or(line)
                })
                .join("\n"),
        };

        let mut not_written = true;
        let mut new_content = String::with_capacity(self.content.len() + new_entry.len() + 2);
        for line in self.content.lines() {
            if not_written && self.is_release_header(line) && parse_title(line).is_ok() {
                new_content.push_str(&new_entry);
                new_content.push_str("\n\n");
                not_written = false;
            }
            new_content.push_str(line);
            new_content.push('\n');
        }

        if not_written {
            if !new_content.is_empty() && !new_content.ends_with("\n\n") {
                new_content.push('\n');
            }
            new_content.push_str(&new_entry);
            new_content.push('\n');
        }

        if self.content.ends_with('\n') || self.content.is_empty() {
            // Preserve white space at end of file
            if !new_content.ends_with('\n') {
                new_content.push('\n');
            }
        } else {
            while new_content.ends_with('\n') {
                new_content.pop();
            }
        }

        self.content = new_content;
        new_entry
    }
}

/// One release's notes as recorded, for extraction into release bodies.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReleaseNotes {
    /// The header text without the leading `#`s.
    pub title: String,
    /// The body below the header, trimmed.
    pub notes: String,
}

pub(crate) struct RawEntry<'content> {
    pub(crate) line_number: usize,
    pub(crate) title: &'content str,
    pub(crate) body: Vec<(usize, &'content str)>,
}

/// The parsed pieces of a release header.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Title {
    pub(crate) version: Version,
    pub(crate) date: Option<Date>,
    pub(crate) compare: Option<CompareLink>,
}

/// Parse a release header like `## [1.4.0](…/compare/v1.3.2...v1.4.0)
/// (2024-11-02)`, tolerating unlinked versions and missing dates.
pub(crate) fn parse_title(title: &str) -> Result<Title, TitleError> {
    let rest = title.trim_start_matches('#');
    if rest.len() == title.len() || !rest.starts_with(' ') {
        return Err(TitleError::NotAHeader);
    }
    let rest = rest.trim_start();

    let (version_text, compare, rest) = if let Some(linked) = rest.strip_prefix('[') {
        let (version_text, linked) = linked
            .split_once("](")
            .ok_or(TitleError::UnclosedLink)?;
        let (url, rest) = linked.split_once(')').ok_or(TitleError::UnclosedLink)?;
        (
            version_text,
            Some(CompareLink::from_url(url)),
            rest,
        )
    } else {
        let version_text = rest.split_whitespace().next().unwrap_or_default();
        (version_text, None, rest.get(version_text.len()..).unwrap_or_default())
    };

    let version = Version::from_str(version_text).map_err(|source| TitleError::Version {
        text: version_text.to_string(),
        source,
    })?;

    let format = format_description!("[year]-[month]-[day]");
    let date = rest
        .split_whitespace()
        .map(|part| {
            part.trim_start_matches(['(', '-'])
                .trim_end_matches(')')
        })
        .find_map(|part| Date::parse(part, format).ok());

    Ok(Title {
        version,
        date,
        compare,
    })
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "miette", derive(miette::Diagnostic))]
pub enum TitleError {
    #[error("not a release header")]
    #[cfg_attr(
        feature = "miette",
        diagnostic(
            code = "changelog::header::level",
            help = "A release header is a Markdown header whose text starts with a \
                    semantic version, for example `## 1.4.0 (2024-11-02)`"
        )
    )]
    NotAHeader,
    #[error("release header opens a link it never closes")]
    #[cfg_attr(
        feature = "miette",
        diagnostic(
            code = "changelog::header::link",
            help = "A linked version is written `## [1.4.0](https://…) (2024-11-02)`"
        )
    )]
    UnclosedLink,
    #[error("release header version `{text}` is invalid: {source}")]
    #[cfg_attr(feature = "miette", diagnostic(code = "changelog::header::version"))]
    Version {
        text: String,
        source: semver::ParseError,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test_parse_title {
    use pretty_assertions::assert_eq;
    use time::macros::date;

    use super::*;

    #[test]
    fn no_date() {
        let title = parse_title("## 0.1.2").unwrap();
        assert_eq!(title.version, Version::new(0, 1, 2));
        assert!(title.date.is_none());
        assert!(title.compare.is_none());
    }

    #[test]
    fn with_date() {
        let title = parse_title("## 0.1.2 (2023-05-02)").unwrap();
        assert_eq!(title.version, Version::new(0, 1, 2));
        assert_eq!(title.date, Some(date!(2023 - 05 - 02)));
    }

    #[test]
    fn dash_separated_date() {
        let title = parse_title("## 0.1.2 - 2023-05-02").unwrap();
        assert_eq!(title.date, Some(date!(2023 - 05 - 02)));
    }

    #[test]
    fn linked_version() {
        let title =
            parse_title("## [1.4.0](https://github.com/acme/app/compare/v1.3.2...v1.4.0) (2024-11-02)")
                .unwrap();
        assert_eq!(title.version, Version::new(1, 4, 0));
        assert_eq!(title.date, Some(date!(2024 - 11 - 02)));
        let compare = title.compare.unwrap();
        assert_eq!(compare.from_tag.as_deref(), Some("v1.3.2"));
        assert_eq!(compare.to_tag, "v1.4.0");
    }

    #[test]
    fn unclosed_link() {
        assert_eq!(
            parse_title("## [1.4.0](https://github.com"),
            Err(TitleError::UnclosedLink)
        );
        assert_eq!(parse_title("## [1.4.0"), Err(TitleError::UnclosedLink));
    }

    #[test]
    fn no_version() {
        assert!(matches!(
            parse_title("## 2023-05-02"),
            Err(TitleError::Version { .. })
        ));
    }

    #[test]
    fn bad_version() {
        assert!(matches!(
            parse_title("## sad"),
            Err(TitleError::Version { .. })
        ));
    }

    #[test]
    fn h1() {
        let title = parse_title("# 0.1.2 (2023-05-02)").unwrap();
        assert_eq!(title.version, Version::new(0, 1, 2));
        assert_eq!(title.date, Some(date!(2023 - 05 - 02)));
    }

    #[test]
    fn not_a_header() {
        assert_eq!(parse_title("0.1.2"), Err(TitleError::NotAHeader));
        assert_eq!(parse_title("##0.1.2"), Err(TitleError::NotAHeader));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test_changelog {
    use pretty_assertions::assert_eq;
    use time::macros::date;

    use super::*;
    use crate::release_notes::Sections;

    const CONTENT: &str = "\
# Changelog

All notable changes to the backend are documented in this file.

## [0.2.0](https://github.com/acme/app/compare/v0.1.0...v0.2.0) (2024-10-12)

### Features

* **api:** report namespace counts ([#21](https://github.com/acme/app/issues/21))

## [0.1.0](https://github.com/acme/app/releases/tag/v0.1.0) (2024-09-30)

### Features

* initial release
";

    fn changelog() -> Changelog {
        Changelog::new("CHANGELOG.md".into(), CONTENT.to_string())
    }

    #[test]
    fn latest_version() {
        assert_eq!(changelog().latest_version(), Some(Version::new(0, 2, 0)));
    }

    #[test]
    fn get_release() {
        let notes = changelog().get_release(&Version::new(0, 1, 0)).unwrap();
        assert_eq!(
            notes.title,
            "[0.1.0](https://github.com/acme/app/releases/tag/v0.1.0) (2024-09-30)"
        );
        assert_eq!(notes.notes, "### Features\n\n* initial release");
    }

    #[test]
    fn get_release_missing() {
        assert_eq!(changelog().get_release(&Version::new(9, 9, 9)), None);
    }

    #[test]
    fn entries_split_on_headers() {
        let changelog = changelog();
        let entries = changelog.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].line_number, 5);
        assert_eq!(entries[1].line_number, 11);
    }

    #[test]
    fn with_release_prepends_above_newest() {
        let mut changelog = changelog();
        let release = Release::new(
            Version::new(0, 3, 0),
            Some(date!(2024 - 11 - 02)),
            None,
            &[crate::changes::Change::new(
                crate::changes::ChangeType::Fix,
                "retry cluster connection",
            )],
            &Sections::default(),
        );
        let diff = changelog.with_release(&release);
        assert_eq!(
            diff,
            "## 0.3.0 (2024-11-02)\n\n### Bug Fixes\n\n* retry cluster connection"
        );
        let expected = CONTENT.replace(
            "## [0.2.0]",
            "## 0.3.0 (2024-11-02)\n\n### Bug Fixes\n\n* retry cluster connection\n\n## [0.2.0]",
        );
        assert_eq!(changelog.content, expected);
        // Older entries are byte-for-byte untouched.
        assert!(changelog.content.contains(
            "## [0.1.0](https://github.com/acme/app/releases/tag/v0.1.0) (2024-09-30)"
        ));
    }

    #[test]
    fn with_release_into_empty_file() {
        let mut changelog = Changelog::new("CHANGELOG.md".into(), String::new());
        let release = Release::new(
            Version::new(0, 1, 0),
            Some(date!(2024 - 09 - 30)),
            None,
            &[],
            &Sections::default(),
        );
        let diff = changelog.with_release(&release);
        assert_eq!(diff, "## 0.1.0 (2024-09-30)");
        assert_eq!(changelog.content, "## 0.1.0 (2024-09-30)\n");
    }

    #[test]
    fn with_release_after_preamble_only() {
        let mut changelog =
            Changelog::new("CHANGELOG.md".into(), "# Changelog\n\nNothing yet.\n".to_string());
        let release = Release::new(
            Version::new(0, 1, 0),
            Some(date!(2024 - 09 - 30)),
            None,
            &[],
            &Sections::default(),
        );
        let _diff = changelog.with_release(&release);
        assert_eq!(
            changelog.content,
            "# Changelog\n\nNothing yet.\n\n## 0.1.0 (2024-09-30)\n"
        );
    }

    #[test]
    fn h1_changelogs_get_h1_entries() {
        let content = "# 0.2.0 (2024-10-12)\n\n* something\n\n# 0.1.0 (2024-09-30)\n";
        let mut changelog = Changelog::new("CHANGELOG.md".into(), content.to_string());
        let release = Release::new(
            Version::new(0, 3, 0),
            Some(date!(2024 - 11 - 02)),
            None,
            &[crate::changes::Change::new(
                crate::changes::ChangeType::Feature,
                "another thing",
            )],
            &Sections::default(),
        );
        let diff = changelog.with_release(&release);
        assert_eq!(diff, "# 0.3.0 (2024-11-02)\n\n## Features\n\n* another thing");
        assert!(changelog.content.starts_with("# 0.3.0 (2024-11-02)\n\n## Features"));
    }
}
