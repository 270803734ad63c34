//! Parsing, validation, and maintenance of conventional Markdown
//! changelogs: the release entries, their semantic versions, change
//! categories, and forge links.

pub mod changes;
mod links;
pub mod lint;
pub mod release_notes;
pub mod semver;

pub use links::{CommitRef, CompareLink, IssueRef, LinkError, RepoUrls, check_url};
pub use release_notes::{
    Changelog, Release, ReleaseNotes, Section, SectionName, Sections, TitleError,
};
pub use semver::{BumpError, Label, Prerelease, Rule, Stable, StableVersion, Version};
