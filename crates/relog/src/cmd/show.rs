use std::{path::Path, str::FromStr};

use miette::{Diagnostic, Result};
use relog_changelog::{Sections, Version, lint, semver};
use thiserror::Error;

use crate::cmd::load_changelog;

pub(crate) fn run(
    path: &Path,
    sections: &Sections,
    version: Option<&str>,
    json: bool,
) -> Result<()> {
    let changelog = load_changelog(path)?;
    let version = match version {
        Some(version) => Version::from_str(version).map_err(|source| Error::Invalid {
            text: version.to_string(),
            source,
        })?,
        None => changelog.latest_version().ok_or(Error::Empty)?,
    };

    if json {
        let parsed = lint::parse(&changelog, sections);
        let release = parsed
            .releases
            .iter()
            .find(|release| release.version == version)
            .ok_or_else(|| Error::NotFound(version.clone()))?;
        println!("{json}", json = release.to_json());
        return Ok(());
    }

    let notes = changelog
        .get_release(&version)
        .ok_or_else(|| Error::NotFound(version.clone()))?;
    println!("{title}\n\n{notes}", title = notes.title, notes = notes.notes);
    Ok(())
}

#[derive(Debug, Diagnostic, Error)]
enum Error {
    #[error("`{text}` is not a semantic version: {source}")]
    #[diagnostic(code(show::version))]
    Invalid {
        text: String,
        source: semver::ParseError,
    },
    #[error("no release is recorded for {0}")]
    #[diagnostic(
        code(show::not_found),
        help("Run `relog show` with no version to see the newest recorded release.")
    )]
    NotFound(Version),
    #[error("the changelog has no release entries")]
    #[diagnostic(code(show::empty))]
    Empty,
}
