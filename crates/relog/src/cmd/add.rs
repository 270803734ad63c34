use std::path::Path;

use miette::{Diagnostic, Result};
use relog_changelog::{Release, RepoUrls, Sections};
use thiserror::Error;
use time::{Date, OffsetDateTime, macros::format_description};
use tracing::info;

use crate::{
    RuleArg,
    cmd::{changes_from_messages, load_changelog, next_version},
    fs,
};

pub(crate) struct Options {
    pub(crate) messages: Vec<String>,
    pub(crate) rule: Option<RuleArg>,
    pub(crate) version: Option<String>,
    pub(crate) pre_label: Option<String>,
    pub(crate) date: Option<String>,
    pub(crate) dry_run: bool,
}

pub(crate) fn run(
    path: &Path,
    sections: &Sections,
    repo: Option<RepoUrls>,
    options: &Options,
) -> Result<()> {
    let mut changelog = load_changelog(path)?;

    let mut changes = changes_from_messages(&options.messages, sections);
    if changes.is_empty() && options.version.is_none() {
        return Err(Error::NoChanges.into());
    }

    let previous = changelog.latest_version();
    let version = next_version(
        &changelog,
        &changes,
        options.rule,
        options.version.as_deref(),
        options.pre_label.as_deref(),
    )?;

    let date = match options.date.as_deref() {
        Some(date) => parse_date(date)?,
        None => OffsetDateTime::now_utc().date(),
    };

    let compare = match &repo {
        Some(repo) => {
            changes = changes
                .into_iter()
                .map(|change| change.linked(repo))
                .collect();
            Some(repo.compare(previous.as_ref(), &version))
        }
        None => None,
    };

    let release = Release::new(version.clone(), Some(date), compare, &changes, sections);
    let diff = changelog.with_release(&release);
    info!(
        "recording {version} in {path}",
        path = path.display()
    );

    let write = if options.dry_run {
        fs::WriteType::DryRun(diff.as_str())
    } else {
        fs::WriteType::Real(changelog.content.as_str())
    };
    fs::write(write, path)?;

    if !options.dry_run {
        println!("{version}");
    }
    Ok(())
}

fn parse_date(text: &str) -> Result<Date, Error> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(text, format).map_err(|_| Error::Date(text.to_string()))
}

#[derive(Debug, Diagnostic, Error)]
enum Error {
    #[error("none of the messages describe a change")]
    #[diagnostic(
        code(add::no_changes),
        help(
            "Messages must be conventional commits whose type maps to a changelog \
             section, like `feat: add an endpoint` or `fix(docker): correct the tag`. \
             Alternatively, pass --version to record an empty release."
        )
    )]
    NoChanges,
    #[error("`{0}` is not a date of the form YYYY-MM-DD")]
    #[diagnostic(code(add::date))]
    Date(String),
}
