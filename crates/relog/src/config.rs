use std::path::{Path, PathBuf};

use miette::Diagnostic;
use relative_path::RelativePathBuf;
use relog_changelog::{
    RepoUrls, SectionName, Sections,
    changes::{ChangeType, CustomType},
};
use serde::Deserialize;
use thiserror::Error;

use crate::fs;

const DEFAULT_PATH: &str = "relog.toml";

/// Optional project configuration: where the changelog lives, the forge to
/// link to, and any non-default changelog sections.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    /// Path to the changelog document, relative to the working directory.
    changelog: Option<RelativePathBuf>,
    /// Base URL of the repository, used to build compare/issue/commit links.
    repository: Option<String>,
    #[serde(default)]
    extra_sections: Vec<ExtraSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ExtraSection {
    name: SectionName,
    #[serde(default)]
    types: Vec<String>,
}

/// Read configuration from `path`, or from `relog.toml` when present.
pub(crate) fn load(path: Option<&Path>) -> Result<Config, Error> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_PATH);
            if !default.exists() {
                return Ok(Config::default());
            }
            default
        }
    };
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|source| Error::Parse { path, source })
}

impl Config {
    pub(crate) fn changelog_path(&self) -> Option<PathBuf> {
        self.changelog
            .as_ref()
            .map(|changelog| changelog.to_path(""))
    }

    pub(crate) fn repo_urls(&self) -> Option<RepoUrls> {
        self.repository
            .as_deref()
            .map(RepoUrls::new)
    }

    pub(crate) fn sections(&self) -> Sections {
        if self.extra_sections.is_empty() {
            return Sections::default();
        }
        Sections::with_extras(self.extra_sections.iter().map(|section| {
            let types = section
                .types
                .iter()
                .map(|change_type| match change_type.as_str() {
                    "breaking" => ChangeType::Breaking,
                    "feature" | "feat" => ChangeType::Feature,
                    "fix" => ChangeType::Fix,
                    custom => ChangeType::Custom(CustomType::from(custom)),
                })
                .collect();
            (section.name.clone(), types)
        }))
    }
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Read(#[from] fs::Error),
    #[error("Invalid configuration in {path}: {source}")]
    #[diagnostic(
        code(config::parse),
        help(
            "The configuration file accepts `changelog`, `repository`, and \
             `[[extra_sections]]` entries with a `name` and a list of `types`."
        )
    )]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
