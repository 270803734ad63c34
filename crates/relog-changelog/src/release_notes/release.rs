use serde_json::{Value, json};
use time::Date;

use super::{SectionName, Sections};
use crate::{changes::Change, links::CompareLink, semver::Version};

/// One release entry: a version, its date, the header link, and the
/// categorized changes recorded under it. Entries are immutable history;
/// new ones are only ever prepended to the changelog.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Release {
    pub version: Version,
    pub date: Option<Date>,
    pub compare: Option<CompareLink>,
    pub sections: Vec<Section>,
}

/// One change category inside a release entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Section {
    pub name: SectionName,
    pub changes: Vec<Change>,
}

impl Release {
    /// Group `changes` into sections, in the configured section order.
    /// Changes whose type no section collects are dropped.
    #[must_use]
    pub fn new(
        version: Version,
        date: Option<Date>,
        compare: Option<CompareLink>,
        changes: &[Change],
        sections: &Sections,
    ) -> Self {
        let sections = sections
            .iter()
            .filter_map(|(name, types)| {
                let collected = changes
                    .iter()
                    .filter(|change| types.contains(&change.change_type))
                    .cloned()
                    .collect::<Vec<_>>();
                (!collected.is_empty()).then(|| Section {
                    name: name.clone(),
                    changes: collected,
                })
            })
            .collect();
        Self {
            version,
            date,
            compare,
            sections,
        }
    }

    /// The header text without the leading `#`s, e.g.
    /// `[1.4.0](…/compare/v1.3.2...v1.4.0) (2024-11-02)`.
    #[must_use]
    pub fn title(&self) -> String {
        let version = match &self.compare {
            Some(compare) => format!("[{version}]({url})", version = self.version, url = compare.url),
            None => self.version.to_string(),
        };
        match self.date {
            Some(date) => format!("{version} ({date})", date = format_date(date)),
            None => version,
        }
    }

    /// Render the whole entry with an H2 header and H3 sections, the layout
    /// release tooling appends to a changelog.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = format!("## {title}", title = self.title());
        for section in &self.sections {
            out.push_str("\n\n### ");
            out.push_str(section.name.as_str());
            out.push('\n');
            for change in &section.changes {
                out.push('\n');
                out.push_str(&change.to_markdown());
            }
        }
        out
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "version": self.version.to_string(),
            "date": self.date.map(format_date),
            "compare_url": self.compare.as_ref().map(|compare| compare.url.clone()),
            "sections": self.sections.iter().map(Section::to_json).collect::<Vec<_>>(),
        })
    }
}

impl Section {
    fn to_json(&self) -> Value {
        json!({
            "name": self.name.as_str(),
            "changes": self.changes.iter().map(|change| json!({
                "scope": change.scope,
                "description": change.description,
                "issue": change.issue.as_ref().map(|issue| json!({
                    "number": issue.number,
                    "url": issue.url,
                })),
                "commit": change.commit.as_ref().map(|commit| json!({
                    "short_hash": commit.short_hash,
                    "url": commit.url,
                })),
            })).collect::<Vec<_>>(),
        })
    }
}

/// `YEAR-MONTH-DAY`, zero-padded. `Date`'s own `Display` is explicitly
/// unstable, so spell it out.
pub(crate) fn format_date(date: Date) -> String {
    format!(
        "{year:04}-{month:02}-{day:02}",
        year = date.year(),
        month = u8::from(date.month()),
        day = date.day()
    )
}
