use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub use changelog::{Changelog, ReleaseNotes, TitleError};
pub use release::{Release, Section};

use crate::changes::{ChangeType, CustomType};

pub(crate) mod changelog;
pub(crate) mod release;

/// The name of one change category, e.g. `Bug Fixes`.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[repr(transparent)]
pub struct SectionName(String);

impl SectionName {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SectionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The ordered mapping from section names to the change types they collect.
///
/// The defaults mirror what conventional release tooling emits; extra
/// sections can claim types from the defaults or add their own.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sections(pub Vec<(SectionName, Vec<ChangeType>)>);

impl Default for Sections {
    fn default() -> Self {
        Self(vec![
            (SectionName::from("Features"), vec![ChangeType::Feature]),
            (SectionName::from("Bug Fixes"), vec![ChangeType::Fix]),
            (
                SectionName::from("Performance Improvements"),
                vec![ChangeType::Custom(CustomType::from("perf"))],
            ),
            (
                SectionName::from("Reverts"),
                vec![ChangeType::Custom(CustomType::from("revert"))],
            ),
            (
                SectionName::from("BREAKING CHANGES"),
                vec![ChangeType::Breaking],
            ),
        ])
    }
}

impl Sections {
    pub fn iter(&self) -> impl Iterator<Item = &(SectionName, Vec<ChangeType>)> {
        self.0.iter()
    }

    /// The custom change type for a conventional-commit type some section
    /// collects, e.g. `perf`.
    #[must_use]
    pub fn custom_type(&self, commit_type: &str) -> Option<CustomType> {
        self.0
            .iter()
            .flat_map(|(_, types)| types)
            .find_map(|change_type| match change_type {
                ChangeType::Custom(custom) if custom.0 == commit_type => Some(custom.clone()),
                _ => None,
            })
    }

    /// The change type recorded under a section header with this name.
    #[must_use]
    pub fn change_type_for(&self, name: &str) -> Option<ChangeType> {
        self.0
            .iter()
            .find(|(section_name, _)| section_name.as_str() == name)
            .and_then(|(_, types)| types.first().cloned())
    }

    /// Extend the defaults with configured sections. An extra section claims
    /// its change types from the defaults; a section that ends up collecting
    /// nothing is dropped; an extra with an already-used name merges into it.
    #[must_use]
    pub fn with_extras(extras: impl IntoIterator<Item = (SectionName, Vec<ChangeType>)>) -> Self {
        let mut sections = Self::default().0;
        for (name, types) in extras {
            for (_, existing) in &mut sections {
                existing.retain(|change_type| !types.contains(change_type));
            }
            sections.retain(|(_, existing)| !existing.is_empty());
            if let Some((_, existing)) = sections
                .iter_mut()
                .find(|(existing_name, _)| *existing_name == name)
            {
                existing.extend(types);
            } else {
                sections.push((name, types));
            }
        }
        Self(sections)
    }

    /// The configured name for a change type, if any section collects it.
    #[must_use]
    pub fn name_for(&self, change_type: &ChangeType) -> Option<&SectionName> {
        self.0
            .iter()
            .find(|(_, types)| types.contains(change_type))
            .map(|(name, _)| name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test_sections {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_order() {
        let names = Sections::default()
            .iter()
            .map(|(name, _)| name.to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            [
                "Features",
                "Bug Fixes",
                "Performance Improvements",
                "Reverts",
                "BREAKING CHANGES"
            ]
        );
    }

    #[test]
    fn extras_claim_types() {
        let sections = Sections::with_extras([(
            SectionName::from("Notable Changes"),
            vec![ChangeType::Breaking, ChangeType::Feature],
        )]);
        assert_eq!(
            sections.name_for(&ChangeType::Breaking).unwrap().as_str(),
            "Notable Changes"
        );
        assert_eq!(
            sections.name_for(&ChangeType::Feature).unwrap().as_str(),
            "Notable Changes"
        );
        // Claimed-out defaults are gone entirely.
        assert!(
            sections
                .iter()
                .all(|(name, _)| name.as_str() != "Features" && name.as_str() != "BREAKING CHANGES")
        );
        // Untouched defaults keep their place.
        assert_eq!(
            sections.change_type_for("Bug Fixes"),
            Some(ChangeType::Fix)
        );
    }

    #[test]
    fn extras_merge_into_same_name() {
        let sections = Sections::with_extras([(
            SectionName::from("Bug Fixes"),
            vec![ChangeType::Custom(CustomType::from("hotfix"))],
        )]);
        let (_, types) = sections
            .iter()
            .find(|(name, _)| name.as_str() == "Bug Fixes")
            .unwrap();
        assert_eq!(
            types,
            &vec![
                ChangeType::Fix,
                ChangeType::Custom(CustomType::from("hotfix"))
            ]
        );
    }

    #[test]
    fn custom_type_lookup() {
        let sections = Sections::default();
        assert_eq!(sections.custom_type("perf"), Some(CustomType::from("perf")));
        assert_eq!(sections.custom_type("docs"), None);
    }
}
