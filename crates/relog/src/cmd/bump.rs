use std::path::Path;

use miette::Result;
use relog_changelog::Sections;

use crate::{
    RuleArg,
    cmd::{changes_from_messages, load_changelog, next_version},
};

pub(crate) fn run(
    path: &Path,
    sections: &Sections,
    messages: &[String],
    rule: Option<RuleArg>,
    pre_label: Option<&str>,
) -> Result<()> {
    let changelog = load_changelog(path)?;
    let changes = changes_from_messages(messages, sections);
    let version = next_version(&changelog, &changes, rule, None, pre_label)?;
    println!("{version}");
    Ok(())
}
