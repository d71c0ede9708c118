//! Locator table: logical targets mapped to structural element paths.
//!
//! The workflow only ever names a [`Target`]; the raw paths live here so the
//! page can be re-targeted without touching the interaction logic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Every element the portal workflow interacts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Username,
    Password,
    FeatureEntry,
    LookupInput,
    LookupSubmit,
    ResultIndicator,
    DetailTrigger,
    DocumentTrigger,
}

impl Target {
    pub const ALL: [Target; 8] = [
        Target::Username,
        Target::Password,
        Target::FeatureEntry,
        Target::LookupInput,
        Target::LookupSubmit,
        Target::ResultIndicator,
        Target::DetailTrigger,
        Target::DocumentTrigger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Username => "username",
            Target::Password => "password",
            Target::FeatureEntry => "feature_entry",
            Target::LookupInput => "lookup_input",
            Target::LookupSubmit => "lookup_submit",
            Target::ResultIndicator => "result_indicator",
            Target::DetailTrigger => "detail_trigger",
            Target::DocumentTrigger => "document_trigger",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named structural path. The path is opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    name: String,
    path: String,
}

impl Locator {
    pub fn new(target: Target, path: impl Into<String>) -> Self {
        Self {
            name: target.as_str().to_string(),
            path: path.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The enclosing element: the path with its last step removed.
    ///
    /// Returns `None` for single-step and descendant-anchored paths, where
    /// dropping a step would not address the structural parent.
    pub fn parent(&self) -> Option<Locator> {
        let (head, _) = self.path.rsplit_once('/')?;
        if head.is_empty() || head.ends_with('/') {
            return None;
        }
        Some(Locator {
            name: format!("{} (parent)", self.name),
            path: head.to_string(),
        })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.path)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocatorError {
    #[error("locator table is missing '{0}'")]
    Missing(Target),

    #[error("locator '{0}' has an empty path")]
    EmptyPath(Target),
}

const BUILTIN: [(Target, &str); 8] = [
    (
        Target::Username,
        "/html/body/form/div/div/table/tbody/tr[2]/td[2]/div/div/div[1]/table/tbody/tr[1]/td[2]/input",
    ),
    (
        Target::Password,
        "/html/body/form/div/div/table/tbody/tr[2]/td[2]/div/div/div[1]/table/tbody/tr[2]/td[2]/input",
    ),
    (
        Target::FeatureEntry,
        "/html/body/div/div/span/div/form/div[2]/div[13]/form/div[2]/div/span/table/tbody/tr/td/div[2]/form/div/span/div/table/tbody/tr[2]/td[2]/div/div/div/table/tbody/tr[5]/td/table/tbody/tr/td[2]/a/span",
    ),
    (
        Target::LookupInput,
        "/html/body/table/tbody/tr/td/center/div/form/div[2]/table/tbody/tr/td/div/table/tbody/tr[2]/td/div/table/tbody/tr/td/div/table/tbody/tr[2]/td[4]/div/input",
    ),
    (
        Target::LookupSubmit,
        "/html/body/table/tbody/tr/td/center/div/form/div[2]/table/tbody/tr/td/div/table/tbody/tr[3]/td/div/table/tbody/tr/td[7]/div/input",
    ),
    (
        Target::ResultIndicator,
        "/html/body/table/tbody/tr/td/center/div/form/div[2]/div/table/tbody/tr/td/div/table/tbody/tr[2]/td/div/table/tbody/tr/td/div/table/tbody/tr[2]/td/table/tbody/tr/td/table/tbody/tr[1]/td[7]/div",
    ),
    (
        Target::DetailTrigger,
        "/html/body/table/tbody/tr/td/center/div/form/div[2]/div/table/tbody/tr/td/div/table/tbody/tr[2]/td/div/table/tbody/tr/td/div/table/tbody/tr[2]/td/table/tbody/tr/td/table/tbody/tr[2]/td[8]/div/input",
    ),
    (
        Target::DocumentTrigger,
        "/html/body/table/tbody/tr/td/center/div/form/div[2]/table/tbody/tr/td/div/table/tbody/tr[2]/td/div/table/tbody/tr[9]/td/div/table/tbody/tr/td/div/table/tbody/tr[2]/td/table/tbody/tr/td/table/tbody/tr[3]/td[2]/div/input",
    ),
];

/// Immutable, complete mapping from [`Target`] to [`Locator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorTable {
    entries: Vec<Locator>,
}

impl LocatorTable {
    /// Paths for the portal's current page structure.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN
                .iter()
                .map(|(target, path)| Locator::new(*target, *path))
                .collect(),
        }
    }

    /// Build a table from a map that must name every target.
    pub fn from_paths(paths: &BTreeMap<Target, String>) -> Result<Self, LocatorError> {
        let entries = Target::ALL
            .iter()
            .map(|target| {
                let path = paths.get(target).ok_or(LocatorError::Missing(*target))?;
                checked(*target, path)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Replace some paths of this table, keeping the rest.
    pub fn with_overrides(mut self, paths: &BTreeMap<Target, String>) -> Result<Self, LocatorError> {
        for (target, path) in paths {
            self.entries[target.index()] = checked(*target, path)?;
        }
        Ok(self)
    }

    pub fn get(&self, target: Target) -> &Locator {
        &self.entries[target.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Target, &Locator)> {
        Target::ALL.iter().copied().zip(self.entries.iter())
    }
}

impl Default for LocatorTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn checked(target: Target, path: &str) -> Result<Locator, LocatorError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(LocatorError::EmptyPath(target));
    }
    Ok(Locator::new(target, trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_covers_every_target_in_order() {
        let table = LocatorTable::builtin();
        for (target, locator) in table.iter() {
            assert_eq!(locator.name(), target.as_str());
            assert!(locator.path().starts_with("/html/body/"));
        }
        assert_eq!(table.iter().count(), Target::ALL.len());
    }

    #[test]
    fn parent_drops_last_step() {
        let table = LocatorTable::builtin();
        let entry = table.get(Target::FeatureEntry);
        let parent = entry.parent().unwrap();
        assert!(entry.path().ends_with("/a/span"));
        assert!(parent.path().ends_with("/a"));
        assert_eq!(parent.name(), "feature_entry (parent)");
    }

    #[test]
    fn parent_of_shallow_or_descendant_path_is_none() {
        assert!(Locator::new(Target::Username, "/html").parent().is_none());
        assert!(Locator::new(Target::Username, "//span").parent().is_none());
        assert!(Locator::new(Target::Username, "span").parent().is_none());
    }

    #[test]
    fn from_paths_requires_every_target() {
        let mut paths: BTreeMap<Target, String> = Target::ALL
            .iter()
            .map(|t| (*t, format!("//*[@id='{}']", t)))
            .collect();
        let table = LocatorTable::from_paths(&paths).unwrap();
        assert_eq!(table.get(Target::DetailTrigger).path(), "//*[@id='detail_trigger']");

        paths.remove(&Target::DocumentTrigger);
        assert_eq!(
            LocatorTable::from_paths(&paths).unwrap_err(),
            LocatorError::Missing(Target::DocumentTrigger)
        );
    }

    #[test]
    fn overrides_replace_selected_paths_and_reject_blanks() {
        let mut overrides = BTreeMap::new();
        overrides.insert(Target::LookupInput, " //input[@name='key'] ".to_string());
        let table = LocatorTable::builtin().with_overrides(&overrides).unwrap();
        assert_eq!(table.get(Target::LookupInput).path(), "//input[@name='key']");
        assert_eq!(
            table.get(Target::Username),
            LocatorTable::builtin().get(Target::Username)
        );

        overrides.insert(Target::Password, "   ".to_string());
        assert_eq!(
            LocatorTable::builtin().with_overrides(&overrides).unwrap_err(),
            LocatorError::EmptyPath(Target::Password)
        );
    }
}
