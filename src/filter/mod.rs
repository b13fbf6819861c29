//! Multi-select filtering of the inventory table.

use std::collections::BTreeSet;

use crate::entity::FilamentRecord;

/// Values chosen in the color, company and type filter controls.
///
/// An empty set places no constraint on its field.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    pub colors: BTreeSet<String>,
    pub companies: BTreeSet<String>,
    pub types: BTreeSet<String>,
}

impl Selection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the selection has any constraints.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty() && self.companies.is_empty() && self.types.is_empty()
    }

    /// Build a selection from repeated `color`, `company` and `type` query
    /// parameters. Unknown keys and blank values are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut selection = Self::default();
        for (key, value) in pairs {
            let value = value.as_ref();
            if value.is_empty() {
                continue;
            }
            let set = match key.as_ref() {
                "color" => &mut selection.colors,
                "company" => &mut selection.companies,
                "type" => &mut selection.types,
                _ => continue,
            };
            set.insert(value.to_string());
        }
        selection
    }

    /// Whether `record` satisfies every non-empty field constraint.
    pub fn matches(&self, record: &FilamentRecord) -> bool {
        allows(&self.colors, &record.color)
            && allows(&self.companies, &record.company)
            && allows(&self.types, &record.kind)
    }
}

fn allows(selected: &BTreeSet<String>, value: &str) -> bool {
    selected.is_empty() || selected.contains(value)
}

/// Records passing `selection`, in their original order.
pub fn filter(records: &[FilamentRecord], selection: &Selection) -> Vec<FilamentRecord> {
    records
        .iter()
        .filter(|r| selection.matches(r))
        .cloned()
        .collect()
}

/// Sorted distinct values offered by each filter control.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    pub colors: Vec<String>,
    pub companies: Vec<String>,
    pub types: Vec<String>,
}

impl FilterOptions {
    pub fn from_records(records: &[FilamentRecord]) -> Self {
        Self {
            colors: distinct(records, |r| r.color.as_str()),
            companies: distinct(records, |r| r.company.as_str()),
            types: distinct(records, |r| r.kind.as_str()),
        }
    }
}

fn distinct<'a, F>(records: &'a [FilamentRecord], field: F) -> Vec<String>
where
    F: Fn(&'a FilamentRecord) -> &'a str,
{
    records
        .iter()
        .map(field)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}
