// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, Version};

/// known releases, newest first. served whenever the backend holds no catalog.
const SEED_VERSIONS: &[&str] = &[
    "12.3.1", "12.3", "12.2.7", "12.2.6", "12.2.5", "12.2.2", "12.2.1", "12.2", "12.1.11",
    "12.1.10", "12.1.9", "12.1.8", "12.1.7", "12.1.6", "12.1.5", "12.1.4", "12.1.3", "12.1.2",
    "12.1.1", "12.1", "12.0.25", "12.0.20", "12.0.12", "12.0.11", "12.0.10", "12.0.9", "12.0.8",
    "12.0.7", "12.0.6", "12.0.5", "12.0.4", "12.0.3", "12.0.2", "12.0.1", "12.0", "11.3.43",
    "11.3.42", "11.3.35", "11.3.30", "11.3.20", "11.3.13", "11.3.12", "11.3.11", "11.3.10",
    "11.3.4", "11.3.3", "11.3.2", "11.2.11", "11.2.10", "11.2.7", "11.2.6", "11.2.5", "11.2",
    "11.1.5", "11.1.1", "11.1", "11.0.12", "11.0.11", "11.0.10", "11.0.6", "11.0.5", "11.0.2",
    "11.0.1", "11.0", "10.1.30", "10.1.25", "10.1.18", "10.1.17", "10.1.15", "10.1.14",
    "10.1.13", "10.1.9", "10.1.7", "10.1.6", "10.1.5", "10.1.4", "10.1.3", "10.1.2", "10.1.1",
    "10.1", "10.0.6", "10.0.5", "10.0.4", "10.0.3", "10.0.2", "10.0.1", "10.0", "9.7.7",
    "9.7.6", "9.7.5", "9.7.4", "9.7.3", "9.7.2", "9.7.1", "9.7", "9.6.2", "9.6.1", "9.6",
    "9.5", "9.2.3", "9.2.2", "9.2.1", "9.2", "9.1.10", "9.1.9", "9.1.8", "9.1.7", "9.1.6",
    "9.1.5", "9.1.4", "9.1.3", "9.1.2", "9.1", "9.0.6", "9.0.5", "9.0.4", "9.0.3", "9.0.2",
    "9.0.1",
];

/// ordered set of known releases.
///
/// entries are unique under normalized equality; building a catalog from a
/// sequence with duplicates keeps the first occurrence. order is whatever the
/// producer chose, newest first by convention.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Version>", into = "Vec<Version>")]
pub struct Catalog {
    versions: Vec<Version>,
}

impl Catalog {
    pub fn new(versions: impl IntoIterator<Item = Version>) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();

        for version in versions {
            if seen.insert(version.clone()) {
                unique.push(version);
            } else {
                log::debug!("**catalog:** dropping duplicate entry {version}");
            }
        }

        Self { versions: unique }
    }

    /// the hardcoded fallback catalog.
    pub fn seed() -> Self {
        Self::new(
            SEED_VERSIONS
                .iter()
                .filter_map(|v| Version::parse(v).ok()),
        )
    }

    /// validates a raw catalog payload: a json array whose elements are all
    /// version strings. nothing else is accepted.
    pub fn from_json_str(payload: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|e| Error::payload(format!("body is not valid json: {e}")))?;

        let serde_json::Value::Array(items) = value else {
            return Err(Error::payload("expected a json array of version strings"));
        };

        let versions = items
            .iter()
            .map(|item| {
                let text = item
                    .as_str()
                    .ok_or_else(|| Error::payload(format!("expected a version string, got {item}")))?;
                Version::parse(text)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(versions))
    }

    pub fn to_json(&self) -> String {
        // a list of strings always serializes
        serde_json::to_string(&self.versions).unwrap_or_else(|_| "[]".to_string())
    }

    /// membership under normalized equality, so `11.0.0` is found in a catalog holding `11.0`.
    pub fn contains(&self, version: &Version) -> bool {
        self.versions.contains(version)
    }

    /// returns a catalog with `version` in front of the current entries.
    /// the catalog is returned unchanged if it already knows the version.
    pub fn with_newest(&self, version: Version) -> Self {
        if self.contains(&version) {
            return self.clone();
        }

        let mut versions = Vec::with_capacity(self.versions.len() + 1);
        versions.push(version);
        versions.extend(self.versions.iter().cloned());
        Self { versions }
    }

    pub fn sort_newest_first(&mut self) {
        self.versions.sort_by(|a, b| b.cmp(a));
    }

    /// the highest version in the catalog regardless of position.
    pub fn latest(&self) -> Option<&Version> {
        self.versions.iter().max()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Version> {
        self.versions.iter()
    }

    pub fn as_slice(&self) -> &[Version] {
        &self.versions
    }
}

impl From<Vec<Version>> for Catalog {
    fn from(versions: Vec<Version>) -> Self {
        Self::new(versions)
    }
}

impl From<Catalog> for Vec<Version> {
    fn from(catalog: Catalog) -> Self {
        catalog.versions
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Version;
    type IntoIter = std::slice::Iter<'a, Version>;

    fn into_iter(self) -> Self::IntoIter {
        self.versions.iter()
    }
}

/// releases sharing one major number, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MajorGroup {
    pub major: u64,
    pub versions: Vec<Version>,
}

impl MajorGroup {
    /// section title as shown in the version picker.
    pub fn label(&self) -> String {
        format!("Version {}.x", self.major)
    }
}

/// partitions a catalog by major number. groups come highest major first,
/// members keep the order they have in the catalog.
pub fn group_by_major(catalog: &Catalog) -> Vec<MajorGroup> {
    let mut groups: Vec<MajorGroup> = Vec::new();

    for version in catalog {
        match groups.iter_mut().find(|g| g.major == version.major()) {
            Some(group) => group.versions.push(version.clone()),
            None => groups.push(MajorGroup {
                major: version.major(),
                versions: vec![version.clone()],
            }),
        }
    }

    groups.sort_by(|a, b| b.major.cmp(&a.major));
    groups
}
