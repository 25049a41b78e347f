// SPDX-License-Identifier: MIT OR Apache-2.0

//! serializable shapes for machine-readable output.

use serde::Serialize;

use crate::{Catalog, DownloadSelector, Edition, MajorGroup, OsClass, Version};

/// versions of one major release line.
#[derive(Debug, Clone, Serialize)]
pub struct GroupListing {
    pub label: String,
    pub major: u64,
    pub versions: Vec<Version>,
}

impl From<MajorGroup> for GroupListing {
    fn from(group: MajorGroup) -> Self {
        Self {
            label: group.label(),
            major: group.major,
            versions: group.versions,
        }
    }
}

/// the catalog as listed by the cli.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogListing {
    pub latest: Option<Version>,
    pub count: usize,
    pub groups: Vec<GroupListing>,
}

impl CatalogListing {
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            latest: catalog.latest().cloned(),
            count: catalog.len(),
            groups: crate::group_by_major(catalog)
                .into_iter()
                .map(GroupListing::from)
                .collect(),
        }
    }
}

/// a resolved download link.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedDownload {
    pub version: Version,
    pub os: OsClass,
    pub edition: Edition,
    pub label: String,
    pub url: String,
}

impl From<&DownloadSelector> for ResolvedDownload {
    fn from(selector: &DownloadSelector) -> Self {
        Self {
            version: selector.version.clone(),
            os: selector.os,
            edition: selector.edition,
            label: selector.label(),
            url: selector.download_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_groups_seed() {
        let listing = CatalogListing::new(&Catalog::seed());
        assert_eq!(listing.latest.as_ref().map(Version::as_str), Some("12.3.1"));
        assert_eq!(listing.groups[0].label, "Version 12.x");
        assert_eq!(listing.groups.last().map(|g| g.major), Some(9));
        assert_eq!(
            listing.groups.iter().map(|g| g.versions.len()).sum::<usize>(),
            listing.count
        );
    }

    #[test]
    fn test_resolved_download_json() {
        let selector = DownloadSelector::parse("11.0.12", "mac_arm", "suite").unwrap();
        let json = serde_json::to_value(ResolvedDownload::from(&selector)).unwrap();

        assert_eq!(json["version"], "11.0.12");
        assert_eq!(json["os"], "mac_arm");
        assert_eq!(json["edition"], "suite");
        assert!(json["url"].as_str().unwrap().ends_with("_64.dmg"));
    }

    #[test]
    fn test_json_output_envelope() {
        let ok = serde_json::to_string(&JsonOutput::ok(1)).unwrap();
        assert_eq!(ok, r#"{"success":true,"data":1}"#);

        let err = serde_json::to_string(&JsonOutput::<()>::err("nope")).unwrap();
        assert_eq!(err, r#"{"success":false,"error":"nope"}"#);
    }
}
