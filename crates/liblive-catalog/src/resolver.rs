// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, Version};

const DOWNLOAD_BASE_URL: &str = "https://cdn-downloads.ableton.com/channels";
const PRODUCT_PREFIX: &str = "ableton_live";

/// last release packaged with the single `_64.dmg` macOS build. releases
/// strictly newer than this ship separate intel and universal images.
/// unrelated to whatever the latest release is.
pub const MAC_PACKAGING_BOUNDARY: (u64, u64, u64) = (11, 0, 12);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsClass {
    Windows,
    MacIntel,
    MacArm,
}

impl OsClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::MacIntel => "mac_intel",
            Self::MacArm => "mac_arm",
        }
    }

    pub const fn is_mac(self) -> bool {
        matches!(self, Self::MacIntel | Self::MacArm)
    }

    pub const fn all() -> &'static [OsClass] {
        &[Self::Windows, Self::MacIntel, Self::MacArm]
    }

    /// guesses the download platform from a browser user agent string.
    /// anything that is not a mac gets the windows build.
    pub fn from_user_agent(user_agent: &str) -> Self {
        if !user_agent.contains("Macintosh") {
            return Self::Windows;
        }

        // most browsers report "Intel Mac OS X" on apple silicon too
        const APPLE_SILICON_HINTS: &[&str] = &["MacARM64", "ARM64", "Apple Silicon"];
        if APPLE_SILICON_HINTS.iter().any(|h| user_agent.contains(h)) {
            Self::MacArm
        } else {
            Self::MacIntel
        }
    }

    /// platform of the machine this binary was built for.
    pub const fn host() -> Self {
        if cfg!(all(target_os = "macos", target_arch = "aarch64")) {
            Self::MacArm
        } else if cfg!(target_os = "macos") {
            Self::MacIntel
        } else {
            Self::Windows
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::MacIntel => "macOS (Intel)",
            Self::MacArm => "macOS (Apple Silicon)",
        }
    }
}

impl fmt::Display for OsClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|os| os.as_str() == s)
            .ok_or_else(|| {
                Error::selector(format!(
                    "unknown os '{s}', expected one of: windows, mac_intel, mac_arm"
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edition {
    Intro,
    Standard,
    Suite,
    Lite,
    Trial,
}

impl Edition {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::Standard => "standard",
            Self::Suite => "suite",
            Self::Lite => "lite",
            Self::Trial => "trial",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Intro => "Intro",
            Self::Standard => "Standard",
            Self::Suite => "Suite",
            Self::Lite => "Lite",
            Self::Trial => "Trial",
        }
    }

    pub const fn all() -> &'static [Edition] {
        &[
            Self::Intro,
            Self::Standard,
            Self::Suite,
            Self::Lite,
            Self::Trial,
        ]
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Edition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|edition| edition.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::all().iter().map(|e| e.as_str()).collect();
                Error::selector(format!(
                    "unknown edition '{s}', expected one of: {}",
                    known.join(", ")
                ))
            })
    }
}

/// a release, platform and edition chosen for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSelector {
    pub version: Version,
    pub os: OsClass,
    pub edition: Edition,
}

impl DownloadSelector {
    pub fn new(version: Version, os: OsClass, edition: Edition) -> Self {
        Self {
            version,
            os,
            edition,
        }
    }

    /// validates all three parts before anything is built.
    pub fn parse(version: &str, os: &str, edition: &str) -> Result<Self> {
        Ok(Self {
            version: Version::parse(version)?,
            os: os.parse()?,
            edition: edition.parse()?,
        })
    }

    pub fn download_url(&self) -> String {
        let version = self.version.as_str();
        format!(
            "{DOWNLOAD_BASE_URL}/{version}/{PRODUCT_PREFIX}_{edition}_{version}{suffix}",
            edition = self.edition.as_str(),
            suffix = self.package_suffix(),
        )
    }

    /// link text for the resolved download.
    pub fn label(&self) -> String {
        format!(
            "Download Ableton Live {} {}",
            self.edition.display_name(),
            self.version
        )
    }

    fn package_suffix(&self) -> &'static str {
        match self.os {
            OsClass::Windows => "_64.zip",
            os if os.is_mac() && self.version.key() <= MAC_PACKAGING_BOUNDARY => "_64.dmg",
            OsClass::MacIntel => "_intel.dmg",
            OsClass::MacArm => "_universal.dmg",
        }
    }
}

/// resolves the download url for a version, os class and edition.
pub fn resolve(version: &str, os: &str, edition: &str) -> Result<String> {
    DownloadSelector::parse(version, os, edition).map(|s| s.download_url())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_release_uses_legacy_mac_suffix() {
        assert_eq!(
            resolve("11.0.12", "mac_intel", "suite").unwrap(),
            "https://cdn-downloads.ableton.com/channels/11.0.12/ableton_live_suite_11.0.12_64.dmg"
        );
        assert!(resolve("11.0.12", "mac_arm", "suite").unwrap().ends_with("_64.dmg"));
        assert!(resolve("10.1.30", "mac_arm", "standard").unwrap().ends_with("_64.dmg"));
        assert!(resolve("11.0", "mac_intel", "suite").unwrap().ends_with("_64.dmg"));
    }

    #[test]
    fn test_newer_releases_split_mac_builds() {
        assert_eq!(
            resolve("11.0.13", "mac_intel", "suite").unwrap(),
            "https://cdn-downloads.ableton.com/channels/11.0.13/ableton_live_suite_11.0.13_intel.dmg"
        );
        assert_eq!(
            resolve("11.0.13", "mac_arm", "suite").unwrap(),
            "https://cdn-downloads.ableton.com/channels/11.0.13/ableton_live_suite_11.0.13_universal.dmg"
        );
        assert!(resolve("11.1", "mac_arm", "intro").unwrap().ends_with("_universal.dmg"));
    }

    #[test]
    fn test_windows_always_zip() {
        assert_eq!(
            resolve("10.1.30", "windows", "standard").unwrap(),
            "https://cdn-downloads.ableton.com/channels/10.1.30/ableton_live_standard_10.1.30_64.zip"
        );
        assert!(resolve("12.3.1", "windows", "lite").unwrap().ends_with("_64.zip"));
    }

    #[test]
    fn test_url_keeps_version_as_written() {
        let url = resolve("12.0", "windows", "suite").unwrap();
        assert_eq!(
            url,
            "https://cdn-downloads.ableton.com/channels/12.0/ableton_live_suite_12.0_64.zip"
        );
    }

    #[test]
    fn test_rejects_invalid_selectors() {
        for (version, os, edition) in [
            ("12.x", "windows", "suite"),
            ("12.3.1.4", "windows", "suite"),
            ("12.3.1", "linux", "suite"),
            ("12.3.1", "Windows", "suite"),
            ("12.3.1", "windows", "ultimate"),
            ("", "windows", "suite"),
        ] {
            let err = resolve(version, os, edition).unwrap_err();
            assert!(err.is_validation(), "{version} {os} {edition}: {err}");
        }
    }

    #[test]
    fn test_label() {
        let selector = DownloadSelector::parse("12.3.1", "mac_arm", "suite").unwrap();
        assert_eq!(selector.label(), "Download Ableton Live Suite 12.3.1");
    }

    #[test]
    fn test_os_from_user_agent() {
        let windows = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
        let intel = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15";
        let arm = "Mozilla/5.0 (Macintosh; MacARM64) AppleWebKit/605.1.15";
        let linux = "Mozilla/5.0 (X11; Linux x86_64)";

        assert_eq!(OsClass::from_user_agent(windows), OsClass::Windows);
        assert_eq!(OsClass::from_user_agent(arm), OsClass::MacArm);
        assert_eq!(OsClass::from_user_agent(linux), OsClass::Windows);
        assert_eq!(OsClass::from_user_agent(intel), OsClass::MacIntel);
    }

    #[test]
    fn test_selector_names_roundtrip() {
        for os in OsClass::all() {
            assert_eq!(os.as_str().parse::<OsClass>().unwrap(), *os);
        }
        for edition in Edition::all() {
            assert_eq!(edition.to_string().parse::<Edition>().unwrap(), *edition);
        }
        assert!(OsClass::MacArm.is_mac() && OsClass::MacIntel.is_mac());
        assert!(!OsClass::Windows.is_mac());
    }
}
