// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// number of components that take part in ordering.
const MAX_COMPONENTS: usize = 3;

/// a dotted-numeral release identifier such as `12.3.1`, `11.0` or `9`.
///
/// the string is kept exactly as written since download urls embed it,
/// while equality, hashing and ordering use the `(major, minor, patch)` key
/// with missing components treated as 0. `11.0` and `11.0.0` are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    raw: String,
    key: [u64; MAX_COMPONENTS],
}

impl Version {
    /// parses a version written as 1 to 3 non-negative integer components.
    pub fn parse(input: &str) -> Result<Self> {
        Self::try_from(input.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn major(&self) -> u64 {
        self.key[0]
    }

    pub fn minor(&self) -> u64 {
        self.key[1]
    }

    pub fn patch(&self) -> u64 {
        self.key[2]
    }

    /// resolved `(major, minor, patch)` tuple.
    pub fn key(&self) -> (u64, u64, u64) {
        (self.key[0], self.key[1], self.key[2])
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        let components = parse_components(&value)?;
        if components.len() > MAX_COMPONENTS {
            return Err(Error::version(format!(
                "{value}: expected at most {MAX_COMPONENTS} components"
            )));
        }
        Ok(Self {
            key: key_of(&components),
            raw: value,
        })
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.raw
    }
}

/// compares two version strings on their first three components.
///
/// components past the third are accepted but never affect the result.
/// empty or non-numeric components are a caller error.
pub fn compare(a: &str, b: &str) -> Result<Ordering> {
    let a = key_of(&parse_components(a)?);
    let b = key_of(&parse_components(b)?);
    Ok(a.cmp(&b))
}

/// extracts the version a piece of text starts with, e.g. `12.3.1` from
/// `12.3.1 Release Notes`. at most three components are taken.
pub fn parse_prefix(text: &str) -> Option<Version> {
    let text = text.trim();
    let bytes = text.as_bytes();

    let mut end = 0;
    let mut components = 0;

    loop {
        let start = end;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }

        if end == start {
            if components == 0 {
                return None;
            }
            // back off the dot that had no digits after it
            end = start - 1;
            break;
        }

        components += 1;
        if components == MAX_COMPONENTS || end >= bytes.len() || bytes[end] != b'.' {
            break;
        }
        end += 1;
    }

    Version::parse(&text[..end]).ok()
}

fn parse_components(input: &str) -> Result<Vec<u64>> {
    if input.is_empty() {
        return Err(Error::version("empty version string"));
    }

    input
        .split('.')
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::version(format!(
                    "{input}: component '{part}' is not a non-negative integer"
                )));
            }
            part.parse::<u64>()
                .map_err(|_| Error::version(format!("{input}: component '{part}' is too large")))
        })
        .collect()
}

fn key_of(components: &[u64]) -> [u64; MAX_COMPONENTS] {
    let mut key = [0; MAX_COMPONENTS];
    for (slot, value) in key.iter_mut().zip(components) {
        *slot = *value;
    }
    key
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn cmp(a: &str, b: &str) -> Ordering {
        compare(a, b).unwrap()
    }

    #[test]
    fn test_compare_missing_components_default_to_zero() {
        assert_eq!(cmp("11.0", "11.0.0"), Ordering::Equal);
        assert_eq!(cmp("12.3.1", "12.3"), Ordering::Greater);
        assert_eq!(cmp("9.7", "9.7.10"), Ordering::Less);
        assert_eq!(cmp("9", "9.0.0"), Ordering::Equal);
    }

    #[test]
    fn test_compare_is_numeric_not_lexical() {
        assert_eq!(cmp("12.1.10", "12.1.9"), Ordering::Greater);
        assert_eq!(cmp("10.0", "9.7.7"), Ordering::Greater);
    }

    #[test]
    fn test_compare_ignores_components_past_third() {
        assert_eq!(cmp("11.0.12.5", "11.0.12"), Ordering::Equal);
        assert_eq!(cmp("11.0.12.1", "11.0.12.9"), Ordering::Equal);
        assert_eq!(cmp("11.0.13.0", "11.0.12.99"), Ordering::Greater);
    }

    #[test]
    fn test_compare_rejects_non_numeric() {
        assert!(compare("12.x", "12.0").is_err());
        assert!(compare("12.0", "").is_err());
        assert!(compare("12..1", "12.0").is_err());
    }

    #[test]
    fn test_compare_antisymmetric_and_transitive() {
        let samples = [
            "9", "9.0.1", "9.7", "9.7.10", "10.1.30", "11.0", "11.0.0", "11.0.12", "11.0.13",
            "12.3", "12.3.1", "12.3.1.4",
        ];

        for a in samples {
            for b in samples {
                assert_eq!(cmp(a, b), cmp(b, a).reverse(), "{a} vs {b}");
                for c in samples {
                    if cmp(a, b) != Ordering::Greater && cmp(b, c) != Ordering::Greater {
                        assert_ne!(cmp(a, c), Ordering::Greater, "{a} <= {b} <= {c}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_parse_accepts_one_to_three_components() {
        assert_eq!(Version::parse("9").unwrap().key(), (9, 0, 0));
        assert_eq!(Version::parse("11.0").unwrap().key(), (11, 0, 0));
        assert_eq!(Version::parse("12.3.1").unwrap().key(), (12, 3, 1));
        assert_eq!(Version::parse("12.03").unwrap().key(), (12, 3, 0));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["", "12.3.1.4", "12.", ".12", "12..1", "-1", "1.x", " 12", "12 ", "v12"] {
            assert!(Version::parse(input).is_err(), "{input:?} should be rejected");
        }
        assert!(Version::parse("99999999999999999999999").is_err());
    }

    #[test]
    fn test_equality_is_normalized_but_text_is_kept() {
        let short = Version::parse("11.0").unwrap();
        let long = Version::parse("11.0.0").unwrap();

        assert_eq!(short, long);
        assert_eq!(short.to_string(), "11.0");
        assert_eq!(long.as_str(), "11.0.0");

        let set: HashSet<_> = [short, long].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_parse_prefix() {
        assert_eq!(parse_prefix("12.3.1 Release Notes").unwrap().as_str(), "12.3.1");
        assert_eq!(parse_prefix("  12.3 (Beta)").unwrap().as_str(), "12.3");
        assert_eq!(parse_prefix("12.3.").unwrap().as_str(), "12.3");
        assert_eq!(parse_prefix("12.3.1.4").unwrap().as_str(), "12.3.1");
        assert_eq!(parse_prefix("12").unwrap().as_str(), "12");
        assert!(parse_prefix("Live 12.3.1").is_none());
        assert!(parse_prefix(".5 hotfix").is_none());
        assert!(parse_prefix("").is_none());
    }

    #[test]
    fn test_serde_keeps_written_form() {
        let version: Version = serde_json::from_str("\"11.0\"").unwrap();
        assert_eq!(version.key(), (11, 0, 0));
        assert_eq!(serde_json::to_string(&version).unwrap(), "\"11.0\"");
        assert!(serde_json::from_str::<Version>("\"eleven\"").is_err());
    }
}
