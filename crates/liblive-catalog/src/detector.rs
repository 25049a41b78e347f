// SPDX-License-Identifier: MIT OR Apache-2.0

use quick_xml::{Reader, events::Event};
use serde::Serialize;

use crate::{Catalog, CatalogStore, DocumentSource, Version, version};

const HEADING_TAGS: &[&str] = &["h2", "h3"];

/// elements whose content is not markup. stripped before scanning.
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// what happened to the catalog during a detector run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistStatus {
    /// the catalog already held the version, nothing was written.
    AlreadyKnown,
    /// the merged catalog was written.
    Saved,
    /// the version is new but the merged catalog was not written.
    SaveFailed(String),
}

/// result of one detector run.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionOutcome {
    pub version: Version,
    pub status: PersistStatus,
    /// catalog the session should continue with, merged in memory even when saving failed.
    #[serde(skip)]
    pub catalog: Catalog,
}

impl DetectionOutcome {
    pub fn is_new(&self) -> bool {
        self.status != PersistStatus::AlreadyKnown
    }

    pub fn is_saved(&self) -> bool {
        self.status == PersistStatus::Saved
    }
}

/// finds the newest published release on the release notes page and makes
/// sure the catalog lists it exactly once.
pub struct LatestVersionDetector<'a> {
    store: &'a dyn CatalogStore,
    source: &'a dyn DocumentSource,
    release_notes_url: String,
}

impl<'a> LatestVersionDetector<'a> {
    pub fn new(
        store: &'a dyn CatalogStore,
        source: &'a dyn DocumentSource,
        release_notes_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            source,
            release_notes_url: release_notes_url.into(),
        }
    }

    /// runs fetch, scrape, compare and merge once.
    ///
    /// returns `None` when no version could be detected; that is a normal
    /// outcome, not a failure. a failed save is reported in the outcome.
    pub fn run(&self) -> Option<DetectionOutcome> {
        let html = match self.source.fetch(&self.release_notes_url) {
            Ok(html) if !html.trim().is_empty() => html,
            Ok(_) => {
                log::warn!("**detector:** release notes document is empty");
                return None;
            }
            Err(e) => {
                log::warn!("**detector:** failed to fetch release notes: {e}");
                return None;
            }
        };

        let Some(version) = scrape_latest_version(&html) else {
            log::warn!("**detector:** no version found in release notes");
            return None;
        };
        log::info!("**detector:** latest version detected: {version}");

        let (current, loaded) = match self.store.load() {
            Ok(Some(catalog)) if !catalog.is_empty() => (catalog, true),
            Ok(_) => (Catalog::seed(), true),
            Err(e) => {
                log::warn!("**detector:** could not load catalog, comparing against seed: {e}");
                (Catalog::seed(), false)
            }
        };

        if current.contains(&version) {
            log::debug!("**detector:** {version} already in catalog");
            return Some(DetectionOutcome {
                version,
                status: PersistStatus::AlreadyKnown,
                catalog: current,
            });
        }

        let merged = current.with_newest(version.clone());

        // writing seed-based content would replace a catalog we could not see
        let status = if !loaded {
            PersistStatus::SaveFailed("current catalog unavailable, not overwriting it".to_string())
        } else {
            match self.store.write(&merged) {
                Ok(()) => {
                    log::info!("**detector:** new version {version} saved to catalog");
                    PersistStatus::Saved
                }
                Err(e) => {
                    log::warn!("**detector:** failed to save new version {version}: {e}");
                    PersistStatus::SaveFailed(e.to_string())
                }
            }
        };

        Some(DetectionOutcome {
            version,
            status,
            catalog: merged,
        })
    }
}

/// returns the version that the first `h2`/`h3` heading starts with.
///
/// the scan is lenient about html: end tags need not match, and markup the
/// reader cannot tokenize is skipped up to its closing `>`.
pub fn scrape_latest_version(html: &str) -> Option<Version> {
    let cleaned = strip_raw_text(html);

    let mut offset = 0;
    let mut depth = 0usize;
    let mut heading = String::new();

    while offset < cleaned.len() {
        let mut reader = Reader::from_str(&cleaned[offset..]);
        reader.config_mut().check_end_names = false;

        loop {
            let event_start = reader.buffer_position() as usize;

            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    if is_heading(e.name().as_ref()) {
                        if depth == 0 {
                            heading.clear();
                        }
                        depth += 1;
                    }
                }
                Ok(Event::End(e)) => {
                    if is_heading(e.name().as_ref()) && depth > 0 {
                        depth -= 1;
                        if depth == 0
                            && let Some(version) = version::parse_prefix(&heading)
                        {
                            return Some(version);
                        }
                    }
                }
                Ok(Event::Text(e)) if depth > 0 => {
                    heading.push_str(&String::from_utf8_lossy(&e));
                }
                Ok(Event::CData(e)) if depth > 0 => {
                    heading.push_str(&String::from_utf8_lossy(&e));
                }
                Ok(Event::Eof) => return None,
                Err(e) => {
                    let failed_at = offset + event_start;
                    log::debug!("**detector:** skipping markup at byte {failed_at}: {e}");

                    // resume after the `>` closing the markup that failed
                    let close = cleaned[failed_at..].find('>')?;
                    offset = failed_at + close + 1;
                    break;
                }
                _ => {}
            }
        }
    }

    None
}

fn is_heading(name: &[u8]) -> bool {
    HEADING_TAGS
        .iter()
        .any(|tag| name.eq_ignore_ascii_case(tag.as_bytes()))
}

/// removes `<script>` and `<style>` elements including their content.
fn strip_raw_text(html: &str) -> String {
    // ascii lowercasing keeps byte offsets identical
    let lower = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;

    while pos < html.len() {
        let next = RAW_TEXT_TAGS
            .iter()
            .filter_map(|tag| lower[pos..].find(&format!("<{tag}")).map(|i| (pos + i, *tag)))
            .min_by_key(|(start, _)| *start);

        let Some((start, tag)) = next else {
            break;
        };

        out.push_str(&html[pos..start]);

        let close = format!("</{tag}");
        pos = match lower[start..].find(&close) {
            Some(i) => {
                let close_start = start + i;
                lower[close_start..]
                    .find('>')
                    .map(|j| close_start + j + 1)
                    .unwrap_or(html.len())
            }
            None => html.len(),
        };
    }

    if pos < html.len() {
        out.push_str(&html[pos..]);
    }

    out
}
