// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::PathBuf;

const APP_DIR: &str = "live-catalog";

fn data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_dir()
                .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"))
        })
}

/// default directory for the file backed catalog.
pub fn default_data_dir() -> PathBuf {
    data_home().join(APP_DIR)
}
