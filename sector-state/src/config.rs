use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_LEDGER_PATH;
use crate::error::{Result, StateStoreErr};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Ledger location. A leading `~` stands for the home directory.
    pub ledger_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            ledger_path: DEFAULT_LEDGER_PATH.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn resolve_ledger_path(&self) -> Result<PathBuf> {
        absolute_path(&self.ledger_path)
    }
}

/// Expands a leading `~` and makes the result absolute.
pub fn absolute_path(path: &str) -> Result<PathBuf> {
    let expanded = expand_home(path, dirs::home_dir())?;

    if expanded.is_absolute() {
        return Ok(expanded);
    }

    std::env::current_dir()
        .map(|cwd| cwd.join(&expanded))
        .map_err(|source| StateStoreErr::PathResolution {
            path: path.to_string(),
            source,
        })
}

fn expand_home(path: &str, home: Option<PathBuf>) -> Result<PathBuf> {
    let raw = Path::new(path);
    let mut components = raw.components();

    match components.next() {
        Some(Component::Normal(first)) if first == "~" => {
            let home = home.ok_or_else(|| StateStoreErr::HomeDirUnavailable(path.to_string()))?;
            Ok(home.join(components.as_path()))
        }
        _ => Ok(raw.to_path_buf()),
    }
}
