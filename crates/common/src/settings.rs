// WDB - Web Script Debugger
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Skip-pattern settings storage.
//!
//! The engine never owns the rule list; it reads and writes it through the
//! [`SkipSettings`] trait injected at construction time. Two implementations
//! are provided: [`InMemorySkipSettings`] for tests and embedders with their
//! own persistence, and [`FileSkipSettings`], which keeps the rules as a JSON
//! file under the user's home directory the way the rest of the front end
//! stores its per-user state.

use std::{
    fs,
    path::{Path, PathBuf},
};

use eyre::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::types::PatternRule;

/// Store for the user-maintained skip rules and the "skip all content
/// scripts" toggle.
///
/// Mutations made through the engine always flow back through this trait so
/// the rule list survives the session when the store is file-backed.
pub trait SkipSettings: Send + Sync {
    /// Current ordered rule list.
    fn patterns(&self) -> Vec<PatternRule>;

    /// Replace the whole rule list, persisting it when backed by storage.
    fn set_patterns(&self, patterns: Vec<PatternRule>) -> Result<()>;

    /// Whether every content script is skipped regardless of URL rules.
    fn skip_content_scripts(&self) -> bool;

    /// Toggle skipping of content scripts.
    fn set_skip_content_scripts(&self, skip: bool) -> Result<()>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SettingsData {
    #[serde(default)]
    patterns: Vec<PatternRule>,
    #[serde(default)]
    skip_content_scripts: bool,
}

/// Settings store held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemorySkipSettings {
    data: RwLock<SettingsData>,
}

impl InMemorySkipSettings {
    /// New empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// New store seeded with the given rules.
    pub fn with_patterns(patterns: Vec<PatternRule>) -> Self {
        Self { data: RwLock::new(SettingsData { patterns, skip_content_scripts: false }) }
    }
}

impl SkipSettings for InMemorySkipSettings {
    fn patterns(&self) -> Vec<PatternRule> {
        self.data.read().patterns.clone()
    }

    fn set_patterns(&self, patterns: Vec<PatternRule>) -> Result<()> {
        self.data.write().patterns = patterns;
        Ok(())
    }

    fn skip_content_scripts(&self) -> bool {
        self.data.read().skip_content_scripts
    }

    fn set_skip_content_scripts(&self, skip: bool) -> Result<()> {
        self.data.write().skip_content_scripts = skip;
        Ok(())
    }
}

/// Settings store persisted as a JSON file.
///
/// The file is read once on open; every mutation rewrites it. A file that
/// fails to parse is discarded with a warning rather than aborting startup,
/// so a corrupted settings file never wedges the debugger.
#[derive(Debug)]
pub struct FileSkipSettings {
    path: PathBuf,
    data: RwLock<SettingsData>,
}

impl FileSkipSettings {
    /// Returns the default settings file path: `~/.wdb/skip_settings.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|p| p.join(".wdb").join("skip_settings.json"))
    }

    /// Open the store backed by the given file, loading it if present.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = Self::load(&path).unwrap_or_default();
        Self { path, data: RwLock::new(data) }
    }

    /// Open the store at [`Self::default_path`].
    pub fn open_default() -> Result<Self> {
        let path =
            Self::default_path().ok_or_else(|| eyre::eyre!("cannot determine home directory"))?;
        Ok(Self::open(path))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Option<SettingsData> {
        if !path.exists() {
            return None;
        }
        trace!("loading skip settings: {:?}", path);
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(data) => Some(data),
            Err(err) => {
                warn!(%err, "the skip settings file has been corrupted: {:?}", path);
                let _ = fs::remove_file(path); // we do not care about the result
                None
            }
        }
    }

    fn persist(&self, data: &SettingsData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, content)?;
        trace!("saved skip settings: {:?}", self.path);
        Ok(())
    }
}

impl SkipSettings for FileSkipSettings {
    fn patterns(&self) -> Vec<PatternRule> {
        self.data.read().patterns.clone()
    }

    fn set_patterns(&self, patterns: Vec<PatternRule>) -> Result<()> {
        let mut data = self.data.write();
        data.patterns = patterns;
        self.persist(&data)
    }

    fn skip_content_scripts(&self) -> bool {
        self.data.read().skip_content_scripts
    }

    fn set_skip_content_scripts(&self, skip: bool) -> Result<()> {
        let mut data = self.data.write();
        data.skip_content_scripts = skip;
        self.persist(&data)
    }
}
