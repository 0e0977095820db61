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

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::ScriptPosition;

/// One source-map entry: a generated position and the original source URL it
/// maps to, if any.
///
/// Entries without a source URL cover generated code whose origin the build
/// tool did not record; consumers treat them as inheriting whatever state the
/// surrounding entries establish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMapping {
    /// Position in the generated source this entry starts at.
    pub position: ScriptPosition,
    /// Original source URL, when the build tool recorded one.
    pub source_url: Option<String>,
}

impl SourceMapping {
    /// New mapping at the given generated position.
    pub fn new(line: u32, column: u32, source_url: Option<&str>) -> Self {
        Self {
            position: ScriptPosition::new(line, column),
            source_url: source_url.map(str::to_string),
        }
    }
}

/// The consumed surface of a parsed source map: its entries ordered by
/// generated position, plus the deduplicated set of mapped source URLs.
///
/// Parsing the source-map format itself happens elsewhere; this type only
/// carries what range computation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMap {
    mappings: Vec<SourceMapping>,
    source_urls: Vec<String>,
}

impl SourceMap {
    /// Build a source map from entries ordered by generated position
    /// ascending.
    pub fn new(mappings: Vec<SourceMapping>) -> Self {
        debug_assert!(
            mappings.windows(2).all(|w| w[0].position <= w[1].position),
            "source-map entries must be ordered by generated position"
        );
        let mut seen = HashSet::new();
        let mut source_urls = Vec::new();
        for mapping in &mappings {
            if let Some(url) = &mapping.source_url {
                if seen.insert(url.clone()) {
                    source_urls.push(url.clone());
                }
            }
        }
        Self { mappings, source_urls }
    }

    /// Entries ordered by generated position ascending.
    pub fn mappings(&self) -> &[SourceMapping] {
        &self.mappings
    }

    /// Distinct mapped source URLs, in first-seen order.
    pub fn source_urls(&self) -> &[String] {
        &self.source_urls
    }

    /// Whether the map carries no entries at all.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
