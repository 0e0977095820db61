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

//! Seed-range hooks for runtime-specific skip policies.

use wdb_common::types::ScriptPosition;

/// Overrides the initial skip ranges applied when a script first appears,
/// before any source map has attached.
///
/// The engine computes a default seed (whole-script skip when the URL
/// matches a rule, nothing otherwise) and offers it to the hook. Returning
/// `None` keeps the default. Runtime-specific carve-outs, such as exempting
/// a known helper region of a vendored runtime bundle, belong here rather
/// than in the general range computation.
pub trait SeedRangesHook: Send + Sync {
    /// Replacement seed ranges for the script at `url`, or `None` to keep
    /// `default`.
    fn seed_ranges(&self, url: &str, default: &[ScriptPosition]) -> Option<Vec<ScriptPosition>>;
}
