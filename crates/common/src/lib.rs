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

//! WDB Common - Shared functionality for WDB components
//!
//! This crate provides the vocabulary exchanged between the WDB front end
//! and the script execution engine: skip-pattern rules, generated-code
//! positions, and source-map data, plus the settings store those rules
//! live in and logging setup shared by all components.

/// Common types used throughout WDB including skip rules, generated-code positions, and source maps
pub mod types;

/// Logging setup and utilities for consistent logging across WDB components
pub mod logging;
/// Skip-pattern settings storage, either in memory or persisted as JSON on disk
pub mod settings;

pub use logging::*;
pub use settings::*;
