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

//! Collaborator contracts between the engine and the debugger backend.
//!
//! The engine never talks a wire protocol itself; it drives these traits.
//! Backends wrap whatever protocol objects they hold, and tests implement
//! them with plain structs.

use std::future::Future;

use wdb_common::types::{ScriptId, ScriptPosition, SessionId};

/// Handle to a live script in the execution engine.
pub trait ScriptHandle: Send + Sync + 'static {
    /// Identity of this script within its session.
    fn id(&self) -> ScriptId;

    /// URL the script was loaded from. May be empty for anonymous scripts.
    fn url(&self) -> &str;

    /// Whether the script was injected by an extension rather than loaded by
    /// the page itself.
    fn is_content_script(&self) -> bool;

    /// Apply the given skip toggle positions on the backend, replacing any
    /// previously applied set. Resolves to `false` when the backend rejects
    /// or fails the application.
    fn apply_skip_ranges(&self, ranges: Vec<ScriptPosition>) -> impl Future<Output = bool> + Send;
}

/// Handle to a debugging session attached to one execution context tree.
pub trait DebugSession: Send + Sync + 'static {
    /// Script handle type this session produces.
    type Script: ScriptHandle;

    /// Identity of this session.
    fn id(&self) -> SessionId;

    /// Replace the backend's URL-level skip patterns for this session.
    /// Resolves to `false` when the backend rejects them.
    fn set_skip_patterns(&self, patterns: Vec<String>) -> impl Future<Output = bool> + Send;
}

/// Collaborator told to re-resolve displayed source locations for a script
/// whenever its skip ranges have been recomputed, changed or not. Other
/// inputs (a source map attaching) also move displayed positions, so the
/// refresh fires even for a no-op range diff.
pub trait LocationRefresher<S: ScriptHandle>: Send + Sync + 'static {
    /// Refresh any UI locations resolved through `script`.
    fn refresh_locations(&self, script: &S);
}

/// No-op refresher for embedders without a location-resolving layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocationRefresher;

impl<S: ScriptHandle> LocationRefresher<S> for NoLocationRefresher {
    fn refresh_locations(&self, _script: &S) {}
}
