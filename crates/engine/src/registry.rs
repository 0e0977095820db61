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

//! Per-session bookkeeping for live scripts, attached source maps, and
//! last-applied skip ranges.
//!
//! The registry is a side-table owned by the engine, keyed by
//! `(SessionId, ScriptId)`. The applied-ranges record exists purely so a
//! recomputation can diff against what the backend already holds; desired
//! ranges are always recomputed from the rules and source maps, never
//! patched incrementally from this state.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use wdb_common::types::{ScriptId, ScriptPosition, SessionId, SourceMap};

use crate::session::{DebugSession, ScriptHandle};

/// Side-table tracking every attached session and its live scripts.
pub struct SessionRegistry<S: DebugSession> {
    sessions: HashMap<SessionId, SessionEntry<S>>,
}

struct SessionEntry<S: DebugSession> {
    session: Arc<S>,
    scripts: HashMap<ScriptId, Arc<S::Script>>,
    source_maps: HashMap<ScriptId, Arc<SourceMap>>,
    applied: HashMap<ScriptId, Vec<ScriptPosition>>,
}

impl<S: DebugSession> SessionEntry<S> {
    fn new(session: Arc<S>) -> Self {
        Self {
            session,
            scripts: HashMap::new(),
            source_maps: HashMap::new(),
            applied: HashMap::new(),
        }
    }
}

impl<S: DebugSession> Default for SessionRegistry<S> {
    fn default() -> Self {
        Self { sessions: HashMap::new() }
    }
}

impl<S: DebugSession> SessionRegistry<S> {
    /// New empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly attached session.
    pub fn add_session(&mut self, session: Arc<S>) {
        self.sessions.insert(session.id(), SessionEntry::new(session));
    }

    /// Drop a session and everything recorded under it.
    pub fn remove_session(&mut self, session: SessionId) {
        self.sessions.remove(&session);
    }

    /// Drop every script of `session` (its execution context reset); the
    /// session itself stays attached.
    pub fn clear_session(&mut self, session: SessionId) {
        if let Some(entry) = self.sessions.get_mut(&session) {
            entry.scripts.clear();
            entry.source_maps.clear();
            entry.applied.clear();
        }
    }

    /// Track a newly loaded script. Unknown sessions are ignored.
    pub fn add_script(&mut self, session: SessionId, script: Arc<S::Script>) {
        let Some(entry) = self.sessions.get_mut(&session) else {
            debug!(%session, "script added for unknown session");
            return;
        };
        entry.scripts.insert(script.id(), script);
    }

    /// Record the source map attached to a script, replacing any previous
    /// one.
    pub fn attach_source_map(&mut self, session: SessionId, script: ScriptId, map: Arc<SourceMap>) {
        if let Some(entry) = self.sessions.get_mut(&session) {
            entry.source_maps.insert(script, map);
        }
    }

    /// Forget the source map attached to a script.
    pub fn detach_source_map(&mut self, session: SessionId, script: ScriptId) {
        if let Some(entry) = self.sessions.get_mut(&session) {
            entry.source_maps.remove(&script);
        }
    }

    /// Source map currently attached to a script, if any.
    pub fn source_map(&self, session: SessionId, script: ScriptId) -> Option<Arc<SourceMap>> {
        self.sessions.get(&session)?.source_maps.get(&script).cloned()
    }

    /// Handle of a tracked script.
    pub fn script(&self, session: SessionId, script: ScriptId) -> Option<Arc<S::Script>> {
        self.sessions.get(&session)?.scripts.get(&script).cloned()
    }

    /// Handles of every attached session.
    pub fn sessions(&self) -> Vec<Arc<S>> {
        self.sessions.values().map(|entry| entry.session.clone()).collect()
    }

    /// Snapshot of every tracked `(session, script)` pair, for batch
    /// fan-out.
    pub fn all_scripts(&self) -> Vec<(SessionId, Arc<S::Script>)> {
        self.sessions
            .iter()
            .flat_map(|(id, entry)| entry.scripts.values().map(|s| (*id, s.clone())))
            .collect()
    }

    /// The ranges last successfully applied for a script, if any were ever
    /// recorded.
    pub fn applied_ranges(
        &self,
        session: SessionId,
        script: ScriptId,
    ) -> Option<Vec<ScriptPosition>> {
        self.sessions.get(&session)?.applied.get(&script).cloned()
    }

    /// Record a successful application.
    pub fn record_applied(
        &mut self,
        session: SessionId,
        script: ScriptId,
        ranges: Vec<ScriptPosition>,
    ) {
        if let Some(entry) = self.sessions.get_mut(&session) {
            entry.applied.insert(script, ranges);
        }
    }

    /// Drop the applied-ranges record for a script.
    pub fn forget_applied(&mut self, session: SessionId, script: ScriptId) {
        if let Some(entry) = self.sessions.get_mut(&session) {
            entry.applied.remove(&script);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{DebugSession, ScriptHandle};
    use std::future::Future;

    struct TestScript {
        id: ScriptId,
        url: String,
    }

    impl ScriptHandle for TestScript {
        fn id(&self) -> ScriptId {
            self.id
        }
        fn url(&self) -> &str {
            &self.url
        }
        fn is_content_script(&self) -> bool {
            false
        }
        fn apply_skip_ranges(
            &self,
            _ranges: Vec<ScriptPosition>,
        ) -> impl Future<Output = bool> + Send {
            async { true }
        }
    }

    struct TestSession {
        id: SessionId,
    }

    impl DebugSession for TestSession {
        type Script = TestScript;

        fn id(&self) -> SessionId {
            self.id
        }
        fn set_skip_patterns(&self, _patterns: Vec<String>) -> impl Future<Output = bool> + Send {
            async { true }
        }
    }

    fn registry_with_session(id: u64) -> SessionRegistry<TestSession> {
        let mut registry = SessionRegistry::new();
        registry.add_session(Arc::new(TestSession { id: SessionId(id) }));
        registry
    }

    #[test]
    fn test_script_bookkeeping() {
        let mut registry = registry_with_session(1);
        let session = SessionId(1);
        let script = Arc::new(TestScript { id: ScriptId(10), url: "https://a/x.js".into() });

        registry.add_script(session, script);
        assert!(registry.script(session, ScriptId(10)).is_some());
        assert_eq!(registry.all_scripts().len(), 1);

        registry.record_applied(session, ScriptId(10), vec![ScriptPosition::START]);
        assert_eq!(
            registry.applied_ranges(session, ScriptId(10)),
            Some(vec![ScriptPosition::START])
        );

        registry.forget_applied(session, ScriptId(10));
        assert_eq!(registry.applied_ranges(session, ScriptId(10)), None);
    }

    #[test]
    fn test_unknown_session_is_ignored() {
        let mut registry = registry_with_session(1);
        let script = Arc::new(TestScript { id: ScriptId(10), url: "https://a/x.js".into() });

        registry.add_script(SessionId(99), script);
        assert!(registry.all_scripts().is_empty());
        assert_eq!(registry.applied_ranges(SessionId(99), ScriptId(10)), None);
    }

    #[test]
    fn test_source_map_attach_replaces_and_detach_clears() {
        let mut registry = registry_with_session(1);
        let session = SessionId(1);
        let first = Arc::new(SourceMap::new(Vec::new()));
        let second = Arc::new(SourceMap::new(Vec::new()));

        registry.attach_source_map(session, ScriptId(10), first);
        registry.attach_source_map(session, ScriptId(10), second.clone());
        assert!(Arc::ptr_eq(&registry.source_map(session, ScriptId(10)).unwrap(), &second));

        registry.detach_source_map(session, ScriptId(10));
        assert!(registry.source_map(session, ScriptId(10)).is_none());
    }

    #[test]
    fn test_clear_session_drops_scripts_but_keeps_session() {
        let mut registry = registry_with_session(1);
        let session = SessionId(1);
        let script = Arc::new(TestScript { id: ScriptId(10), url: "https://a/x.js".into() });

        registry.add_script(session, script);
        registry.record_applied(session, ScriptId(10), vec![ScriptPosition::START]);
        registry.clear_session(session);

        assert!(registry.all_scripts().is_empty());
        assert_eq!(registry.applied_ranges(session, ScriptId(10)), None);
        assert_eq!(registry.sessions().len(), 1);
    }

    #[test]
    fn test_remove_session_drops_everything() {
        let mut registry = registry_with_session(1);
        registry.add_script(
            SessionId(1),
            Arc::new(TestScript { id: ScriptId(10), url: "https://a/x.js".into() }),
        );
        registry.remove_session(SessionId(1));
        assert!(registry.sessions().is_empty());
        assert!(registry.all_scripts().is_empty());
    }
}
