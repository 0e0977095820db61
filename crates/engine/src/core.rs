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

//! Core engine functionality for skip-rule synchronization.
//!
//! This module provides the composition root that keeps the backend's view
//! of "not my code" consistent with the user's rules. It reacts to rule
//! edits, scripts appearing, and source maps attaching or detaching, and
//! drives re-synchronization across every attached session.
//!
//! # Workflow Overview
//!
//! 1. **Decide**: evaluate a script's URL (and its mapped source URLs)
//!    against the enabled rules, memoized per URL
//! 2. **Compute**: turn the decisions into a toggle sequence over generated
//!    positions
//! 3. **Diff**: compare against the ranges last applied for that script
//! 4. **Apply**: push changed ranges to the backend; record only successes
//! 5. **Notify**: once a whole rule-change batch has settled, tell change
//!    listeners
//!
//! Failures are absorbed here: skip ranges are a stepping-ergonomics aid,
//! not a correctness-critical path, so a rejected application just leaves
//! the previous record in place and the next triggering event retries the
//! diff naturally.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use futures::future::{join, join_all};
use parking_lot::RwLock;
use regex::Regex;
use tracing::{debug, trace, warn};
use wdb_common::types::{PatternRule, ScriptId, ScriptPosition, SessionId, SourceMap};
use wdb_common::SkipSettings;

use crate::{
    evaluator::PatternEvaluator,
    hooks::SeedRangesHook,
    matcher,
    ranges::compute_skip_ranges,
    registry::SessionRegistry,
    session::{DebugSession, LocationRefresher, ScriptHandle},
};

/// Identifier handed out by [`BlackboxEngine::add_change_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ChangeListener = Arc<dyn Fn() + Send + Sync>;

/// The engine that keeps skip ranges synchronized with the user's rules
/// across every attached debugging session.
///
/// All state lives behind short-lived locks that are never held across an
/// await point; events may interleave at suspension points and converge
/// because every reconciliation recomputes from current state.
pub struct BlackboxEngine<S, L>
where
    S: DebugSession,
    L: LocationRefresher<S::Script>,
{
    settings: Arc<dyn SkipSettings>,
    evaluator: PatternEvaluator,
    registry: RwLock<SessionRegistry<S>>,
    locations: L,
    seed_hook: Option<Box<dyn SeedRangesHook>>,
    listeners: RwLock<Vec<(ListenerId, ChangeListener)>>,
    next_listener_id: AtomicU64,
}

impl<S, L> BlackboxEngine<S, L>
where
    S: DebugSession,
    L: LocationRefresher<S::Script>,
{
    /// Create a new engine over the given settings store and location
    /// refresher.
    pub fn new(settings: Arc<dyn SkipSettings>, locations: L) -> Self {
        let evaluator = PatternEvaluator::new(settings.clone());
        Self {
            settings,
            evaluator,
            registry: RwLock::new(SessionRegistry::new()),
            locations,
            seed_hook: None,
            listeners: RwLock::new(Vec::new()),
            next_listener_id: AtomicU64::new(0),
        }
    }

    /// Install a seed-range hook consulted when scripts first appear.
    pub fn with_seed_hook(mut self, hook: impl SeedRangesHook + 'static) -> Self {
        self.seed_hook = Some(Box::new(hook));
        self
    }

    /// Whether `url` is skipped under the current rules.
    pub fn is_blackboxed(&self, url: &str, is_content_script: bool) -> bool {
        self.evaluator.is_blackboxed(url, is_content_script)
    }

    /// Whether a usable skip rule can be derived for `url` at all.
    pub fn can_blackbox(&self, url: &str) -> bool {
        matcher::can_blackbox(url)
    }

    /// Mark `url` as "not my code".
    ///
    /// Re-enables an existing rule with the identical derived pattern rather
    /// than inserting a duplicate. No-op for URLs no pattern can be derived
    /// for.
    pub async fn blackbox_url(&self, url: &str) {
        let pattern = matcher::pattern_from_url(url);
        if pattern.is_empty() {
            return;
        }
        let mut rules = self.settings.patterns();
        if let Some(rule) = rules.iter_mut().find(|rule| rule.pattern == pattern) {
            rule.disabled = false;
        } else {
            rules.push(PatternRule::enabled(pattern));
        }
        self.store_patterns(rules);
        self.patterns_changed().await;
    }

    /// Remove the "not my code" marking from `url`.
    ///
    /// Removes the rule with the identical derived pattern, and additionally
    /// disables every other enabled rule that still matches the URL: a
    /// broader rule left enabled would silently re-skip the script the user
    /// just exempted. Malformed rules never match and are left alone.
    pub async fn unblackbox_url(&self, url: &str) {
        let pattern = matcher::pattern_from_url(url);
        if pattern.is_empty() {
            return;
        }
        let mut rules = self.settings.patterns();
        rules.retain(|rule| rule.pattern != pattern);
        for rule in rules.iter_mut().filter(|rule| !rule.disabled) {
            if Regex::new(&rule.pattern).is_ok_and(|re| re.is_match(url)) {
                rule.disabled = true;
            }
        }
        self.store_patterns(rules);
        self.patterns_changed().await;
    }

    /// Skip every content script regardless of URL rules.
    pub async fn blackbox_content_scripts(&self) {
        self.store_skip_content_scripts(true);
        self.patterns_changed().await;
    }

    /// Stop skipping content scripts wholesale.
    pub async fn unblackbox_content_scripts(&self) {
        self.store_skip_content_scripts(false);
        self.patterns_changed().await;
    }

    /// Register a listener invoked once per completed rule-change batch,
    /// after every session has been pushed the new patterns and every
    /// script's ranges have settled.
    pub fn add_change_listener(&self, listener: impl Fn() + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Remove a previously registered change listener.
    pub fn remove_change_listener(&self, id: ListenerId) {
        self.listeners.write().retain(|(listener_id, _)| *listener_id != id);
    }

    /// A session attached: track it and push the current enabled patterns to
    /// its backend.
    pub async fn session_added(&self, session: Arc<S>) {
        let patterns = self.evaluator.enabled_patterns();
        self.registry.write().add_session(session.clone());
        if !session.set_skip_patterns(patterns).await {
            warn!(session = %session.id(), "backend rejected skip patterns");
        }
    }

    /// A session detached: drop everything recorded under it.
    pub fn session_removed(&self, session: SessionId) {
        self.registry.write().remove_session(session);
        self.evaluator.clear_cache_if_large();
    }

    /// A script was loaded. Seeds a whole-script skip immediately when the
    /// URL matches, so stepping behaves before any source map has attached;
    /// a later attach refines the seed into precise sub-ranges.
    pub async fn script_added(&self, session: SessionId, script: Arc<S::Script>) {
        self.registry.write().add_script(session, script.clone());

        let blackboxed = self.evaluator.is_blackboxed(script.url(), script.is_content_script());
        let mut seed = if blackboxed { vec![ScriptPosition::START] } else { Vec::new() };
        if let Some(hook) = &self.seed_hook {
            if let Some(ranges) = hook.seed_ranges(script.url(), &seed) {
                seed = ranges;
            }
        }

        self.apply_diffed(session, &script, seed).await;
        self.locations.refresh_locations(&script);
    }

    /// A source map attached to a script, replacing any previous one.
    pub async fn source_map_attached(
        &self,
        session: SessionId,
        script: ScriptId,
        source_map: Arc<SourceMap>,
    ) {
        let script = {
            let mut registry = self.registry.write();
            registry.attach_source_map(session, script, source_map);
            registry.script(session, script)
        };
        if let Some(script) = script {
            self.reconcile_script(session, &script).await;
        }
    }

    /// A script's source map detached.
    pub async fn source_map_detached(&self, session: SessionId, script: ScriptId) {
        let script = {
            let mut registry = self.registry.write();
            registry.detach_source_map(session, script);
            registry.script(session, script)
        };
        if let Some(script) = script {
            self.reconcile_script(session, &script).await;
        }
    }

    /// A session's execution context reset (navigation or reload): its
    /// scripts are gone and every cached decision is suspect.
    pub fn global_context_cleared(&self, session: SessionId) {
        self.registry.write().clear_session(session);
        self.evaluator.clear_cache();
    }

    /// The rule list or content-script toggle changed: re-synchronize
    /// everything.
    ///
    /// Pushes the new pattern set to every session backend and reconciles
    /// every tracked script, concurrently. Change listeners only fire after
    /// the entire batch has settled, so they never observe a script still
    /// carrying stale ranges.
    pub async fn patterns_changed(&self) {
        self.evaluator.rules_changed();
        let patterns = self.evaluator.enabled_patterns();

        let (sessions, scripts) = {
            let registry = self.registry.read();
            (registry.sessions(), registry.all_scripts())
        };
        debug!(
            sessions = sessions.len(),
            scripts = scripts.len(),
            patterns = patterns.len(),
            "re-synchronizing skip ranges"
        );

        let pushes = join_all(sessions.iter().map(|session| {
            let patterns = patterns.clone();
            async move {
                if !session.set_skip_patterns(patterns).await {
                    warn!(session = %session.id(), "backend rejected skip patterns");
                }
            }
        }));
        let reconciles = join_all(
            scripts.iter().map(|(session, script)| self.reconcile_script(*session, script)),
        );
        join(pushes, reconciles).await;

        let listeners: Vec<ChangeListener> =
            self.listeners.read().iter().map(|(_, listener)| listener.clone()).collect();
        for listener in listeners {
            listener();
        }
    }

    /// Recompute, diff, and apply the skip ranges for one script.
    async fn reconcile_script(&self, session: SessionId, script: &Arc<S::Script>) {
        let directly =
            self.evaluator.is_blackboxed(script.url(), script.is_content_script());
        let source_map = self.registry.read().source_map(session, script.id());

        let desired = match &source_map {
            Some(map) => {
                let relevant = directly
                    || map.source_urls().iter().any(|url| self.evaluator.is_blackboxed(url, false));
                if relevant {
                    compute_skip_ranges(map.mappings(), |url| {
                        self.evaluator.is_blackboxed(url, false)
                    })
                } else {
                    Vec::new()
                }
            }
            None if directly => vec![ScriptPosition::START],
            None => Vec::new(),
        };

        self.apply_diffed(session, script, desired).await;
        self.locations.refresh_locations(script);
    }

    /// Apply `desired` to the backend unless it matches what was already
    /// applied. Only a reported success updates the record; a failure keeps
    /// the previous baseline so the next event retries the diff.
    async fn apply_diffed(
        &self,
        session: SessionId,
        script: &Arc<S::Script>,
        desired: Vec<ScriptPosition>,
    ) {
        let previous = self.registry.read().applied_ranges(session, script.id());
        match previous {
            Some(previous) if previous == desired => {
                trace!(script = %script.id(), "skip ranges unchanged");
            }
            None if desired.is_empty() => {
                // Nothing to apply and nothing applied before; record the
                // empty state so later diffs have a baseline.
                self.registry.write().record_applied(session, script.id(), desired);
            }
            _ => {
                if script.apply_skip_ranges(desired.clone()).await {
                    let mut registry = self.registry.write();
                    if desired.is_empty() {
                        registry.forget_applied(session, script.id());
                    } else {
                        registry.record_applied(session, script.id(), desired);
                    }
                } else {
                    debug!(script = %script.id(), "backend rejected skip ranges");
                }
            }
        }
    }

    fn store_patterns(&self, rules: Vec<PatternRule>) {
        if let Err(err) = self.settings.set_patterns(rules) {
            warn!(%err, "failed to persist skip rules");
        }
    }

    fn store_skip_content_scripts(&self, skip: bool) {
        if let Err(err) = self.settings.set_skip_content_scripts(skip) {
            warn!(%err, "failed to persist content-script toggle");
        }
    }
}
