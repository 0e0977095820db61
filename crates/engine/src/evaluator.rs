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

//! Skip-rule evaluation with a bounded per-URL decision cache.
//!
//! The enabled rules are compiled into a single [`RegexSet`] so a decision is
//! one pass over the URL regardless of how many rules exist, and every
//! decision is memoized per URL. The cache is cleared wholesale, never
//! evicted entry-by-entry: decisions are cheap to recompute and the common
//! churn (rule edits, navigations) invalidates everything anyway.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use regex::{Regex, RegexSet};
use tracing::{trace, warn};
use wdb_common::SkipSettings;

/// Ceiling on the decision cache. Reaching it clears the whole cache on the
/// next insert rather than evicting entries.
pub const DECISION_CACHE_CEILING: usize = 1024;

/// Answers "is this URL skipped" against the enabled rule set, with memoized
/// per-URL decisions.
pub struct PatternEvaluator {
    settings: Arc<dyn SkipSettings>,
    state: RwLock<EvaluatorState>,
}

#[derive(Default)]
struct EvaluatorState {
    matcher: Option<RegexSet>,
    cache: HashMap<String, bool>,
}

impl PatternEvaluator {
    /// New evaluator over the given settings store.
    pub fn new(settings: Arc<dyn SkipSettings>) -> Self {
        let evaluator = Self { settings, state: RwLock::new(EvaluatorState::default()) };
        evaluator.rebuild_matcher();
        evaluator
    }

    /// Enabled patterns in rule-list order, skipping empty ones. This is the
    /// list pushed to session backends.
    pub fn enabled_patterns(&self) -> Vec<String> {
        self.settings
            .patterns()
            .into_iter()
            .filter(|rule| !rule.disabled && !rule.pattern.is_empty())
            .map(|rule| rule.pattern)
            .collect()
    }

    /// Recompile the matcher and drop every cached decision. Must be called
    /// whenever the rule list or the content-script toggle changes.
    pub fn rules_changed(&self) {
        self.rebuild_matcher();
    }

    /// Whether `url` is skipped under the current rules.
    ///
    /// Content scripts are skipped wholesale when the corresponding toggle is
    /// on; that short-circuit is answered before the matcher and is not
    /// memoized, since the toggle can flip independently of the rule list.
    pub fn is_blackboxed(&self, url: &str, is_content_script: bool) -> bool {
        if let Some(cached) = self.state.read().cache.get(url) {
            return *cached;
        }
        if is_content_script && self.settings.skip_content_scripts() {
            return true;
        }
        let decision =
            self.state.read().matcher.as_ref().is_some_and(|matcher| matcher.is_match(url));
        self.insert(url, decision);
        decision
    }

    /// Unconditionally drop every cached decision. Used when a session's
    /// execution context resets, since the set of interesting URLs changes
    /// completely.
    pub fn clear_cache(&self) {
        self.state.write().cache.clear();
    }

    /// Drop the cache only once it has grown to the ceiling. Cheap upkeep for
    /// events (a session going away) that make part of the cache stale
    /// without invalidating any individual decision.
    pub fn clear_cache_if_large(&self) {
        let mut state = self.state.write();
        if state.cache.len() >= DECISION_CACHE_CEILING {
            state.cache.clear();
        }
    }

    fn insert(&self, url: &str, decision: bool) {
        let mut state = self.state.write();
        if state.cache.len() >= DECISION_CACHE_CEILING && !state.cache.contains_key(url) {
            trace!(size = state.cache.len(), "decision cache full, clearing");
            state.cache.clear();
        }
        state.cache.insert(url.to_string(), decision);
    }

    fn rebuild_matcher(&self) {
        let mut patterns = Vec::new();
        for rule in self.settings.patterns() {
            if rule.disabled || rule.pattern.is_empty() {
                continue;
            }
            // Compile individually first so one malformed rule cannot take
            // the whole set down with it.
            match Regex::new(&rule.pattern) {
                Ok(_) => patterns.push(rule.pattern),
                Err(err) => warn!(pattern = %rule.pattern, %err, "skipping malformed skip rule"),
            }
        }
        let matcher = if patterns.is_empty() {
            None
        } else {
            match RegexSet::new(&patterns) {
                Ok(set) => Some(set),
                Err(err) => {
                    warn!(%err, "failed to compile skip rule set");
                    None
                }
            }
        };

        let mut state = self.state.write();
        state.matcher = matcher;
        state.cache.clear();
    }
}
