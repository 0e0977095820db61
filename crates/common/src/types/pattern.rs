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

use serde::{Deserialize, Serialize};

/// A single user-maintained skip rule: a regular-expression pattern matched
/// against script URLs.
///
/// Rules are kept in an ordered list. Disabled rules stay in the list so the
/// user can re-enable them later; they never match. At most one rule per
/// exact pattern string is meaningful, so re-adding an existing pattern
/// re-enables the existing rule instead of inserting a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    /// Regular-expression source matched against script URLs.
    pub pattern: String,
    /// Disabled rules are retained but never match.
    #[serde(default)]
    pub disabled: bool,
}

impl PatternRule {
    /// New enabled rule for the given pattern.
    pub fn enabled(pattern: impl Into<String>) -> Self {
        Self { pattern: pattern.into(), disabled: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_rule_constructors() {
        let rule = PatternRule::enabled("/foo\\b");
        assert_eq!(rule.pattern, "/foo\\b");
        assert!(!rule.disabled);
    }

    #[test]
    fn test_pattern_rule_serde_defaults_disabled() {
        // Persisted lists may omit the disabled flag entirely.
        let rule: PatternRule = serde_json::from_str(r#"{"pattern":"/foo\\b"}"#).unwrap();
        assert_eq!(rule, PatternRule::enabled("/foo\\b"));
    }

    #[test]
    fn test_pattern_rule_round_trip() {
        let rule = PatternRule { pattern: "^webpack://.*".to_string(), disabled: true };
        let json = serde_json::to_string(&rule).unwrap();
        let back: PatternRule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rule);
    }
}
