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

//! URL-to-pattern derivation for user-toggled skip rules.
//!
//! When the user marks a script as "not my code", the rule stored is not the
//! full URL but a pattern anchored on the file name (or, failing that, the
//! folder path or host). Version suffixes and cache-busting query strings
//! then keep matching the same library file across reloads, which is what
//! users almost always want.

use url::Url;

/// Derive the skip-rule pattern for a script URL.
///
/// Returns the empty string when the URL is not eligible for a user-toggled
/// rule (`about:blank`, data URLs, or nothing usable to anchor on). URLs
/// that cannot be dissected into scheme/host/path get an exact-match
/// pattern instead.
pub fn pattern_from_url(url: &str) -> String {
    if url == "about:blank" || url.starts_with("data:") {
        return String::new();
    }
    let parsed = match Url::parse(url) {
        Ok(parsed) if !parsed.cannot_be_a_base() => parsed,
        _ => return format!("^{}$", regex::escape(url)),
    };

    let path = parsed.path();
    let (folder, last) = path.rsplit_once('/').unwrap_or(("", path));
    let mut name = if !last.is_empty() {
        format!("/{last}")
    } else if !folder.is_empty() {
        format!("{folder}/")
    } else {
        String::new()
    };
    if name.is_empty() {
        name = parsed.host_str().unwrap_or_default().to_string();
    }
    if name.is_empty() {
        return String::new();
    }

    let scheme = parsed.scheme();
    let mut prefix = String::new();
    if scheme != "http" && scheme != "https" {
        prefix = format!("^{scheme}://");
        if scheme == "chrome-extension" {
            // The extension identity is part of the rule; hosts are plain
            // lowercase strings, so they go in verbatim.
            prefix.push_str(parsed.host_str().unwrap_or_default());
            prefix.push_str("\\b");
        }
        prefix.push_str(".*");
    }

    // An exact suffix gets a hard anchor; otherwise a word boundary keeps
    // the rule matching the same file next to query strings or fragments.
    let anchor = if url.ends_with(&name) { "$" } else { "\\b" };
    format!("{prefix}{}{anchor}", regex::escape(&name))
}

/// Whether a usable skip pattern can be derived for `url`.
pub fn can_blackbox(url: &str) -> bool {
    !pattern_from_url(url).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_about_blank_and_data_urls_are_ineligible() {
        assert_eq!(pattern_from_url("about:blank"), "");
        assert_eq!(pattern_from_url("data:text/plain;base64,SGVsbG8="), "");
        assert!(!can_blackbox("about:blank"));
    }

    #[test]
    fn test_malformed_url_gets_exact_pattern() {
        assert_eq!(pattern_from_url("/a/foo.js"), r"^/a/foo\.js$");
        // No authority component means the heuristic cannot dissect it.
        assert_eq!(pattern_from_url("node:internal/modules"), r"^node:internal/modules$");
    }

    #[test]
    fn test_last_path_component_with_query_string() {
        let pattern = pattern_from_url("https://example.com/lib/foo.min.js?v=2");
        assert_eq!(pattern, r"/foo\.min\.js\b");

        // The derived rule must still match the same file without the query.
        let re = Regex::new(&pattern).unwrap();
        assert!(re.is_match("https://example.com/lib/foo.min.js"));
        assert!(re.is_match("https://example.com/lib/foo.min.js?v=3"));
        assert!(!re.is_match("https://example.com/lib/foo.min.jsx"));
    }

    #[test]
    fn test_suffix_name_gets_end_anchor() {
        assert_eq!(pattern_from_url("https://example.com/lib/foo.min.js"), r"/foo\.min\.js$");
    }

    #[test]
    fn test_folder_path_when_no_file_name() {
        let pattern = pattern_from_url("https://example.com/vendor/bundles/");
        assert_eq!(pattern, "/vendor/bundles/$");

        let re = Regex::new(&pattern).unwrap();
        assert!(re.is_match("https://example.com/vendor/bundles/"));
    }

    #[test]
    fn test_host_fallback_for_bare_origin() {
        let pattern = pattern_from_url("https://example.com/");
        assert_eq!(pattern, r"example\.com\b");
    }

    #[test]
    fn test_non_http_scheme_gets_scheme_prefix() {
        let pattern = pattern_from_url("webpack:///src/foo.js");
        assert_eq!(pattern, r"^webpack://.*/foo\.js$");

        let re = Regex::new(&pattern).unwrap();
        assert!(re.is_match("webpack:///src/foo.js"));
        assert!(!re.is_match("https://example.com/src/foo.js"));
    }

    #[test]
    fn test_chrome_extension_requires_exact_host() {
        let pattern = pattern_from_url("chrome-extension://abcdefghijklmnop/js/content.js");
        assert_eq!(pattern, r"^chrome-extension://abcdefghijklmnop\b.*/content\.js$");

        let re = Regex::new(&pattern).unwrap();
        assert!(re.is_match("chrome-extension://abcdefghijklmnop/js/content.js"));
        assert!(!re.is_match("chrome-extension://ponmlkjihgfedcba/js/content.js"));
    }

    #[test]
    fn test_pattern_matches_adjacent_same_named_resource() {
        // Word-boundary termination keeps prefix-relative matches working.
        let pattern = pattern_from_url("https://cdn.example.com/assets/app.js?build=91");
        let re = Regex::new(&pattern).unwrap();
        assert!(re.is_match("https://cdn.example.com/assets/app.js"));
        assert!(re.is_match("https://other.example.com/assets/app.js"));
    }
}
