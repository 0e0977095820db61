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

//! Skip-range computation over source-map entries.
//!
//! A range sequence is a run-length encoding of skipped and non-skipped
//! spans of generated code: each position flips the state, and `(0, 0)`
//! implicitly starts "not skipped" unless it is itself the first entry.
//! Encoding runs instead of per-entry state keeps the protocol payload
//! small and makes the unchanged-ranges diff in the engine meaningful.

use wdb_common::types::{ScriptPosition, SourceMapping};

/// Compute the toggle sequence for a mapped script.
///
/// `is_blackboxed` decides each mapped source URL; entries without a source
/// URL never flip the state. Generated code before the first entry is
/// unmapped glue emitted by the build tool and is treated as skipped.
///
/// The result is strictly increasing; two flips landing on the same
/// generated position cancel each other instead of producing an adjacent
/// duplicate.
pub fn compute_skip_ranges(
    mappings: &[SourceMapping],
    mut is_blackboxed: impl FnMut(&str) -> bool,
) -> Vec<ScriptPosition> {
    let Some(first) = mappings.first() else {
        return Vec::new();
    };

    let mut ranges = Vec::new();
    let mut skipped = false;
    if first.position != ScriptPosition::START {
        ranges.push(ScriptPosition::START);
        skipped = true;
    }

    for mapping in mappings {
        let Some(source_url) = mapping.source_url.as_deref() else {
            continue;
        };
        if is_blackboxed(source_url) != skipped {
            if ranges.last() == Some(&mapping.position) {
                ranges.pop();
            } else {
                ranges.push(mapping.position);
            }
            skipped = !skipped;
        }
    }

    debug_assert!(
        ranges.windows(2).all(|w| w[0] < w[1]),
        "toggle positions must be strictly increasing"
    );
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use wdb_common::types::SourceMapping;

    fn positions(ranges: &[ScriptPosition]) -> Vec<(u32, u32)> {
        ranges.iter().map(|p| (p.line, p.column)).collect()
    }

    #[test]
    fn test_no_mappings_yields_empty() {
        let ranges = compute_skip_ranges(&[], |_| true);
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_alternating_sources() {
        // a.ts is skipped, b.ts is not: the script starts skipped at (0,0),
        // opens up at (1,0), and is skipped again from (2,0) onwards.
        let mappings = vec![
            SourceMapping::new(0, 0, Some("a.ts")),
            SourceMapping::new(1, 0, Some("b.ts")),
            SourceMapping::new(2, 0, Some("a.ts")),
        ];
        let ranges = compute_skip_ranges(&mappings, |url| url == "a.ts");
        assert_eq!(positions(&ranges), [(0, 0), (1, 0), (2, 0)]);
    }

    #[test]
    fn test_leading_unmapped_glue_is_skipped() {
        // The first entry is past (0,0), so the preamble before it gets a
        // synthesized skip that the non-skipped first source then closes.
        let mappings = vec![SourceMapping::new(3, 0, Some("app.ts"))];
        let ranges = compute_skip_ranges(&mappings, |_| false);
        assert_eq!(positions(&ranges), [(0, 0), (3, 0)]);
    }

    #[test]
    fn test_leading_glue_merges_with_skipped_first_source() {
        let mappings = vec![SourceMapping::new(3, 0, Some("vendor.ts"))];
        let ranges = compute_skip_ranges(&mappings, |_| true);
        // Glue and the skipped source form one run covering the whole script.
        assert_eq!(positions(&ranges), [(0, 0)]);
    }

    #[test]
    fn test_nothing_skipped_yields_empty() {
        let mappings = vec![
            SourceMapping::new(0, 0, Some("a.ts")),
            SourceMapping::new(5, 2, Some("b.ts")),
        ];
        let ranges = compute_skip_ranges(&mappings, |_| false);
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_entries_without_source_url_inherit_state() {
        let mappings = vec![
            SourceMapping::new(0, 0, Some("a.ts")),
            SourceMapping::new(1, 0, None),
            SourceMapping::new(2, 0, Some("b.ts")),
        ];
        let ranges = compute_skip_ranges(&mappings, |url| url == "a.ts");
        assert_eq!(positions(&ranges), [(0, 0), (2, 0)]);
    }

    #[test]
    fn test_same_position_flips_cancel() {
        // Two sources claiming the same generated position with opposite
        // status must not emit an adjacent duplicate toggle.
        let mappings = vec![
            SourceMapping::new(0, 0, Some("a.ts")),
            SourceMapping::new(0, 0, Some("b.ts")),
            SourceMapping::new(4, 0, Some("b.ts")),
        ];
        let ranges = compute_skip_ranges(&mappings, |url| url == "a.ts");
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_column_granularity() {
        let mappings = vec![
            SourceMapping::new(0, 0, Some("a.ts")),
            SourceMapping::new(0, 40, Some("b.ts")),
            SourceMapping::new(0, 80, Some("a.ts")),
        ];
        let ranges = compute_skip_ranges(&mappings, |url| url == "a.ts");
        assert_eq!(positions(&ranges), [(0, 0), (0, 40), (0, 80)]);
    }

    #[test]
    fn test_output_is_strictly_increasing() {
        let mappings: Vec<SourceMapping> = (0..20)
            .map(|i| {
                let url = if i % 3 == 0 { "a.ts" } else { "b.ts" };
                SourceMapping::new(i, 0, Some(url))
            })
            .collect();
        let ranges = compute_skip_ranges(&mappings, |url| url == "a.ts");
        assert!(ranges.windows(2).all(|w| w[0] < w[1]));
    }
}
