// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use crate::chart::{ChartCandidate, Signature};
use std::collections::HashSet;
use tracing::debug;

/// Keeps the first candidate for each signature, preserving pool order.
pub fn deduplicate(pool: Vec<ChartCandidate>) -> Vec<ChartCandidate> {
    let before = pool.len();
    let mut seen: HashSet<Signature> = HashSet::with_capacity(before);
    let kept: Vec<ChartCandidate> = pool
        .into_iter()
        .filter(|candidate| seen.insert(candidate.signature()))
        .collect();
    debug!(before, after = kept.len(), "candidates deduplicated");
    kept
}
/// Order-preserving truncation. No scoring.
pub fn select(mut pool: Vec<ChartCandidate>, limit: usize) -> Vec<ChartCandidate> {
    pool.truncate(limit);
    pool
}
pub fn deduplicate_and_select(pool: Vec<ChartCandidate>, limit: usize) -> Vec<ChartCandidate> {
    select(deduplicate(pool), limit)
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Channel, ChannelDef, Encoding, Family, MarkDescriptor, MarkType};

    fn bar(id: &str, x: &str) -> ChartCandidate {
        ChartCandidate::new(
            Family::SingleCategorical,
            id.to_string(),
            id.to_string(),
            "",
            MarkType::Bar,
            Encoding::new().with(Channel::X, ChannelDef::field(x)),
        )
    }

    #[test]
    fn first_seen_signature_wins() {
        let mut colored = bar("second", "a");
        colored.encoding = colored.encoding.with(Channel::Color, ChannelDef::field("z"));
        let pool = vec![bar("first", "a"), colored, bar("other", "b")];
        let kept = deduplicate(pool);
        let ids: Vec<_> = kept.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "other"]);
    }

    #[test]
    fn interpolated_mark_is_not_a_duplicate() {
        let mut step = bar("step", "a");
        step.mark = MarkDescriptor::new(MarkType::Bar).interpolated("step");
        assert_eq!(deduplicate(vec![bar("plain", "a"), step]).len(), 2);
    }

    #[test]
    fn select_truncates_without_padding() {
        let pool: Vec<_> = (0..20).map(|i| bar(&format!("c{i}"), &format!("f{i}"))).collect();
        let picked = deduplicate_and_select(pool, 12);
        assert_eq!(picked.len(), 12);
        assert_eq!(picked[11].id, "c11");
        assert_eq!(select(vec![bar("only", "a")], 12).len(), 1);
        assert!(select(Vec::new(), 12).is_empty());
    }
}
