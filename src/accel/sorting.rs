// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use std::cmp::Reverse;

use ordered_float::OrderedFloat;

/// Keep the `k` highest-scoring entries, ordered by decreasing score.
///
/// Ties are broken by ascending key so the result does not depend on the
/// input order.
pub fn top_k<K: Ord + Copy>(mut entries: Vec<(K, f32)>, k: usize) -> Vec<(K, f32)> {
    entries.sort_unstable_by_key(|(key, s)| (s.is_nan(), Reverse(OrderedFloat(*s)), *key));
    entries.truncate(k);
    entries
}
