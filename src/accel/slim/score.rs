// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Score (user, item) pairs from user histories and learned similarities.

use log::*;
use rayon::prelude::*;

use crate::data::{InteractionLog, Recommendations, RowColumnSet};
use crate::errors::Result;
use crate::parallel::maybe_fuse;

use super::accum::{collect_scored, ScoreAccumulator};
use super::SimilarityTable;

/// Which (user, item) pairs may receive a score.
#[derive(Debug, Clone, Copy)]
pub enum CandidateFilter<'a> {
    /// Every requested user against the same item set.
    Items(&'a [i32]),
    /// Only the listed pairs.
    Pairs(&'a RowColumnSet),
}

/// Score candidate items for each user by summing the similarities that link
/// them to the items in the user's history.
///
/// Each history record contributes on its own, so an item recorded twice
/// adds its similarities twice.  Candidates with no linking similarity are left out of the result.
pub fn score_users(
    table: &SimilarityTable,
    history: &InteractionLog,
    users: &[i32],
    filter: CandidateFilter<'_>,
) -> Result<Recommendations> {
    let histories = history.user_histories();
    let pair_targets = match filter {
        CandidateFilter::Pairs(pairs) => Some(pairs.by_row()),
        CandidateFilter::Items(_) => None,
    };

    let mut users = users.to_vec();
    users.sort_unstable();
    users.dedup();
    debug!(
        "scoring {} users from {} history records",
        users.len(),
        history.len()
    );

    let scored: Vec<Result<(i32, Vec<(i32, f32)>)>> = maybe_fuse(users.par_iter().map(|user| {
        let targets: &[i32] = match (&filter, &pair_targets) {
            (CandidateFilter::Items(items), _) => *items,
            (CandidateFilter::Pairs(_), Some(by_user)) => {
                by_user.get(user).map(Vec::as_slice).unwrap_or(&[])
            }
            (CandidateFilter::Pairs(_), None) => &[],
        };
        let hist = histories.get(user).map(Vec::as_slice).unwrap_or(&[]);
        let scores = score_user(table, hist, targets)?;
        Ok((*user, scores))
    }))
    .collect();

    let rows = scored.into_iter().collect::<Result<Vec<_>>>()?;
    let recs = Recommendations::from_user_rows(rows);
    debug!("scored {} pairs", recs.len());
    Ok(recs)
}

/// Score one user's candidate items against their history.
fn score_user(table: &SimilarityTable, history: &[i32], targets: &[i32]) -> Result<Vec<(i32, f32)>> {
    if history.is_empty() || targets.is_empty() {
        return Ok(Vec::new());
    }

    let mut accs = ScoreAccumulator::new_array(table.n_items(), targets);

    // every history record joins with the table, so repeated records add up
    for item in history {
        let (nbrs, sims) = table.neighbors(*item);
        for (other, sim) in nbrs.iter().zip(sims) {
            accs[*other as usize].add_weight(*sim)?;
        }
    }

    Ok(collect_scored(&accs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slim::SimilarityRow;

    fn table() -> SimilarityTable {
        let rows = [(0, 1, 0.5), (0, 2, 0.25), (1, 2, 1.0), (3, 0, 2.0)]
            .into_iter()
            .map(|(a, b, s)| SimilarityRow {
                item_id_one: a,
                item_id_two: b,
                similarity: s,
            });
        SimilarityTable::from_rows(4, rows).expect("table")
    }

    fn history(records: &[(i32, i32, f32)]) -> InteractionLog {
        InteractionLog::from_records(records.iter().copied())
    }

    #[test]
    fn sums_over_history() {
        let hist = history(&[(0, 0, 1.0), (0, 1, 1.0), (1, 3, 1.0)]);
        let recs = score_users(&table(), &hist, &[0, 1], CandidateFilter::Items(&[0, 1, 2, 3]))
            .expect("score");
        assert_eq!(recs.get(0, 1), Some(0.5));
        assert_eq!(recs.get(0, 2), Some(1.25));
        assert_eq!(recs.get(1, 0), Some(2.0));
        // no linking similarity means no row
        assert_eq!(recs.get(0, 3), None);
        assert_eq!(recs.get(1, 2), None);
        assert_eq!(recs.len(), 3);
    }

    #[test]
    fn item_filter_restricts_candidates() {
        let hist = history(&[(0, 0, 1.0)]);
        let recs =
            score_users(&table(), &hist, &[0], CandidateFilter::Items(&[2])).expect("score");
        assert_eq!(recs.len(), 1);
        assert_eq!(recs.get(0, 2), Some(0.25));
    }

    #[test]
    fn pair_filter_restricts_candidates() {
        let hist = history(&[(0, 0, 1.0), (1, 0, 1.0)]);
        let pairs: RowColumnSet = vec![(0, 1), (1, 2)].into_iter().collect();
        let recs = score_users(&table(), &hist, &[0, 1], CandidateFilter::Pairs(&pairs))
            .expect("score");
        assert_eq!(recs.len(), 2);
        assert_eq!(recs.get(0, 1), Some(0.5));
        assert_eq!(recs.get(1, 2), Some(0.25));
        assert_eq!(recs.get(0, 2), None);
    }

    #[test]
    fn repeated_history_records_each_contribute() {
        let hist = history(&[(0, 0, 1.0), (0, 0, 3.0), (0, 1, 1.0)]);
        let recs =
            score_users(&table(), &hist, &[0], CandidateFilter::Items(&[1, 2])).expect("score");
        assert_eq!(recs.get(0, 1), Some(1.0));
        // two records of item 0 (0.25 each) plus one of item 1 (1.0)
        assert_eq!(recs.get(0, 2), Some(1.5));
    }

    #[test]
    fn empty_inputs_give_empty_result() {
        let hist = history(&[(0, 0, 1.0)]);
        let t = table();
        assert!(score_users(&t, &hist, &[0], CandidateFilter::Items(&[]))
            .expect("score")
            .is_empty());
        assert!(score_users(&t, &InteractionLog::empty(), &[0], CandidateFilter::Items(&[1]))
            .expect("score")
            .is_empty());
        assert!(score_users(&t, &hist, &[], CandidateFilter::Items(&[1]))
            .expect("score")
            .is_empty());
    }

    #[test]
    fn unknown_candidates_absent() {
        let hist = history(&[(0, 0, 1.0)]);
        let recs =
            score_users(&table(), &hist, &[0], CandidateFilter::Items(&[1, 17])).expect("score");
        assert_eq!(recs.len(), 1);
    }
}
