//! Daily leaderboard with dense, tie-aware ranks
//!
//! Ranks are dense: tied scores share a rank and the next lower score gets
//! exactly one more, so `[6, 6, 4, 2]` ranks as `[1, 1, 2, 3]`.

use crate::types::{RankedEntry, Submission};

/// Dense rank of every score, aligned with the input order (higher score = better rank)
pub fn dense_ranks(scores: &[u32]) -> Vec<u32> {
    let mut distinct: Vec<u32> = scores.to_vec();
    distinct.sort_unstable_by(|a, b| b.cmp(a));
    distinct.dedup();

    scores
        .iter()
        .map(|score| {
            let position = distinct.iter().position(|s| s == score).unwrap_or(0);
            position as u32 + 1
        })
        .collect()
}

/// Rank every submission of a day, best first
///
/// Hard mode does not matter here; everyone who played shows up. Players
/// with equal scores keep their submission order.
pub fn rank_submissions(submissions: &[Submission]) -> Vec<RankedEntry> {
    let mut sorted: Vec<&Submission> = submissions.iter().collect();
    sorted.sort_by(|a, b| b.calculated_score().cmp(&a.calculated_score()));

    let scores: Vec<u32> = sorted.iter().map(|s| s.calculated_score()).collect();
    let ranks = dense_ranks(&scores);

    sorted
        .into_iter()
        .zip(scores)
        .zip(ranks)
        .map(|((submission, score), rank)| RankedEntry {
            player_id: submission.player_id.clone(),
            hard_mode: submission.hard_mode,
            calculated_score: score,
            rank,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Attempts, PuzzleId};
    use proptest::prelude::*;

    fn submission(player: &str, guesses: u8, hard_mode: bool) -> Submission {
        let attempts = Attempts::solved(guesses).unwrap_or(Attempts::Failed);
        Submission::new(player, PuzzleId(1000), attempts, hard_mode, "")
    }

    #[test]
    fn test_dense_ranks() {
        assert_eq!(dense_ranks(&[6, 6, 4, 2]), vec![1, 1, 2, 3]);
        assert_eq!(dense_ranks(&[2, 6, 4, 6]), vec![3, 1, 2, 1]);
        assert_eq!(dense_ranks(&[]), Vec::<u32>::new());
    }

    #[test]
    fn test_rank_submissions_ties_share_rank() {
        // Scores 6, 6, 4, 2
        let submissions = vec![
            submission("dana", 5, true),
            submission("alice", 1, true),
            submission("bob", 1, false),
            submission("carol", 3, true),
        ];

        let ranked = rank_submissions(&submissions);

        let ranks: Vec<u32> = ranked.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 1, 2, 3]);

        let order: Vec<&str> = ranked.iter().map(|e| e.player_id.as_str()).collect();
        assert_eq!(order, vec!["alice", "bob", "carol", "dana"]);

        // Non hard mode players are ranked too
        assert!(!ranked[1].hard_mode);
    }

    #[test]
    fn test_failed_attempt_ranks_last() {
        let submissions = vec![
            submission("alice", 7, true),
            submission("bob", 6, true),
        ];

        let ranked = rank_submissions(&submissions);
        assert_eq!(ranked[0].player_id, "bob");
        assert_eq!(ranked[1].player_id, "alice");
        assert_eq!(ranked[1].calculated_score, 0);
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn test_empty_day() {
        assert!(rank_submissions(&[]).is_empty());
    }

    proptest! {
        #[test]
        fn prop_dense_ranks_never_skip(scores in prop::collection::vec(0u32..=6, 1..20)) {
            let ranks = dense_ranks(&scores);
            let max_rank = *ranks.iter().max().unwrap();

            let mut distinct = scores.clone();
            distinct.sort_unstable();
            distinct.dedup();
            prop_assert_eq!(max_rank as usize, distinct.len());

            for (i, a) in scores.iter().enumerate() {
                for (j, b) in scores.iter().enumerate() {
                    if a > b {
                        prop_assert!(ranks[i] < ranks[j]);
                    } else if a == b {
                        prop_assert_eq!(ranks[i], ranks[j]);
                    }
                }
            }
        }

        #[test]
        fn prop_leaderboard_matches_dense_ranks(guesses in prop::collection::vec(1u8..=7, 0..20)) {
            let submissions: Vec<Submission> = guesses
                .iter()
                .enumerate()
                .map(|(i, g)| submission(&format!("p{}", i), *g, i % 2 == 0))
                .collect();
            let scores: Vec<u32> = submissions.iter().map(|s| s.calculated_score()).collect();
            let expected = dense_ranks(&scores);

            for entry in rank_submissions(&submissions) {
                let index: usize = entry.player_id[1..].parse().unwrap();
                prop_assert_eq!(entry.rank, expected[index]);
                prop_assert_eq!(entry.calculated_score, scores[index]);
            }
        }
    }
}
