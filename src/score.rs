//! Parsing of shared Wordle result text
//!
//! The first line of a share looks like `Wordle 1,234 4/6*`: the puzzle
//! number (thousands separators allowed), guesses or `X` for a failure, and
//! a trailing `*` when hard mode was on. Anything after that line (the emoji
//! grid) is ignored.

use crate::error::RankedError;
use crate::types::{Attempts, PuzzleId, MAX_ATTEMPTS};
use serde::{Deserialize, Serialize};

/// Fields extracted from a share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedScore {
    pub puzzle: PuzzleId,
    pub attempts: Attempts,
    pub hard_mode: bool,
}

/// Parse the header of a shared result
pub fn parse_score(text: &str) -> crate::error::Result<ParsedScore> {
    let invalid = || RankedError::InvalidScoreText {
        text: text.to_string(),
    };

    let header = text.trim_start().lines().next().ok_or_else(invalid)?;
    let rest = header.strip_prefix("Wordle ").ok_or_else(invalid)?;

    let mut parts = rest.split_whitespace();
    let puzzle_part = parts.next().ok_or_else(invalid)?;
    let result_part = parts.next().ok_or_else(invalid)?;

    let digits: String = puzzle_part.chars().filter(|c| *c != ',').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid().into());
    }
    let puzzle: u32 = digits.parse().map_err(|_| invalid())?;

    let (result_part, hard_mode) = match result_part.strip_suffix('*') {
        Some(stripped) => (stripped, true),
        None => (result_part, false),
    };

    let (guesses, out_of) = result_part.split_once('/').ok_or_else(invalid)?;
    if out_of != MAX_ATTEMPTS.to_string() {
        return Err(invalid().into());
    }

    let attempts = if guesses == "X" {
        Attempts::Failed
    } else {
        let count: u8 = guesses.parse().map_err(|_| invalid())?;
        Attempts::solved(count).ok_or_else(invalid)?
    };

    Ok(ParsedScore {
        puzzle: PuzzleId(puzzle),
        attempts,
        hard_mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_mode_share() {
        let share = "Wordle 1,234 4/6*\n\n⬛🟨⬛⬛⬛\n🟩🟩🟩🟩🟩";
        let parsed = parse_score(share).unwrap();
        assert_eq!(parsed.puzzle, PuzzleId(1234));
        assert_eq!(parsed.attempts, Attempts::solved(4).unwrap());
        assert!(parsed.hard_mode);
        assert_eq!(parsed.attempts.calculated_score(), 3);
    }

    #[test]
    fn test_normal_mode_share() {
        let parsed = parse_score("Wordle 987 2/6").unwrap();
        assert_eq!(parsed.puzzle, PuzzleId(987));
        assert_eq!(parsed.attempts, Attempts::solved(2).unwrap());
        assert!(!parsed.hard_mode);
    }

    #[test]
    fn test_failed_share() {
        let parsed = parse_score("Wordle 1,001 X/6*").unwrap();
        assert_eq!(parsed.attempts, Attempts::Failed);
        assert_eq!(parsed.attempts.calculated_score(), 0);
    }

    #[test]
    fn test_invalid_shares() {
        for text in [
            "",
            "Nerdle 123 4/6",
            "Wordle abc 4/6",
            "Wordle 123",
            "Wordle 123 7/6",
            "Wordle 123 0/6",
            "Wordle 123 4/8",
            "Wordle 123 Y/6",
        ] {
            let err = parse_score(text).unwrap_err();
            assert!(
                matches!(
                    err.downcast_ref::<RankedError>(),
                    Some(RankedError::InvalidScoreText { .. })
                ),
                "expected invalid score for {:?}",
                text
            );
        }
    }
}
