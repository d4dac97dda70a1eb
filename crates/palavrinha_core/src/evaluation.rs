//! Guess scoring with duplicate-letter accounting.
//!
//! Exact matches are resolved first and consume their answer letter; the
//! remaining positions then draw from what is left, so an answer letter backs
//! at most one `Correct` or `Present` mark.

use crate::LetterStatus;
use std::collections::HashMap;

/// Scores `guess` against `answer`, ignoring ASCII case.
///
/// # Panics
///
/// Panics if the two words differ in length. Callers validate row length
/// before scoring.
pub fn evaluate(guess: &str, answer: &str) -> Vec<LetterStatus> {
    let guess: Vec<char> = guess.chars().map(|c| c.to_ascii_lowercase()).collect();
    let answer: Vec<char> = answer.chars().map(|c| c.to_ascii_lowercase()).collect();
    assert_eq!(
        guess.len(),
        answer.len(),
        "guess and answer must have the same length"
    );

    let mut remaining: HashMap<char, usize> = HashMap::new();
    for &letter in &answer {
        *remaining.entry(letter).or_default() += 1;
    }

    let mut statuses = vec![LetterStatus::Unknown; guess.len()];

    for (i, (&g, &a)) in guess.iter().zip(&answer).enumerate() {
        if g == a {
            statuses[i] = LetterStatus::Correct;
            if let Some(count) = remaining.get_mut(&g) {
                *count -= 1;
            }
        }
    }

    for (i, &g) in guess.iter().enumerate() {
        if statuses[i] == LetterStatus::Correct {
            continue;
        }
        statuses[i] = match remaining.get_mut(&g) {
            Some(count) if *count > 0 => {
                *count -= 1;
                LetterStatus::Present
            }
            _ => LetterStatus::Absent,
        };
    }

    statuses
}
