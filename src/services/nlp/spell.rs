//! Compound spell correction over a fixed frequency dictionary.
//!
//! Two-stage approach like the fuzzy entity lookup it is modeled on:
//! 1. length window - cheap candidate filtering
//! 2. strsim (Levenshtein) - accurate ranking on filtered candidates

use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Maximum edit distance for a correction candidate
const MAX_EDIT_DISTANCE: usize = 2;

/// Tokens this short are left alone; correcting them causes more harm than good
const MIN_TOKEN_LEN: usize = 3;

/// Frequency-ranked spelling dictionary.
///
/// Dictionary lines are `word<space>frequency`, the same shape as the stock
/// SymSpell frequency dictionary the dataset tooling uses.
pub struct SpellCorrector {
    frequencies: HashMap<String, u64>,
    /// Entries in dictionary order, for deterministic tie-breaks.
    entries: Vec<(String, u64)>,
}

impl SpellCorrector {
    pub fn load(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read dictionary {}: {}", path.display(), e))?;
        Ok(Self::from_lines(contents.lines()))
    }

    pub fn from_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Self {
        let mut frequencies = HashMap::new();
        let mut entries = Vec::new();
        for line in lines {
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else { continue };
            let frequency = parts
                .next()
                .and_then(|raw| raw.parse::<u64>().ok())
                .unwrap_or(1);
            let word = word.to_lowercase();
            if frequencies.insert(word.clone(), frequency).is_none() {
                entries.push((word, frequency));
            }
        }
        Self {
            frequencies,
            entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.frequencies.contains_key(word)
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(word, _)| word.as_str())
    }

    /// Insert a word unless it is already present.
    pub fn insert(&mut self, word: &str, frequency: u64) {
        if !self.frequencies.contains_key(word) {
            self.frequencies.insert(word.to_string(), frequency);
            self.entries.push((word.to_string(), frequency));
        }
    }

    /// Correct a whole input, token by token, returning the best compound
    /// suggestion. Tokens with no dictionary candidate within
    /// [`MAX_EDIT_DISTANCE`] pass through unchanged; the result is always
    /// lowercased. Never fails.
    pub fn correct(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        lowered
            .split_whitespace()
            .map(|token| self.correct_token(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn correct_token(&self, token: &str) -> String {
        if token.len() < MIN_TOKEN_LEN
            || !token.chars().all(|c| c.is_alphabetic())
            || self.frequencies.contains_key(token)
        {
            return token.to_string();
        }

        let mut best: Option<(&str, usize, u64)> = None;
        for (word, frequency) in &self.entries {
            if word.len().abs_diff(token.len()) > MAX_EDIT_DISTANCE {
                continue;
            }
            let distance = strsim::levenshtein(token, word);
            if distance > MAX_EDIT_DISTANCE {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, best_distance, best_frequency)) => {
                    distance < best_distance
                        || (distance == best_distance && *frequency > best_frequency)
                }
            };
            if better {
                best = Some((word, distance, *frequency));
            }
        }

        match best {
            Some((word, _, _)) => word.to_string(),
            None => token.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corrector() -> SpellCorrector {
        SpellCorrector::from_lines(
            [
                "zipper 500",
                "jacket 800",
                "dress 900",
                "tear 400",
                "broken 300",
                "the 10000",
            ]
            .into_iter(),
        )
    }

    #[test]
    fn test_corrects_misspelled_tokens() {
        let corrector = corrector();
        assert_eq!(corrector.correct("zipperr on my jaket"), "zipper on my jacket");
    }

    #[test]
    fn test_keeps_dictionary_words_and_digits() {
        let corrector = corrector();
        // digits and in-dictionary words never change
        assert_eq!(corrector.correct("Dress 450 teat"), "dress 450 tear");
    }

    #[test]
    fn test_unknown_tokens_pass_through() {
        let corrector = corrector();
        assert_eq!(corrector.correct("xylophone"), "xylophone");
    }

    #[test]
    fn test_frequency_breaks_distance_ties() {
        let corrector = SpellCorrector::from_lines(["cat 10", "car 900"].into_iter());
        // "caw" is distance 1 from both; higher frequency wins
        assert_eq!(corrector.correct("caw"), "car");
    }

    #[test]
    fn test_empty_dictionary_lowercases_only() {
        let corrector = SpellCorrector::from_lines([].into_iter());
        assert_eq!(corrector.correct("Torn Dress"), "torn dress");
    }
}
