//! Query normalization: spell correction followed by lemma reduction.
//!
//! Split into submodules:
//! - `spell`: compound spelling correction over a frequency dictionary
//! - `lemma`: rule-based lemmatization

mod lemma;
mod spell;

use std::path::Path;

pub use lemma::Lemmatizer;
pub use spell::SpellCorrector;

/// Frequency assigned to lemma forms synthesized into the dictionary.
const LEMMA_CLOSURE_FREQUENCY: u64 = 1;

pub struct QueryNormalizer {
    corrector: SpellCorrector,
    lemmatizer: Lemmatizer,
}

impl QueryNormalizer {
    pub fn load(dictionary_path: &Path) -> Result<Self, String> {
        let corrector = SpellCorrector::load(dictionary_path)?;
        Ok(Self::with_corrector(corrector))
    }

    pub fn with_corrector(mut corrector: SpellCorrector) -> Self {
        let lemmatizer = Lemmatizer::new();
        // Close the dictionary under lemmatization; this is what makes
        // normalize() idempotent.
        let lemmas: Vec<String> = corrector
            .words()
            .map(|word| lemmatizer.lemma(word))
            .filter(|lemma| !corrector.contains(lemma))
            .collect();
        for lemma in lemmas {
            corrector.insert(&lemma, LEMMA_CLOSURE_FREQUENCY);
        }

        Self {
            corrector,
            lemmatizer,
        }
    }

    /// Spell-corrected, lowercased text. Search terms are taken from this
    /// form, before lemma reduction.
    pub fn correct(&self, raw: &str) -> String {
        self.corrector.correct(raw)
    }

    /// Fully normalized text for embedding and keyword comparison:
    /// correction, then lowercased lemmas joined by single spaces.
    pub fn normalize(&self, raw: &str) -> String {
        self.lemmatizer.lemmatize(&self.corrector.correct(raw))
    }

    pub fn lemmatizer(&self) -> &Lemmatizer {
        &self.lemmatizer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> QueryNormalizer {
        let corrector = SpellCorrector::from_lines(
            [
                "zipper 500",
                "jacket 800",
                "dresses 900",
                "jeans 700",
                "tear 400",
                "silk 300",
                "small 250",
                "with 9000",
                "have 9000",
            ]
            .into_iter(),
        );
        QueryNormalizer::with_corrector(corrector)
    }

    #[test]
    fn test_normalize_corrects_then_lemmatizes() {
        let normalizer = normalizer();
        assert_eq!(
            normalizer.normalize("Zipperr on my Jeans"),
            "zipper on my jean"
        );
    }

    #[test]
    fn test_correct_keeps_inflected_form() {
        let normalizer = normalizer();
        assert_eq!(normalizer.correct("torn dresses"), "torn dresses");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let normalizer = normalizer();
        for query in [
            "I have a silk dress with a small tear",
            "Zipperr broken on my jaket",
            "hem my jeans 450",
            "",
            "  Mixed   CASE   input  ",
        ] {
            let once = normalizer.normalize(query);
            assert_eq!(
                normalizer.normalize(&once),
                once,
                "normalize not stable for {query:?}"
            );
        }
    }

    #[test]
    fn test_normalize_never_fails_on_odd_input() {
        let normalizer = QueryNormalizer::with_corrector(SpellCorrector::from_lines([].into_iter()));
        assert_eq!(normalizer.normalize("???  123  !!"), "??? 123 !!");
    }
}
