//! Rule-based lemma reduction for indexing and keyword comparison.

/// Irregular forms the suffix rules cannot reach. Mostly garment and damage
/// vocabulary, since that is what the catalog and queries are made of.
const IRREGULARS: &[(&str, &str)] = &[
    ("torn", "tear"),
    ("ripped", "rip"),
    ("worn", "wear"),
    ("broken", "break"),
    ("shrunk", "shrink"),
    ("shrunken", "shrink"),
    ("faded", "fade"),
    ("damaged", "damage"),
    ("ruined", "ruin"),
    ("stretched", "stretch"),
    ("stitched", "stitch"),
    ("frayed", "fray"),
    ("clothes", "clothe"),
    ("children", "child"),
    ("feet", "foot"),
    ("men", "man"),
    ("women", "woman"),
];

pub struct Lemmatizer;

impl Lemmatizer {
    pub fn new() -> Self {
        Self
    }

    /// Lowercase every token, reduce it to its lemma and join with single
    /// spaces. Non-alphabetic tokens pass through untouched.
    pub fn lemmatize(&self, text: &str) -> String {
        text.to_lowercase()
            .split_whitespace()
            .map(|token| self.lemma(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Reduce a single lowercased token. Idempotent: `lemma(lemma(w)) == lemma(w)`.
    pub fn lemma(&self, word: &str) -> String {
        if word.len() <= 3 || !word.chars().all(|c| c.is_alphabetic()) {
            return word.to_string();
        }

        if let Some((_, lemma)) = IRREGULARS.iter().find(|(form, _)| *form == word) {
            return (*lemma).to_string();
        }

        if let Some(stem) = word.strip_suffix("ies").filter(|s| s.len() >= 2) {
            return format!("{stem}y");
        }
        if let Some(stem) = word.strip_suffix("sses") {
            return format!("{stem}ss");
        }
        for suffix in ["shes", "ches", "xes", "zes"] {
            if let Some(stem) = word.strip_suffix(suffix) {
                return format!("{stem}{}", &suffix[..suffix.len() - 2]);
            }
        }
        if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
            return word.to_string();
        }
        if let Some(stem) = word.strip_suffix("ing").filter(|s| s.len() >= 3) {
            return undouble(stem);
        }
        if let Some(stem) = word.strip_suffix("ed").filter(|s| s.len() >= 3) {
            return undouble(stem);
        }
        if let Some(stem) = word.strip_suffix('s') {
            return stem.to_string();
        }

        word.to_string()
    }
}

/// Drop the second of a doubled trailing consonant: "hemm" -> "hem".
fn undouble(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    if n >= 2 && chars[n - 1] == chars[n - 2] && !"aeiou".contains(chars[n - 1]) {
        chars[..n - 1].iter().collect()
    } else {
        stem.to_string()
    }
}
