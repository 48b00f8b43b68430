//! Keyword-tier classification and result assembly.
//!
//! The five buckets and their priority are data (`MATCHERS`), not nested
//! conditionals, so the tie-break rule is visible in one place.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Match-quality tier of one search result. Variants are listed in priority
/// order, best first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MatchBucket {
    ExactService,
    PartialService,
    Description,
    General,
    Semantic,
}

impl MatchBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchBucket::ExactService => "exact_service",
            MatchBucket::PartialService => "partial_service",
            MatchBucket::Description => "description",
            MatchBucket::General => "general",
            MatchBucket::Semantic => "semantic",
        }
    }

    pub fn is_semantic(&self) -> bool {
        matches!(self, MatchBucket::Semantic)
    }
}

/// Lowercased copies of the fields keyword matching runs against.
pub(crate) struct LoweredFields {
    pub service: String,
    pub description: String,
    pub garment: String,
    pub repairer: String,
}

type FieldMatcher = fn(&LoweredFields, &str) -> bool;

/// Keyword tiers in fixed priority order. The first matcher any search term
/// satisfies decides the bucket for a candidate.
const MATCHERS: &[(MatchBucket, FieldMatcher)] = &[
    (MatchBucket::ExactService, |fields, term| {
        fields.service == term
    }),
    (MatchBucket::PartialService, |fields, term| {
        fields.service.contains(term)
    }),
    (MatchBucket::Description, |fields, term| {
        fields.description.contains(term)
    }),
    (MatchBucket::General, |fields, term| {
        fields.garment.contains(term) || fields.repairer.contains(term)
    }),
];

/// Classify one candidate. Returns the bucket and the term that decided it
/// (`None` for a purely semantic match).
pub(crate) fn classify(fields: &LoweredFields, terms: &[String]) -> (MatchBucket, Option<String>) {
    for (bucket, matcher) in MATCHERS {
        if let Some(term) = terms.iter().find(|term| matcher(fields, term.as_str())) {
            return (*bucket, Some(term.clone()));
        }
    }
    (MatchBucket::Semantic, None)
}

/// All buckets in concatenation order.
pub(crate) const BUCKET_ORDER: [MatchBucket; 5] = [
    MatchBucket::ExactService,
    MatchBucket::PartialService,
    MatchBucket::Description,
    MatchBucket::General,
    MatchBucket::Semantic,
];

/// Sort a bucket by similarity descending, NaN-tolerant.
pub(crate) fn sort_bucket<T>(bucket: &mut [T], score: impl Fn(&T) -> f32) {
    bucket.sort_by(|a, b| {
        score(b)
            .partial_cmp(&score(a))
            .unwrap_or(Ordering::Equal)
    });
}

/// Keep results whose price is within `tolerance` of the target. Runs after
/// ranking and truncation; it never backfills, so it can only shrink the
/// list. Applying it twice is the same as applying it once.
pub(crate) fn filter_by_price<T>(
    results: Vec<T>,
    target: f64,
    tolerance: f64,
    price: impl Fn(&T) -> f64,
) -> Vec<T> {
    results
        .into_iter()
        .filter(|item| (price(item) - target).abs() <= tolerance)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(service: &str, description: &str, garment: &str, repairer: &str) -> LoweredFields {
        LoweredFields {
            service: service.to_string(),
            description: description.to_string(),
            garment: garment.to_string(),
            repairer: repairer.to_string(),
        }
    }

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_tier_priority_decides_bucket() {
        let f = fields("zipper", "replace a broken zipper", "jacket", "tailor");

        // exact beats everything
        let (bucket, term) = classify(&f, &terms(&["jacket", "zipper"]));
        assert_eq!(bucket, MatchBucket::ExactService);
        assert_eq!(term.as_deref(), Some("zipper"));

        // partial service beats description
        let f = fields("zipper replacement", "for jackets", "jacket", "tailor");
        let (bucket, term) = classify(&f, &terms(&["jackets", "zipper"]));
        assert_eq!(bucket, MatchBucket::PartialService);
        assert_eq!(term.as_deref(), Some("zipper"));
    }

    #[test]
    fn test_description_and_general_tiers() {
        let f = fields("sole repair", "stitch worn soles", "boots", "cobbler");
        let (bucket, term) = classify(&f, &terms(&["stitch"]));
        assert_eq!(bucket, MatchBucket::Description);
        assert_eq!(term.as_deref(), Some("stitch"));

        let (bucket, term) = classify(&f, &terms(&["cobbler"]));
        assert_eq!(bucket, MatchBucket::General);
        assert_eq!(term.as_deref(), Some("cobbler"));
    }

    #[test]
    fn test_no_term_match_is_semantic() {
        let f = fields("sole repair", "stitch worn soles", "boots", "cobbler");
        let (bucket, term) = classify(&f, &terms(&["velvet"]));
        assert_eq!(bucket, MatchBucket::Semantic);
        assert_eq!(term, None);
        assert!(bucket.is_semantic());
    }

    #[test]
    fn test_first_term_wins_within_a_tier() {
        let f = fields("hem and seam repair", "", "dress", "tailor");
        let (bucket, term) = classify(&f, &terms(&["seam", "hem"]));
        assert_eq!(bucket, MatchBucket::PartialService);
        assert_eq!(term.as_deref(), Some("seam"));
    }

    #[test]
    fn test_price_filter_is_idempotent() {
        let prices = vec![120.0, 400.0, 430.0, 460.0, 900.0];
        let once = filter_by_price(prices.clone(), 450.0, 50.0, |p| *p);
        let twice = filter_by_price(once.clone(), 450.0, 50.0, |p| *p);
        assert_eq!(once, vec![400.0, 430.0, 460.0]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sort_bucket_descending() {
        let mut scores = vec![0.2_f32, 0.9, 0.5];
        sort_bucket(&mut scores, |s| *s);
        assert_eq!(scores, vec![0.9, 0.5, 0.2]);

        // NaN scores must not panic the comparator
        let mut scores = vec![0.2_f32, f32::NAN, 0.9];
        sort_bucket(&mut scores, |s| *s);
        assert_eq!(scores.len(), 3);
    }
}
