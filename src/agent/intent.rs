//! Intent detection and repair-context extraction.
//!
//! A fixed rule cascade decides most turns; only text no rule claims is sent
//! to the generative fallback, constrained to the canonical label set.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::services::ai::TextCompletion;

/// What the user is trying to do this turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    RepairRequest,
    ServiceSelection,
    Confirmation,
    Cancel,
    ManualAdditionRequest,
    DeclineAddition,
    IntroduceSelf,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::RepairRequest => "repair_request",
            Intent::ServiceSelection => "service_selection",
            Intent::Confirmation => "confirmation",
            Intent::Cancel => "cancel",
            Intent::ManualAdditionRequest => "manual_addition_request",
            Intent::DeclineAddition => "decline_addition",
            Intent::IntroduceSelf => "introduce_self",
            Intent::Unknown => "unknown",
        }
    }
}

/// Entities pulled out of free text, merged cumulatively into the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepairContext {
    pub garment_type: Option<String>,
    pub fabric_type: Option<String>,
    pub damage_type: Option<String>,
}

impl RepairContext {
    pub fn is_empty(&self) -> bool {
        self.garment_type.is_none() && self.fabric_type.is_none() && self.damage_type.is_none()
    }

    /// Merge newly extracted fields over this context. A found value
    /// overwrites, an absent one preserves what an earlier turn mentioned.
    pub fn merge_from(&mut self, other: &RepairContext) {
        if other.garment_type.is_some() {
            self.garment_type = other.garment_type.clone();
        }
        if other.fabric_type.is_some() {
            self.fabric_type = other.fabric_type.clone();
        }
        if other.damage_type.is_some() {
            self.damage_type = other.damage_type.clone();
        }
    }

    /// "silk dress", "dress", "silk" or the fallback, for response text.
    pub fn garment_phrase(&self, fallback: &str) -> String {
        match (&self.fabric_type, &self.garment_type) {
            (_, Some(garment)) => garment.clone(),
            (Some(fabric), None) => format!("{fabric} item"),
            (None, None) => fallback.to_string(),
        }
    }
}

/// Garment vocabulary, scanned in order; first match wins.
const GARMENTS: &[&str] = &[
    "dress", "shirt", "pants", "jacket", "coat", "blouse", "skirt", "suit", "jeans", "trousers",
    "sweater", "cardigan", "blazer", "shorts", "top", "outfit", "clothing", "garment", "clothes",
];

const FABRICS: &[&str] = &[
    "silk", "cotton", "wool", "linen", "polyester", "denim", "leather", "cashmere", "satin",
    "chiffon", "velvet", "corduroy",
];

const DAMAGE_TYPES: &[&str] = &[
    "tear", "hole", "stain", "zipper", "button", "seam", "hem", "rip", "worn", "faded", "shrunk",
    "stretched", "loose", "tight", "broken", "damaged", "ruined", "falling apart", "needs fixing",
];

const CONFIRM_TERMS: &[&str] = &["yes", "confirm", "ok", "okay", "looks good"];

const DECLINE_TERMS: &[&str] = &[
    "no more",
    "that's all",
    "no additional",
    "no other",
    "just these",
    "no thanks",
];

const CANCEL_TERMS: &[&str] = &["no", "cancel", "nevermind", "back"];

const MANUAL_ADDITION_TERMS: &[&str] = &[
    "add more",
    "add other",
    "add additional",
    "manually add",
    "other services",
];

const INTRO_TERMS: &[&str] = &["my name is", "i am", "i'm", "call me"];

const GREETING_TERMS: &[&str] = &["hi", "hello", "hey", "start", "begin"];

/// Labels the generative fallback may return.
const FALLBACK_LABELS: &[(&str, Intent)] = &[
    ("repair_request", Intent::RepairRequest),
    ("greeting", Intent::Greeting),
    ("service_selection", Intent::ServiceSelection),
    ("confirmation", Intent::Confirmation),
    ("unknown", Intent::Unknown),
];

pub struct IntentClassifier {
    fallback: Option<Arc<dyn TextCompletion>>,
}

impl IntentClassifier {
    pub fn new(fallback: Option<Arc<dyn TextCompletion>>) -> Self {
        Self { fallback }
    }

    /// Classify a turn. Context extraction always runs, whatever intent rule
    /// fires, so the session can accumulate garment/fabric/damage mentions.
    pub async fn classify(&self, text: &str) -> (Intent, RepairContext) {
        let context = extract_context(text);

        if let Some(intent) = rule_intent(text, &context) {
            return (intent, context);
        }

        let intent = self.fallback_intent(text, &context).await;
        (intent, context)
    }

    async fn fallback_intent(&self, text: &str, context: &RepairContext) -> Intent {
        let degraded = || {
            if context.is_empty() {
                Intent::Unknown
            } else {
                Intent::RepairRequest
            }
        };

        let Some(fallback) = &self.fallback else {
            return degraded();
        };

        match fallback.complete(&fallback_prompt(text)).await {
            Ok(label) => {
                let label = label.trim().to_lowercase();
                FALLBACK_LABELS
                    .iter()
                    .find(|(name, _)| *name == label)
                    .map(|(_, intent)| *intent)
                    .unwrap_or_else(degraded)
            }
            Err(err) => {
                tracing::warn!(error = %err, "intent fallback unavailable");
                degraded()
            }
        }
    }
}

/// The deterministic rule cascade. `None` means no rule claimed the turn.
fn rule_intent(text: &str, context: &RepairContext) -> Option<Intent> {
    let trimmed = text.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Some(Intent::ServiceSelection);
    }

    let lowered = text.to_lowercase();
    if contains_any_term(&lowered, CONFIRM_TERMS) {
        return Some(Intent::Confirmation);
    }
    if contains_any_term(&lowered, DECLINE_TERMS) {
        return Some(Intent::DeclineAddition);
    }
    if contains_any_term(&lowered, CANCEL_TERMS) {
        return Some(Intent::Cancel);
    }
    if contains_any_term(&lowered, MANUAL_ADDITION_TERMS) {
        return Some(Intent::ManualAdditionRequest);
    }
    if contains_any_term(&lowered, INTRO_TERMS) {
        return Some(Intent::IntroduceSelf);
    }
    if contains_any_term(&lowered, GREETING_TERMS) {
        return Some(Intent::Greeting);
    }
    if !context.is_empty() {
        return Some(Intent::RepairRequest);
    }

    None
}

/// Scan the fixed vocabularies. Matching is substring-based so inflected
/// forms still hit ("dresses" contains "dress").
pub fn extract_context(text: &str) -> RepairContext {
    let lowered = text.to_lowercase();

    let mut context = RepairContext {
        garment_type: GARMENTS
            .iter()
            .find(|garment| lowered.contains(*garment))
            .map(|garment| (*garment).to_string()),
        fabric_type: FABRICS
            .iter()
            .find(|fabric| lowered.contains(*fabric))
            .map(|fabric| (*fabric).to_string()),
        damage_type: DAMAGE_TYPES
            .iter()
            .find(|damage| lowered.contains(*damage))
            .map(|damage| (*damage).to_string()),
    };

    // "silk" + "dress" -> "silk dress", unless the garment already names the fabric
    if let (Some(fabric), Some(garment)) = (&context.fabric_type, &context.garment_type) {
        if !garment.contains(fabric.as_str()) {
            context.garment_type = Some(format!("{fabric} {garment}"));
        }
    }

    context
}

/// Pull a name out of an introduction ("my name is Maria" -> "Maria").
pub fn extract_name(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    for pattern in INTRO_TERMS {
        let Some(position) = lowered.find(pattern) else {
            continue;
        };
        let rest = &lowered[position + pattern.len()..];
        let name = rest
            .split_whitespace()
            .next()?
            .trim_matches(|c: char| !c.is_alphabetic());
        if name.is_empty() {
            continue;
        }
        let mut chars = name.chars();
        let first = chars.next()?;
        return Some(format!("{}{}", first.to_uppercase(), chars.as_str()));
    }
    None
}

/// Whole-word (or whole-phrase) containment; substring matching would turn
/// "shirt" into a greeting via "hi".
fn contains_any_term(lowered: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| contains_term(lowered, term))
}

fn contains_term(lowered: &str, term: &str) -> bool {
    let mut from = 0;
    while let Some(position) = lowered[from..].find(term) {
        let start = from + position;
        let end = start + term.len();
        let boundary_before = start == 0
            || !lowered[..start]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric());
        let boundary_after = end == lowered.len()
            || !lowered[end..].chars().next().is_some_and(|c| c.is_alphanumeric());
        if boundary_before && boundary_after {
            return true;
        }
        from = end;
    }
    false
}

fn fallback_prompt(text: &str) -> String {
    format!(
        "You are an intent classifier for a clothing repair service.\n\n\
User said: \"{text}\"\n\n\
Based on this input, classify the intent as one of:\n\
- repair_request: User needs clothing repair/alteration/fixing\n\
- greeting: User is saying hello or starting conversation\n\
- service_selection: User is selecting from options\n\
- confirmation: User is confirming something\n\
- unknown: Doesn't fit any category\n\n\
Respond with ONLY the intent name, nothing else."
    )
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct ScriptedCompletion(Result<String, String>);

    #[async_trait]
    impl TextCompletion for ScriptedCompletion {
        async fn complete(&self, _prompt: &str) -> Result<String, String> {
            self.0.clone()
        }
    }

    fn rules_only() -> IntentClassifier {
        IntentClassifier::new(None)
    }

    #[tokio::test]
    async fn test_numeric_input_is_selection() {
        let (intent, _) = rules_only().classify("1").await;
        assert_eq!(intent, Intent::ServiceSelection);
        let (intent, _) = rules_only().classify("  42 ").await;
        assert_eq!(intent, Intent::ServiceSelection);
    }

    #[tokio::test]
    async fn test_silk_dress_scenario() {
        let (intent, context) = rules_only()
            .classify("I have a silk dress with a small tear")
            .await;
        assert_eq!(intent, Intent::RepairRequest);
        assert_eq!(context.fabric_type.as_deref(), Some("silk"));
        assert_eq!(context.garment_type.as_deref(), Some("silk dress"));
        assert_eq!(context.damage_type.as_deref(), Some("tear"));
    }

    #[tokio::test]
    async fn test_whole_word_matching() {
        // "shirt" contains "hi" but is not a greeting
        let (intent, context) = rules_only().classify("shirt").await;
        assert_eq!(intent, Intent::RepairRequest);
        assert_eq!(context.garment_type.as_deref(), Some("shirt"));

        let (intent, _) = rules_only().classify("hi there").await;
        assert_eq!(intent, Intent::Greeting);
    }

    #[tokio::test]
    async fn test_decline_beats_cancel() {
        let (intent, _) = rules_only().classify("no thanks").await;
        assert_eq!(intent, Intent::DeclineAddition);
        let (intent, _) = rules_only().classify("no").await;
        assert_eq!(intent, Intent::Cancel);
    }

    #[tokio::test]
    async fn test_confirmation_beats_context() {
        let (intent, context) = rules_only().classify("yes, the dress one").await;
        assert_eq!(intent, Intent::Confirmation);
        // context is still extracted for the session to keep
        assert_eq!(context.garment_type.as_deref(), Some("dress"));
    }

    #[tokio::test]
    async fn test_manual_addition_and_intro() {
        let (intent, _) = rules_only().classify("please add more services").await;
        assert_eq!(intent, Intent::ManualAdditionRequest);
        let (intent, _) = rules_only().classify("my name is maria").await;
        assert_eq!(intent, Intent::IntroduceSelf);
        assert_eq!(extract_name("my name is maria").as_deref(), Some("Maria"));
    }

    #[tokio::test]
    async fn test_fallback_valid_label() {
        let classifier = IntentClassifier::new(Some(Arc::new(ScriptedCompletion(Ok(
            "Greeting".to_string(),
        )))));
        let (intent, _) = classifier.classify("howdy partner").await;
        assert_eq!(intent, Intent::Greeting);
    }

    #[tokio::test]
    async fn test_fallback_invalid_label_degrades() {
        let classifier = IntentClassifier::new(Some(Arc::new(ScriptedCompletion(Ok(
            "not-a-label".to_string(),
        )))));
        let (intent, _) = classifier.classify("gibberish words").await;
        assert_eq!(intent, Intent::Unknown);
    }

    #[tokio::test]
    async fn test_fallback_error_degrades_to_unknown() {
        let classifier = IntentClassifier::new(Some(Arc::new(ScriptedCompletion(Err(
            "connection refused".to_string(),
        )))));
        let (intent, _) = classifier.classify("asdf qwerty").await;
        assert_eq!(intent, Intent::Unknown);
    }

    #[tokio::test]
    async fn test_context_claims_turn_before_fallback() {
        // the fallback would say greeting, but found context wins first
        let classifier = IntentClassifier::new(Some(Arc::new(ScriptedCompletion(Ok(
            "greeting".to_string(),
        )))));
        let (intent, context) = classifier.classify("linen needs attention").await;
        assert_eq!(intent, Intent::RepairRequest);
        assert_eq!(context.fabric_type.as_deref(), Some("linen"));
    }

    #[test]
    fn test_context_merge_keeps_earlier_fields() {
        let mut session = RepairContext {
            garment_type: Some("dress".to_string()),
            fabric_type: Some("silk".to_string()),
            damage_type: None,
        };
        session.merge_from(&RepairContext {
            garment_type: None,
            fabric_type: None,
            damage_type: Some("tear".to_string()),
        });
        assert_eq!(session.garment_type.as_deref(), Some("dress"));
        assert_eq!(session.fabric_type.as_deref(), Some("silk"));
        assert_eq!(session.damage_type.as_deref(), Some("tear"));
    }

    #[test]
    fn test_fabric_garment_concatenation_dedup() {
        let context = extract_context("my denim jeans ripped");
        assert_eq!(context.fabric_type.as_deref(), Some("denim"));
        assert_eq!(context.garment_type.as_deref(), Some("denim jeans"));
        assert_eq!(context.damage_type.as_deref(), Some("rip"));
    }
}
