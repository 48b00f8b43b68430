//! Response generation for conversational turns.
//!
//! Deterministic turns (search results, selections, confirmations) are
//! templated by the conversation engine; greetings and unclassified turns go
//! through the pluggable completion capability here. Any generation failure
//! degrades to canned text and is logged, never propagated.

use std::sync::Arc;

use super::llm::TextCompletion;

const CANNED_GREETING: &str =
    "Hi! I help with clothing repairs and alterations. What garment needs fixing today?";

const CANNED_FALLBACK: &str = "I apologize, but I'm having trouble generating a response right \
     now. Please describe what clothing item needs repair and I'll do my best to help!";

pub struct ResponseGenerator {
    completion: Option<Arc<dyn TextCompletion>>,
}

impl ResponseGenerator {
    pub fn new(completion: Option<Arc<dyn TextCompletion>>) -> Self {
        Self { completion }
    }

    /// A short greeting for the start of a conversation.
    pub async fn greeting(&self) -> String {
        self.complete_or(&greeting_prompt(), CANNED_GREETING).await
    }

    /// Free-form reply for turns no deterministic rule handled.
    /// `context_clues` are already-formatted fragments like "garment: dress".
    pub async fn general(&self, user_input: &str, context_clues: &[String]) -> String {
        self.complete_or(&general_prompt(user_input, context_clues), CANNED_FALLBACK)
            .await
    }

    async fn complete_or(&self, prompt: &str, canned: &str) -> String {
        let Some(completion) = &self.completion else {
            return canned.to_string();
        };

        match completion.complete(prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => canned.to_string(),
            Err(err) => {
                tracing::warn!(error = %err, "response generation failed");
                canned.to_string()
            }
        }
    }
}

fn greeting_prompt() -> String {
    "Generate a brief greeting (maximum 25 words) for a clothing repair service.\n\n\
Example: \"Hi! I help with clothing repairs and alterations. What garment needs fixing today?\"\n\n\
Keep it short and friendly."
        .to_string()
}

fn general_prompt(user_input: &str, context_clues: &[String]) -> String {
    let context_info = if context_clues.is_empty() {
        String::new()
    } else {
        format!(" I noticed you mentioned: {}.", context_clues.join(", "))
    };

    format!(
        "You are a helpful AI assistant for a clothing repair service.{context_info}\n\n\
User said: \"{user_input}\"\n\n\
Keep it short and direct."
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

    #[tokio::test]
    async fn test_canned_greeting_without_capability() {
        let generator = ResponseGenerator::new(None);
        assert_eq!(generator.greeting().await, CANNED_GREETING);
    }

    #[tokio::test]
    async fn test_generated_text_is_trimmed() {
        let generator = ResponseGenerator::new(Some(Arc::new(ScriptedCompletion(Ok(
            "  Hello there!  ".to_string(),
        )))));
        assert_eq!(generator.greeting().await, "Hello there!");
    }

    #[tokio::test]
    async fn test_failure_degrades_to_canned_text() {
        let generator = ResponseGenerator::new(Some(Arc::new(ScriptedCompletion(Err(
            "connection refused".to_string(),
        )))));
        let reply = generator.general("what do you do", &[]).await;
        assert_eq!(reply, CANNED_FALLBACK);
    }

    #[tokio::test]
    async fn test_blank_generation_degrades_to_canned_text() {
        let generator =
            ResponseGenerator::new(Some(Arc::new(ScriptedCompletion(Ok("  ".to_string())))));
        assert_eq!(generator.greeting().await, CANNED_GREETING);
    }

    #[test]
    fn test_general_prompt_includes_context_clues() {
        let prompt = general_prompt("help", &["garment: dress".to_string()]);
        assert!(prompt.contains("garment: dress"));
        let prompt = general_prompt("help", &[]);
        assert!(!prompt.contains("I noticed"));
    }
}
