// 会话命令模块

use crate::agent::{ChatTurnResponse, ConversationPhase, Intent, RepairContext};
use crate::error::AppError;
use crate::utils::validate_not_empty;
use crate::{AppResult, AppState};

use super::ChatRequest;

const APOLOGY: &str = "I apologize, but I'm having trouble right now. Please describe what \
     clothing item needs repair and I'll try to help!";

/// One conversational turn.
///
/// Anything unexpected inside the engine is converted into an apologetic
/// canned reply with the error logged, so the conversation keeps going
/// instead of failing hard.
pub async fn chat(state: &AppState, payload: ChatRequest) -> AppResult<ChatTurnResponse> {
    let session_id = validate_not_empty(&payload.session_id, "session_id")?;
    let user_input = payload.user_input.trim();
    if user_input.is_empty() {
        return Err(AppError::Validation("user_input 不能为空".to_string()));
    }

    match state.agent.handle_turn(session_id, user_input).await {
        Ok(response) => Ok(response),
        Err(err) => {
            tracing::error!(session_id, error = %err, "turn processing failed");
            Ok(apology_response(session_id))
        }
    }
}

fn apology_response(session_id: &str) -> ChatTurnResponse {
    ChatTurnResponse {
        session_id: session_id.to_string(),
        intent: Intent::Unknown,
        response: APOLOGY.to_string(),
        conversation_state: ConversationPhase::Greeting,
        show_services: false,
        services: Vec::new(),
        selected_services: Vec::new(),
        order_summary: None,
        order_created: None,
        context: RepairContext::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::search::SearchHandle;

    #[tokio::test]
    async fn test_chat_degrades_to_apology_when_not_ready() {
        // search never becomes ready; a repair request inside the engine
        // fails, but the conversation must keep going
        let state = AppState::with_search(SearchHandle::new_pending());
        let response = chat(
            &state,
            ChatRequest {
                session_id: "s1".to_string(),
                user_input: "tear in my dress".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(response.response, APOLOGY);
        assert_eq!(response.conversation_state, ConversationPhase::Greeting);
    }

    #[tokio::test]
    async fn test_chat_rejects_blank_input() {
        let state = AppState::with_search(SearchHandle::new_pending());
        let err = chat(
            &state,
            ChatRequest {
                session_id: "s1".to_string(),
                user_input: "   ".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_greeting_works_while_search_loads() {
        // turns that never touch the search engine succeed during boot
        let state = AppState::with_search(SearchHandle::new_pending());
        let response = chat(
            &state,
            ChatRequest {
                session_id: "s1".to_string(),
                user_input: "hello".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(response.intent, Intent::Greeting);
        assert!(!response.response.is_empty());
    }
}
