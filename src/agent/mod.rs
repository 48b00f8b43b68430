//! Conversation engine for repair-order building.
//!
//! Split into submodules:
//! - `intent`: rule cascade + generative fallback classification
//! - `order`: preview/summary assembly
//! - `session`: per-session state and store
//!
//! This module owns the state machine itself: one `handle_turn` call is one
//! synchronous request/response turn, holding the session lock throughout.

mod intent;
mod order;
mod session;

use std::sync::Arc;

use serde::Serialize;

pub use intent::{extract_context, extract_name, Intent, IntentClassifier, RepairContext};
pub use order::{finalize, preview, OrderPreview, OrderSummary};
pub use session::{
    ConversationPhase, SessionOverview, SessionState, SessionStore, TurnRecord,
};

use crate::error::AppResult;
use crate::services::ai::ResponseGenerator;
use crate::services::search::{SearchHandle, ServiceItem, MAX_RESULTS};

/// At most this many suggestions are offered for selection per search.
const SUGGESTION_LIMIT: usize = 5;

/// Everything one conversational turn reports back to the caller.
#[derive(Debug, Serialize)]
pub struct ChatTurnResponse {
    pub session_id: String,
    pub intent: Intent,
    pub response: String,
    pub conversation_state: ConversationPhase,
    pub show_services: bool,
    pub services: Vec<ServiceItem>,
    pub selected_services: Vec<ServiceItem>,
    pub order_summary: Option<OrderPreview>,
    pub order_created: Option<OrderSummary>,
    pub context: RepairContext,
}

pub struct ChatAgent {
    search: SearchHandle,
    classifier: IntentClassifier,
    generator: ResponseGenerator,
    sessions: Arc<SessionStore>,
}

impl ChatAgent {
    pub fn new(
        search: SearchHandle,
        classifier: IntentClassifier,
        generator: ResponseGenerator,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            search,
            classifier,
            generator,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Run one turn. The session mutex is held for the whole turn, so two
    /// requests racing on the same session id are serialized.
    pub async fn handle_turn(
        &self,
        session_id: &str,
        user_input: &str,
    ) -> AppResult<ChatTurnResponse> {
        let session = self.sessions.get_or_create(session_id).await;
        let mut session = session.lock().await;

        let (intent, context) = self.classifier.classify(user_input).await;
        session.context.merge_from(&context);
        session.history.push(TurnRecord {
            content: user_input.to_string(),
            intent,
            context: context.clone(),
        });

        tracing::debug!(
            session_id,
            intent = intent.as_str(),
            phase = session.phase.as_str(),
            "handling turn"
        );

        let reply = match intent {
            Intent::RepairRequest => self.on_repair_request(&mut session, user_input).await?,
            Intent::ServiceSelection => self.on_service_selection(&mut session, user_input),
            Intent::Confirmation => self.on_confirmation(&mut session),
            Intent::Cancel => self.on_cancel(&mut session),
            Intent::DeclineAddition => self.on_decline_addition(&mut session),
            Intent::ManualAdditionRequest => self.on_manual_addition_request(&mut session),
            Intent::IntroduceSelf => self.on_introduce_self(&mut session, user_input),
            Intent::Greeting => self.on_greeting(&mut session).await,
            Intent::Unknown => self.on_unknown(&mut session, user_input).await,
        };

        Ok(ChatTurnResponse {
            session_id: session_id.to_string(),
            intent,
            response: reply.response,
            conversation_state: session.phase,
            show_services: reply.show_services,
            services: reply.services,
            selected_services: reply.selected_services,
            order_summary: reply.order_summary,
            order_created: reply.order_created,
            context,
        })
    }

    async fn on_repair_request(
        &self,
        session: &mut SessionState,
        user_input: &str,
    ) -> AppResult<TurnReply> {
        if session.phase == ConversationPhase::Confirming {
            return Ok(TurnReply::text(
                "Please answer yes to confirm the order, or cancel to go back.",
            ));
        }

        let engine = self.search.current()?;
        let services = engine.search(user_input, MAX_RESULTS).await;

        // a new search from the completed state starts a fresh order
        if session.phase != ConversationPhase::ManualAddition {
            session.selected_services.clear();
        }
        session.pending_order = None;
        session.completed_order = None;
        session.current_query = Some(user_input.to_string());

        let garment = session.context.garment_phrase("garment");

        if services.is_empty() {
            session.suggested_services.clear();
            session.phase = ConversationPhase::Searching;
            return Ok(TurnReply::text(format!(
                "I couldn't find services for your {garment}. Could you describe the damage in \
                 more detail?"
            )));
        }

        session.suggested_services = services.into_iter().take(SUGGESTION_LIMIT).collect();
        session.phase = ConversationPhase::Selecting;

        let text = format!(
            "Found {} matching repair services for your {garment}. Here are your options:",
            session.suggested_services.len()
        );
        Ok(TurnReply::with_services(text, session))
    }

    fn on_service_selection(&self, session: &mut SessionState, user_input: &str) -> TurnReply {
        if session.phase != ConversationPhase::Selecting || session.suggested_services.is_empty() {
            return TurnReply::text(
                "Please start by describing what needs to be repaired first.",
            );
        }

        let available = session.suggested_services.len();
        let selection = user_input.trim().parse::<usize>().ok();
        let Some(index) = selection.filter(|n| (1..=available).contains(n)) else {
            // malformed or out-of-range input re-prompts without a state change
            let given = user_input.trim();
            tracing::debug!(given, available, "invalid selection");
            let text = format!("Please select a service between 1 and {available}.");
            return TurnReply::with_services(text, session);
        };

        let service = session.suggested_services[index - 1].clone();
        let already_selected = session.selected_services.iter().any(|selected| {
            selected.service == service.service
                && selected.garment_type == service.garment_type
                && selected.price == service.price
        });
        if !already_selected {
            session.selected_services.push(service);
        }

        let Ok(order_preview) = order::preview(&session.selected_services) else {
            return TurnReply::text("Please select a service from the options above.");
        };
        session.pending_order = Some(order_preview.clone());
        session.phase = ConversationPhase::Confirming;

        let text = if session.selected_services.len() == 1 {
            let selected = &session.selected_services[0];
            format!(
                "Great choice! You've selected:\n\n**{}** - {}\n{}\n\nWould you like to confirm \
                 this service?",
                selected.service,
                format_price(selected.price),
                selected.description
            )
        } else {
            format!(
                "Order so far:\n\n{}\n\n**Total Price:** {}{}\n\nDo you want to confirm and \
                 create this order?",
                format_service_list(&session.selected_services, false),
                format_price(order_preview.total_price),
                format_hours(order_preview.estimated_total_hours)
            )
        };

        TurnReply {
            response: text,
            selected_services: session.selected_services.clone(),
            order_summary: session.pending_order.clone(),
            ..TurnReply::default()
        }
    }

    fn on_confirmation(&self, session: &mut SessionState) -> TurnReply {
        match session.phase {
            ConversationPhase::Confirming => {
                let Some(order_preview) = session.pending_order.take() else {
                    return TurnReply::text(
                        "No order to confirm. Please start by describing what needs repair.",
                    );
                };
                let order = order::finalize(order_preview);
                session.completed_order = Some(order.clone());
                session.phase = ConversationPhase::Completed;

                let text = format!(
                    "🎉 **Order Created Successfully!**\n\n**Order ID:** {}\n**Created:** \
                     {}\n\n**Services:**\n{}\n\n**Total Price:** {}{}\n\nYour repair order is \
                     ready for processing! Is there anything else I can help you with?",
                    order.order_id,
                    order.created_at,
                    format_service_list(&order.services, false),
                    format_price(order.total_price),
                    format_hours(order.estimated_total_hours)
                );
                TurnReply {
                    response: text,
                    selected_services: session.selected_services.clone(),
                    order_created: Some(order),
                    ..TurnReply::default()
                }
            }
            // "yes" while being asked about extra services means "I want to add more"
            ConversationPhase::ManualAddition => TurnReply::text(
                "Please describe the additional service you'd like to add:",
            ),
            _ => TurnReply::text(
                "No order to confirm. Please start by describing what needs repair.",
            ),
        }
    }

    fn on_cancel(&self, session: &mut SessionState) -> TurnReply {
        match session.phase {
            ConversationPhase::Confirming => {
                session.selected_services.clear();
                session.pending_order = None;
                session.phase = ConversationPhase::Selecting;
                TurnReply::with_services(
                    "Selection cleared. Pick another service from the options:".to_string(),
                    session,
                )
            }
            // a bare "no" while being asked about extra services is a decline
            ConversationPhase::ManualAddition if !session.selected_services.is_empty() => {
                self.on_decline_addition(session)
            }
            _ => {
                session.clear_transient();
                session.phase = ConversationPhase::Greeting;
                TurnReply::text(
                    "❌ Order cancelled. Feel free to start over whenever you're ready!",
                )
            }
        }
    }

    fn on_decline_addition(&self, session: &mut SessionState) -> TurnReply {
        if session.selected_services.is_empty() {
            session.phase = ConversationPhase::Greeting;
            return TurnReply::text(
                "No services selected. Please start over by describing what needs repair.",
            );
        }

        let Ok(order_preview) = order::preview(&session.selected_services) else {
            return TurnReply::text(
                "No services selected. Please start over by describing what needs repair.",
            );
        };
        session.pending_order = Some(order_preview.clone());
        session.phase = ConversationPhase::Confirming;

        let text = format!(
            "📋 **Order Summary:**\n\n{}\n\n**Total Price:** {}{}\n\n**Do you want to confirm \
             and create this order?**",
            format_service_list(&session.selected_services, false),
            format_price(order_preview.total_price),
            format_hours(order_preview.estimated_total_hours)
        );
        TurnReply {
            response: text,
            selected_services: session.selected_services.clone(),
            order_summary: Some(order_preview),
            ..TurnReply::default()
        }
    }

    fn on_manual_addition_request(&self, session: &mut SessionState) -> TurnReply {
        match session.phase {
            ConversationPhase::Selecting
            | ConversationPhase::ManualAddition
            | ConversationPhase::Confirming => {
                session.phase = ConversationPhase::ManualAddition;
                session.pending_order = None;
                TurnReply::text("Please describe the additional service you'd like to add:")
            }
            _ => TurnReply::text(
                "Please start by describing what needs to be repaired first.",
            ),
        }
    }

    fn on_introduce_self(&self, session: &mut SessionState, user_input: &str) -> TurnReply {
        if let Some(name) = extract_name(user_input) {
            session.user_name = Some(name);
        }
        if session.phase == ConversationPhase::Completed {
            session.phase = ConversationPhase::Greeting;
        }
        let name = session.user_name.as_deref().unwrap_or("there");
        TurnReply::text(format!(
            "Nice to meet you, {name}! What garment needs fixing today? Please describe the item \
             and the damage you see."
        ))
    }

    async fn on_greeting(&self, session: &mut SessionState) -> TurnReply {
        if session.phase == ConversationPhase::Completed {
            session.phase = ConversationPhase::Greeting;
        }
        TurnReply::text(self.generator.greeting().await)
    }

    async fn on_unknown(&self, session: &mut SessionState, user_input: &str) -> TurnReply {
        match session.phase {
            ConversationPhase::Selecting => TurnReply::with_services(
                "Please select a service from the options above.".to_string(),
                session,
            ),
            // silence while being asked about extras finalizes the order
            ConversationPhase::ManualAddition if !session.selected_services.is_empty() => {
                self.on_decline_addition(session)
            }
            ConversationPhase::Confirming => {
                TurnReply::text("Please answer Yes or No to confirm the order.")
            }
            _ => {
                let clues = context_clues(&session.context);
                TurnReply::text(self.generator.general(user_input, &clues).await)
            }
        }
    }
}

/// Internal per-turn reply before the session-wide fields are stamped on.
#[derive(Debug, Default)]
struct TurnReply {
    response: String,
    show_services: bool,
    services: Vec<ServiceItem>,
    selected_services: Vec<ServiceItem>,
    order_summary: Option<OrderPreview>,
    order_created: Option<OrderSummary>,
}

impl TurnReply {
    fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            ..Self::default()
        }
    }

    fn with_services(response: String, session: &SessionState) -> Self {
        Self {
            response,
            show_services: !session.suggested_services.is_empty(),
            services: session.suggested_services.clone(),
            ..Self::default()
        }
    }
}

fn context_clues(context: &RepairContext) -> Vec<String> {
    let mut clues = Vec::new();
    if let Some(garment) = &context.garment_type {
        clues.push(format!("garment: {garment}"));
    }
    if let Some(fabric) = &context.fabric_type {
        clues.push(format!("fabric: {fabric}"));
    }
    if let Some(damage) = &context.damage_type {
        clues.push(format!("issue: {damage}"));
    }
    clues
}

fn format_price(price: f64) -> String {
    if price > 0.0 {
        format!("${price:.0}")
    } else {
        "Price on request".to_string()
    }
}

fn format_hours(hours: Option<f64>) -> String {
    match hours {
        Some(hours) => format!("\n**Estimated Time:** {hours:.1} hours"),
        None => String::new(),
    }
}

fn format_service_list(services: &[ServiceItem], numbered: bool) -> String {
    if services.is_empty() {
        return "No services found.".to_string();
    }
    services
        .iter()
        .enumerate()
        .map(|(index, service)| {
            let marker = if numbered {
                format!("{}.", index + 1)
            } else {
                "•".to_string()
            };
            format!(
                "{marker} **{}** - {} ({})",
                service.service,
                service.description,
                format_price(service.price)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
