//! Order assembly from selected services.

use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::search::ServiceItem;

/// Tentative order shown before final confirmation. No id, no timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderPreview {
    pub services: Vec<ServiceItem>,
    pub total_price: f64,
    pub estimated_total_hours: Option<f64>,
}

/// A confirmed order. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSummary {
    pub order_id: String,
    pub services: Vec<ServiceItem>,
    pub total_price: f64,
    pub estimated_total_hours: Option<f64>,
    pub created_at: String,
}

/// Build a preview from the current selection. The only failure mode is an
/// empty selection.
pub fn preview(services: &[ServiceItem]) -> AppResult<OrderPreview> {
    if services.is_empty() {
        return Err(AppError::EmptySelection);
    }

    let total_price = services.iter().map(|service| service.price).sum();
    let hours: Vec<f64> = services
        .iter()
        .filter_map(|service| service.estimated_hours)
        .collect();
    let estimated_total_hours = if hours.is_empty() {
        None
    } else {
        Some(hours.iter().sum())
    };

    Ok(OrderPreview {
        services: services.to_vec(),
        total_price,
        estimated_total_hours,
    })
}

/// Stamp a preview into a confirmed order with a fresh id and wall-clock
/// creation time.
pub fn finalize(preview: OrderPreview) -> OrderSummary {
    OrderSummary {
        order_id: generate_order_id(),
        services: preview.services,
        total_price: preview.total_price,
        estimated_total_hours: preview.estimated_total_hours,
        created_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

fn generate_order_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("ORD-{}", hex[..8].to_uppercase())
}
