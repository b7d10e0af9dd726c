use serde::Serialize;

use crate::domain::order::{OrderAggregate, OrderStatus, PaymentStatus};

// ============================================================================
// Presentation Labels
// ============================================================================
//
// The core only knows the enumerated statuses; labels, icons and CSS classes
// for clients live here.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusLabel {
    pub code: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub css_class: &'static str,
}

pub fn order_status_label(status: OrderStatus) -> StatusLabel {
    let (label, icon, css_class) = match status {
        OrderStatus::Pending => ("En attente", "clock", "badge-warning"),
        OrderStatus::Preparing => ("En préparation", "package", "badge-info"),
        OrderStatus::Ready => ("Prête", "check-circle", "badge-primary"),
        OrderStatus::Delivered => ("Livrée", "truck", "badge-success"),
        OrderStatus::Cancelled => ("Annulée", "x-circle", "badge-secondary"),
        OrderStatus::Refused => ("Refusée", "slash", "badge-danger"),
    };
    StatusLabel {
        code: status.as_str(),
        label,
        icon,
        css_class,
    }
}

pub fn payment_status_label(status: PaymentStatus) -> StatusLabel {
    let (label, icon, css_class) = match status {
        PaymentStatus::Pending => ("En attente", "clock", "badge-warning"),
        PaymentStatus::Paid => ("Payé", "credit-card", "badge-success"),
        PaymentStatus::Failed => ("Échoué", "alert-triangle", "badge-danger"),
        PaymentStatus::Refunded => ("Remboursé", "rotate-ccw", "badge-info"),
    };
    StatusLabel {
        code: status.as_str(),
        label,
        icon,
        css_class,
    }
}

/// Order as returned by the API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: OrderAggregate,
    pub status_label: StatusLabel,
    pub payment_label: StatusLabel,
}

impl From<OrderAggregate> for OrderView {
    fn from(order: OrderAggregate) -> Self {
        Self {
            status_label: order_status_label(order.status),
            payment_label: payment_status_label(order.payment_status),
            order,
        }
    }
}
