use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::shared::{Money, Principal, Role};
use crate::event_sourcing::core::Aggregate;
use super::commands::{OrderCommand, PlaceOrder};
use super::errors::OrderError;
use super::events::*;
use super::value_objects::*;

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================
//
// Fulfilment status and payment status are two independent state machines.
// Every timestamp comes from the events, so replaying a stream always yields
// the same aggregate.
//
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAggregate {
    // Identity
    pub id: Uuid,
    pub version: i64,
    pub reference: OrderReference,

    // Parties
    pub shopper_id: Uuid,
    pub vendor_id: Uuid,

    // Snapshot taken at checkout
    pub lines: Vec<OrderLine>,
    pub delivery_mode: DeliveryMode,
    pub delivery_address: Option<DeliveryAddress>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub grand_total: Money,

    // Current state (derived from events)
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub status_reason: Option<String>,
    pub history: Vec<StatusHistoryEntry>,
    pub status_timestamps: BTreeMap<OrderStatus, DateTime<Utc>>,

    // Audit trail
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderAggregate {
    /// Shopper and vendor see their own orders; admins see everything
    pub fn is_visible_to(&self, actor: &Principal) -> bool {
        match actor.role {
            Role::Admin => true,
            Role::Shopper => self.shopper_id == actor.user_id,
            Role::Vendor => self.vendor_id == actor.user_id,
        }
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.status_timestamps.get(&OrderStatus::Delivered).copied()
    }

    pub fn units(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    fn ensure_party(&self, actor: &Principal) -> Result<(), OrderError> {
        if self.is_visible_to(actor) {
            Ok(())
        } else {
            Err(OrderError::Forbidden {
                order_id: self.id,
                actor_id: actor.user_id,
                role: actor.role,
            })
        }
    }

    /// Role gate first, then the transition table
    fn check_transition(&self, actor: &Principal, target: OrderStatus) -> Result<(), OrderError> {
        self.ensure_party(actor)?;

        let role_allows = match actor.role {
            Role::Shopper => target == OrderStatus::Cancelled && self.status == OrderStatus::Pending,
            Role::Vendor => matches!(
                target,
                OrderStatus::Preparing | OrderStatus::Ready | OrderStatus::Delivered | OrderStatus::Refused
            ),
            Role::Admin => true,
        };

        if role_allows && self.status.can_transition_to(target) {
            Ok(())
        } else {
            Err(OrderError::InvalidTransition {
                from: self.status,
                to: target,
            })
        }
    }

    fn check_payment(&self, actor: &Principal, target: PaymentStatus) -> Result<bool, OrderError> {
        if actor.role == Role::Shopper {
            return Err(OrderError::Forbidden {
                order_id: self.id,
                actor_id: actor.user_id,
                role: actor.role,
            });
        }
        self.ensure_party(actor)?;

        if target == self.payment_status {
            return Ok(false);
        }
        if !self.payment_status.can_transition_to(target) {
            return Err(OrderError::InvalidPaymentTransition {
                from: self.payment_status,
                to: target,
            });
        }

        // settling happens at the counter: before preparation or once ready
        let context_ok = match target {
            PaymentStatus::Paid | PaymentStatus::Failed => {
                matches!(self.status, OrderStatus::Pending | OrderStatus::Ready)
            }
            PaymentStatus::Refunded | PaymentStatus::Pending => true,
        };
        if !context_ok {
            return Err(OrderError::InvalidPaymentContext {
                status: self.status,
                payment: target,
            });
        }

        Ok(true)
    }
}

fn validate_placement(command: &PlaceOrder) -> Result<(Money, Money), OrderError> {
    if command.lines.is_empty() {
        return Err(OrderError::EmptyLines);
    }

    let mut subtotal = Decimal::ZERO;
    for line in &command.lines {
        if line.quantity == 0 {
            return Err(OrderError::InvalidQuantity(line.product_id));
        }
        if line.unit_price.is_sign_negative() {
            return Err(OrderError::InvalidAmount(format!(
                "negative unit price for product {}",
                line.product_id
            )));
        }
        subtotal += line.unit_price * Decimal::from(line.quantity);
    }

    if command.delivery_fee.is_sign_negative() {
        return Err(OrderError::InvalidAmount("negative delivery fee".into()));
    }

    if command.delivery_mode.requires_address() {
        let missing = match &command.delivery_address {
            Some(address) => address.missing_fields(),
            None => vec!["deliveryAddress"],
        };
        if !missing.is_empty() {
            return Err(OrderError::IncompleteAddress(missing.join(", ")));
        }
    }

    Ok((subtotal, subtotal + command.delivery_fee))
}

fn normalize_reason(reason: &Option<String>) -> Option<String> {
    reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for OrderAggregate {
    type Event = OrderEvent;
    type Command = OrderCommand;
    type Error = OrderError;

    fn initiate(command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let OrderCommand::PlaceOrder { reference, order: place } = command else {
            return Err(OrderError::NotInitialized);
        };

        let (subtotal, grand_total) = validate_placement(place)?;
        let lines = place
            .lines
            .iter()
            .map(|l| OrderLine::new(l.product_id, l.product_name.clone(), l.quantity, l.unit_price))
            .collect();

        Ok(vec![OrderEvent::Created(OrderCreated {
            order_id: place.order_id,
            reference: reference.clone(),
            shopper_id: place.shopper_id,
            vendor_id: place.vendor_id,
            lines,
            delivery_mode: place.delivery_mode,
            delivery_address: if place.delivery_mode.requires_address() {
                place.delivery_address.clone()
            } else {
                None
            },
            payment_method: place.payment_method,
            notes: normalize_reason(&place.notes),
            subtotal,
            delivery_fee: place.delivery_fee,
            grand_total,
            placed_at: Utc::now(),
        })])
    }

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            OrderEvent::Created(e) => {
                let mut status_timestamps = BTreeMap::new();
                status_timestamps.insert(OrderStatus::Pending, e.placed_at);

                Ok(Self {
                    id: e.order_id,
                    version: 0,
                    reference: e.reference.clone(),
                    shopper_id: e.shopper_id,
                    vendor_id: e.vendor_id,
                    lines: e.lines.clone(),
                    delivery_mode: e.delivery_mode,
                    delivery_address: e.delivery_address.clone(),
                    payment_method: e.payment_method,
                    notes: e.notes.clone(),
                    subtotal: e.subtotal,
                    delivery_fee: e.delivery_fee,
                    grand_total: e.grand_total,
                    status: OrderStatus::Pending,
                    payment_status: PaymentStatus::Pending,
                    status_reason: None,
                    history: vec![StatusHistoryEntry {
                        status: OrderStatus::Pending,
                        actor_role: Role::Shopper,
                        actor_id: Some(e.shopper_id),
                        at: e.placed_at,
                        reason: None,
                    }],
                    status_timestamps,
                    placed_at: e.placed_at,
                    updated_at: e.placed_at,
                })
            }
            _ => Err(OrderError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            OrderEvent::Created(e) => Err(OrderError::AlreadyExists(e.order_id)),
            OrderEvent::StatusChanged(e) => {
                self.status = e.to;
                if e.reason.is_some() {
                    self.status_reason = e.reason.clone();
                }
                self.status_timestamps.insert(e.to, e.changed_at);
                self.history.push(StatusHistoryEntry {
                    status: e.to,
                    actor_role: e.actor_role,
                    actor_id: Some(e.actor_id),
                    at: e.changed_at,
                    reason: e.reason.clone(),
                });
                self.updated_at = e.changed_at;
                Ok(())
            }
            OrderEvent::PaymentStatusChanged(e) => {
                self.payment_status = e.to;
                self.updated_at = e.recorded_at;
                Ok(())
            }
        }
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::PlaceOrder { .. } => Err(OrderError::AlreadyExists(self.id)),

            OrderCommand::ChangeStatus { actor, target, reason } => {
                self.check_transition(actor, *target)?;

                Ok(vec![OrderEvent::StatusChanged(OrderStatusChanged {
                    from: self.status,
                    to: *target,
                    actor_role: actor.role,
                    actor_id: actor.user_id,
                    reason: normalize_reason(reason),
                    changed_at: Utc::now(),
                })])
            }

            OrderCommand::RecordPayment { actor, status } => {
                if !self.check_payment(actor, *status)? {
                    return Ok(vec![]);
                }

                Ok(vec![OrderEvent::PaymentStatusChanged(PaymentStatusChanged {
                    from: self.payment_status,
                    to: *status,
                    actor_role: actor.role,
                    actor_id: actor.user_id,
                    recorded_at: Utc::now(),
                })])
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
