use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

use super::Esim;

/// Fulfillment progress of an order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, sqlx::Type)]
#[sqlx(type_name = "purchase_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Pending,
    CodeSent,
    Activated,
    Expired,
}

impl Display for PurchaseStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PurchaseStatus::Pending => write!(f, "pending"),
            PurchaseStatus::CodeSent => write!(f, "code_sent"),
            PurchaseStatus::Activated => write!(f, "activated"),
            PurchaseStatus::Expired => write!(f, "expired"),
        }
    }
}

/// Payment state of an order. `Failed` and `Refunded` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// The payment transition table. Single source of truth for
    /// validation; resubmitting the current status is never allowed.
    pub fn allowed_transitions(self) -> &'static [PaymentStatus] {
        match self {
            PaymentStatus::Pending => &[PaymentStatus::Completed, PaymentStatus::Failed],
            PaymentStatus::Completed => &[PaymentStatus::Refunded],
            PaymentStatus::Failed => &[],
            PaymentStatus::Refunded => &[],
        }
    }

    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Completed => write!(f, "completed"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

/// Customer purchase record. Binds to at most one esim while fulfilled.
///
/// `amount` is copied from the plan price at creation and immutable through
/// the payment lifecycle; `expiry_date` is computed once at creation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub plan_id: Uuid,
    pub esim_id: Option<Uuid>,
    pub order_number: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub currency: String,
    pub purchase_status: PurchaseStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    pub transaction_id: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub activation_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order plus its bound esim (when any) for detail responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub esim: Option<Esim>,
}

/// Generate a new order number: `ORD-<unix millis>-<3-digit random>`.
/// Uniqueness is enforced by the database; a collision surfaces as a
/// conflict and the caller retries with a fresh number.
pub fn generate_order_number() -> String {
    use rand::Rng;
    let millis = Utc::now().timestamp_millis();
    let suffix: u32 = rand::rng().random_range(0..1000);
    format!("ORD-{}-{:03}", millis, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Completed,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    /// Every (current, requested) pair resolves exactly per the table,
    /// including the no-op resubmission of the current status.
    #[test]
    fn transition_table_is_complete() {
        for current in ALL {
            for requested in ALL {
                let expected = matches!(
                    (current, requested),
                    (PaymentStatus::Pending, PaymentStatus::Completed)
                        | (PaymentStatus::Pending, PaymentStatus::Failed)
                        | (PaymentStatus::Completed, PaymentStatus::Refunded)
                );
                assert_eq!(
                    current.can_transition_to(requested),
                    expected,
                    "{} -> {}",
                    current,
                    requested
                );
            }
        }
    }

    #[test]
    fn terminal_states_allow_nothing() {
        assert!(PaymentStatus::Failed.allowed_transitions().is_empty());
        assert!(PaymentStatus::Refunded.allowed_transitions().is_empty());
    }

    #[test]
    fn resubmitting_current_status_is_rejected() {
        for status in ALL {
            assert!(!status.can_transition_to(status), "{} -> {}", status, status);
        }
    }

    #[test]
    fn order_number_format() {
        let n = generate_order_number();
        let parts: Vec<&str> = n.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 3);
        assert!(parts[2].parse::<u32>().is_ok());
    }
}
