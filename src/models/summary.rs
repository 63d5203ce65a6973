use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::promotion::Promotion;

/// The promotion attached to a summary: a reference by id and code, not an
/// owned copy of the directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedPromotion {
    pub promotion_id: Uuid,
    pub code: String,
}

impl AppliedPromotion {
    pub fn of(promotion: &Promotion) -> Self {
        Self {
            promotion_id: promotion.id,
            code: promotion.code.clone(),
        }
    }
}

/// Computed pricing snapshot for a cart at a point in time.
///
/// Derived, never persisted: always a pure function of the current lines and
/// the applied promotion. If a promotion is attached, its eligibility held
/// against this exact subtotal when the summary was composed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    pub subtotal: i64,
    pub service_fee: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_promotion: Option<AppliedPromotion>,
    pub discount_amount: i64,
    pub total: i64,
}

impl CartSummary {
    /// Summary of an empty cart: no lines, no discount, just the fee.
    pub fn empty(service_fee: i64) -> Self {
        Self {
            subtotal: 0,
            service_fee,
            applied_promotion: None,
            discount_amount: 0,
            total: service_fee,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_round_trips_through_json() {
        let summary = CartSummary {
            subtotal: 40000,
            service_fee: 2000,
            applied_promotion: Some(AppliedPromotion {
                promotion_id: Uuid::new_v4(),
                code: "WELCOME20".to_string(),
            }),
            discount_amount: 8000,
            total: 34000,
        };

        let json = serde_json::to_string(&summary).unwrap();
        let back: CartSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }

    #[test]
    fn empty_summary_omits_the_promotion_field() {
        let json = serde_json::to_value(CartSummary::empty(2000)).unwrap();
        assert!(json.get("applied_promotion").is_none());
        assert_eq!(json["total"], 2000);
    }
}
