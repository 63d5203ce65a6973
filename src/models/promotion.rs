use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;
use validator::Validate;

use crate::errors::PricingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
pub enum PromotionKind {
    Percentage,
    FixedAmount,
}

/// Why a promotion cannot currently be applied.
///
/// A tagged reason rather than a bare boolean, so UI code can tell "not yet
/// started" from "expired" from "disabled" without re-deriving it from raw
/// dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum IneligibilityReason {
    Disabled,
    NotStarted,
    Expired,
    BelowMinimum,
    UsageExhausted,
}

/// Administrative display state of a promotion, derived from the enabled
/// toggle and the date window. The toggle wins: a disabled promotion is
/// `Disabled` regardless of its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
pub enum PromotionState {
    Disabled,
    Scheduled,
    Active,
    Expired,
}

/// A discount code definition.
///
/// `usage_count` increments only on confirmed order placement; that increment
/// is the order-confirmation collaborator's responsibility, never this
/// engine's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Promotion {
    pub id: Uuid,
    #[validate(length(min = 1))]
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub kind: PromotionKind,
    /// Percentage in (0, 100] or a positive fixed amount, per `kind`.
    pub value: i64,
    #[validate(range(min = 0))]
    pub minimum_order_amount: i64,
    /// Discount cap; meaningful for `Percentage` promotions only.
    pub maximum_discount_amount: Option<i64>,
    pub active_from: DateTime<Utc>,
    /// Inclusive end of the active window.
    pub active_until: DateTime<Utc>,
    pub usage_limit: Option<i64>,
    #[validate(range(min = 0))]
    pub usage_count: i64,
    pub is_enabled: bool,
}

impl Promotion {
    /// Checks the definition invariants, including the kind-dependent value
    /// range that `validator` attributes cannot express. A failure means the
    /// directory data is malformed, not that the shopper did anything wrong.
    pub fn ensure_valid(&self) -> Result<(), PricingError> {
        self.validate()
            .map_err(|e| PricingError::InvalidPromotion(format!("{}: {}", self.code, e)))?;

        match self.kind {
            PromotionKind::Percentage => {
                if self.value <= 0 || self.value > 100 {
                    return Err(PricingError::InvalidPromotion(format!(
                        "{}: percentage value must be in (0, 100], got {}",
                        self.code, self.value
                    )));
                }
            }
            PromotionKind::FixedAmount => {
                if self.value <= 0 {
                    return Err(PricingError::InvalidPromotion(format!(
                        "{}: fixed discount amount must be positive, got {}",
                        self.code, self.value
                    )));
                }
            }
        }

        if let Some(cap) = self.maximum_discount_amount {
            if cap <= 0 {
                return Err(PricingError::InvalidPromotion(format!(
                    "{}: discount cap must be positive, got {}",
                    self.code, cap
                )));
            }
        }

        if self.active_from > self.active_until {
            return Err(PricingError::InvalidPromotion(format!(
                "{}: active window starts after it ends ({} > {})",
                self.code, self.active_from, self.active_until
            )));
        }

        if let Some(limit) = self.usage_limit {
            if limit <= 0 {
                return Err(PricingError::InvalidPromotion(format!(
                    "{}: usage limit must be positive, got {}",
                    self.code, limit
                )));
            }
            if self.usage_count > limit {
                return Err(PricingError::InvalidPromotion(format!(
                    "{}: usage count {} exceeds limit {}",
                    self.code, self.usage_count, limit
                )));
            }
        }

        Ok(())
    }

    /// Derived display state at `now`.
    pub fn state(&self, now: DateTime<Utc>) -> PromotionState {
        if !self.is_enabled {
            PromotionState::Disabled
        } else if now < self.active_from {
            PromotionState::Scheduled
        } else if now > self.active_until {
            PromotionState::Expired
        } else {
            PromotionState::Active
        }
    }
}
