use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::promotion::IneligibilityReason;

/// Error type for the pricing engine.
///
/// The recoverable variants are shopper-facing failures that leave the cart
/// untouched; the remaining variants signal invariant violations and indicate
/// a bug in the caller or in the promotion directory data. The engine never
/// clamps bad input into a plausible-looking summary.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricingError {
    #[error("Promotion code not found: {0}")]
    PromotionNotFound(String),

    #[error("Promotion not eligible: {0}")]
    PromotionIneligible(IneligibilityReason),

    #[error("Duplicate promotion code: {0}")]
    DuplicateCode(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid cart line: {0}")]
    InvalidCartLine(String),

    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),

    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),
}

impl PricingError {
    /// Whether the error is a normal shopper-facing outcome (bad code, empty
    /// cart) rather than a defect in the data handed to the engine.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PricingError::PromotionNotFound(_)
                | PricingError::PromotionIneligible(_)
                | PricingError::DuplicateCode(_)
                | PricingError::NotFound(_)
                | PricingError::EmptyCart
        )
    }
}
