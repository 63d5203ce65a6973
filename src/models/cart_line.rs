use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::errors::PricingError;

/// One product entry in a shopper's cart.
///
/// Quantities are always at least 1: a line driven to zero is removed by the
/// cart session, never kept at zero. Prices are integer amounts in a currency
/// with no fractional minor unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CartLine {
    pub line_id: Uuid,
    pub product_id: Uuid,
    #[validate(range(min = 0))]
    pub unit_price: i64,
    #[validate(range(min = 1))]
    pub quantity: i64,
    /// Free-text preparation note ("extra spicy", "sauce on the side").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CartLine {
    pub fn new(product_id: Uuid, unit_price: i64, quantity: i64) -> Self {
        Self {
            line_id: Uuid::new_v4(),
            product_id,
            unit_price,
            quantity,
            note: None,
        }
    }

    /// Line extension: unit price times quantity, overflow-checked.
    pub fn extension(&self) -> Result<i64, PricingError> {
        self.unit_price.checked_mul(self.quantity).ok_or_else(|| {
            PricingError::ArithmeticOverflow(format!(
                "line {} extension overflows: {} x {}",
                self.line_id, self.unit_price, self.quantity
            ))
        })
    }

    /// Checks the line invariants, mapping failures to `InvalidCartLine`.
    pub fn ensure_valid(&self) -> Result<(), PricingError> {
        self.validate()
            .map_err(|e| PricingError::InvalidCartLine(format!("line {}: {}", self.line_id, e)))
    }
}
