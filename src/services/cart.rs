use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{
    errors::PricingError,
    models::{
        cart_line::CartLine,
        promotion::{IneligibilityReason, Promotion},
        summary::{AppliedPromotion, CartSummary},
    },
    services::promotions::{self, PromotionDirectory},
};

/// Informational notice surfaced by a recompute. Not an error: automatic
/// invalidation resolves itself and must not fail the recompute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartNotice {
    /// A previously applied promotion failed re-eligibility after a cart
    /// mutation and was detached in the same pass.
    PromotionRemoved {
        code: String,
        reason: IneligibilityReason,
    },
}

/// Final pricing snapshot handed to the order-confirmation collaborator.
/// Incrementing the promotion's usage count on confirmation is that
/// collaborator's job, not this engine's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSnapshot {
    pub lines: Vec<CartLine>,
    pub summary: CartSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion_code: Option<String>,
}

/// Composes a `CartSummary` from the current lines, the service fee, and the
/// optionally attached promotion.
///
/// Eligibility is re-checked against the freshly computed subtotal: a
/// promotion that no longer qualifies is dropped in the same pass and
/// reported through the returned notice, so no stale discount survives a
/// disqualifying edit. Pure and idempotent; identical inputs produce
/// identical summaries.
pub fn compose(
    lines: &[CartLine],
    service_fee: i64,
    applied: Option<&Promotion>,
    now: DateTime<Utc>,
) -> Result<(CartSummary, Option<CartNotice>), PricingError> {
    if service_fee < 0 {
        return Err(PricingError::InvalidInput(format!(
            "service fee must be non-negative, got {}",
            service_fee
        )));
    }

    let mut subtotal: i64 = 0;
    for line in lines {
        line.ensure_valid()?;
        subtotal = subtotal.checked_add(line.extension()?).ok_or_else(|| {
            PricingError::ArithmeticOverflow("cart subtotal overflows i64".to_string())
        })?;
    }

    let gross = subtotal.checked_add(service_fee).ok_or_else(|| {
        PricingError::ArithmeticOverflow("subtotal plus service fee overflows i64".to_string())
    })?;

    let promotion = match applied {
        None => {
            return Ok((
                CartSummary {
                    subtotal,
                    service_fee,
                    applied_promotion: None,
                    discount_amount: 0,
                    total: gross,
                },
                None,
            ))
        }
        Some(promotion) => promotion,
    };

    promotion.ensure_valid()?;

    match promotions::eligibility(promotion, subtotal, now) {
        Err(reason) => {
            debug!(code = %promotion.code, %reason, "applied promotion no longer eligible, detaching");
            Ok((
                CartSummary {
                    subtotal,
                    service_fee,
                    applied_promotion: None,
                    discount_amount: 0,
                    total: gross,
                },
                Some(CartNotice::PromotionRemoved {
                    code: promotion.code.clone(),
                    reason,
                }),
            ))
        }
        Ok(()) => {
            let discount_amount = promotions::compute_discount(promotion, subtotal)?;
            // discount_amount <= subtotal, so this never underflows
            Ok((
                CartSummary {
                    subtotal,
                    service_fee,
                    applied_promotion: Some(AppliedPromotion::of(promotion)),
                    discount_amount,
                    total: gross - discount_amount,
                },
                None,
            ))
        }
    }
}

/// Stateful cart for one shopper session.
///
/// Owns the line items and the currently applied promotion code, recomputing
/// the summary synchronously after every mutation. The promotion directory
/// and the current instant are passed in rather than read from ambient state.
/// Single-writer: the caller serializes concurrent events before touching the
/// session.
#[derive(Debug, Clone)]
pub struct CartSession {
    service_fee: i64,
    lines: Vec<CartLine>,
    applied_code: Option<String>,
    summary: CartSummary,
}

impl CartSession {
    /// Creates an empty session. The fee is validated here so even a cart
    /// that was never mutated cannot expose a summary with a negative total.
    pub fn new(service_fee: i64) -> Result<Self, PricingError> {
        if service_fee < 0 {
            return Err(PricingError::InvalidInput(format!(
                "service fee must be non-negative, got {}",
                service_fee
            )));
        }
        Ok(Self {
            service_fee,
            lines: Vec::new(),
            applied_code: None,
            summary: CartSummary::empty(service_fee),
        })
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn summary(&self) -> &CartSummary {
        &self.summary
    }

    pub fn applied_code(&self) -> Option<&str> {
        self.applied_code.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds a product to the cart, merging the quantity into an existing line
    /// for the same product instead of creating a duplicate.
    #[instrument(skip(self, directory))]
    pub fn add_line(
        &mut self,
        product_id: Uuid,
        unit_price: i64,
        quantity: i64,
        directory: &PromotionDirectory,
        now: DateTime<Utc>,
    ) -> Result<Option<CartNotice>, PricingError> {
        let candidate = CartLine::new(product_id, unit_price, quantity);
        candidate.ensure_valid()?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = line.quantity.checked_add(quantity).ok_or_else(|| {
                PricingError::ArithmeticOverflow(format!(
                    "quantity overflows for product {}",
                    product_id
                ))
            })?;
        } else {
            self.lines.push(candidate);
        }
        self.recompute(directory, now)
    }

    /// Increments a line's quantity by one.
    pub fn increment(
        &mut self,
        line_id: Uuid,
        directory: &PromotionDirectory,
        now: DateTime<Utc>,
    ) -> Result<Option<CartNotice>, PricingError> {
        let line = self.line_mut(line_id)?;
        line.quantity = line.quantity.checked_add(1).ok_or_else(|| {
            PricingError::ArithmeticOverflow(format!("quantity overflows for line {}", line_id))
        })?;
        self.recompute(directory, now)
    }

    /// Decrements a line's quantity by one; at quantity 1 the line is
    /// removed. A quantity of 0 is never kept.
    pub fn decrement(
        &mut self,
        line_id: Uuid,
        directory: &PromotionDirectory,
        now: DateTime<Utc>,
    ) -> Result<Option<CartNotice>, PricingError> {
        let line = self.line_mut(line_id)?;
        if line.quantity > 1 {
            line.quantity -= 1;
        } else {
            self.lines.retain(|l| l.line_id != line_id);
        }
        self.recompute(directory, now)
    }

    /// Sets a line's quantity directly; 0 removes the line, negative input is
    /// rejected.
    pub fn set_quantity(
        &mut self,
        line_id: Uuid,
        quantity: i64,
        directory: &PromotionDirectory,
        now: DateTime<Utc>,
    ) -> Result<Option<CartNotice>, PricingError> {
        if quantity < 0 {
            return Err(PricingError::InvalidInput(format!(
                "quantity must be non-negative, got {}",
                quantity
            )));
        }
        if quantity == 0 {
            return self.remove_line(line_id, directory, now);
        }
        let line = self.line_mut(line_id)?;
        line.quantity = quantity;
        self.recompute(directory, now)
    }

    /// Edits the preparation note on a line. Pricing is unaffected but the
    /// summary is recomputed anyway, keeping the one code path.
    pub fn set_note(
        &mut self,
        line_id: Uuid,
        note: Option<String>,
        directory: &PromotionDirectory,
        now: DateTime<Utc>,
    ) -> Result<Option<CartNotice>, PricingError> {
        let line = self.line_mut(line_id)?;
        line.note = note;
        self.recompute(directory, now)
    }

    #[instrument(skip(self, directory))]
    pub fn remove_line(
        &mut self,
        line_id: Uuid,
        directory: &PromotionDirectory,
        now: DateTime<Utc>,
    ) -> Result<Option<CartNotice>, PricingError> {
        let before = self.lines.len();
        self.lines.retain(|l| l.line_id != line_id);
        if self.lines.len() == before {
            return Err(PricingError::NotFound(format!("cart line {}", line_id)));
        }
        self.recompute(directory, now)
    }

    /// Applies a promotion code to the cart.
    ///
    /// An unknown code or a found-but-ineligible code returns the specific
    /// error and leaves the session exactly as it was; there is no partial
    /// state. On success the session transitions to Applied and the summary
    /// carries the discount.
    #[instrument(skip(self, directory))]
    pub fn apply_code(
        &mut self,
        directory: &PromotionDirectory,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<(), PricingError> {
        let promotion = directory.find(code)?;
        promotions::eligibility(promotion, self.summary.subtotal, now)
            .map_err(PricingError::PromotionIneligible)?;

        let (summary, _) = compose(&self.lines, self.service_fee, Some(promotion), now)?;
        info!(code = %promotion.code, discount = summary.discount_amount, "promotion applied");
        self.applied_code = Some(promotion.code.clone());
        self.summary = summary;
        Ok(())
    }

    /// Explicit shopper removal of the applied code.
    pub fn remove_code(&mut self, now: DateTime<Utc>) -> Result<(), PricingError> {
        if self.applied_code.take().is_some() {
            let (summary, _) = compose(&self.lines, self.service_fee, None, now)?;
            self.summary = summary;
        }
        Ok(())
    }

    /// Validates the cart for checkout and returns the final snapshot for the
    /// order-confirmation call. An empty cart cannot be checked out. The
    /// summary is the one recomputed on the last mutation; no fresh clock
    /// read is needed here.
    pub fn checkout(&self) -> Result<CheckoutSnapshot, PricingError> {
        if self.lines.is_empty() {
            return Err(PricingError::EmptyCart);
        }
        Ok(CheckoutSnapshot {
            lines: self.lines.clone(),
            summary: self.summary.clone(),
            promotion_code: self.applied_code.clone(),
        })
    }

    fn line_mut(&mut self, line_id: Uuid) -> Result<&mut CartLine, PricingError> {
        self.lines
            .iter_mut()
            .find(|l| l.line_id == line_id)
            .ok_or_else(|| PricingError::NotFound(format!("cart line {}", line_id)))
    }

    /// Recomputes the summary from current state, detaching the applied
    /// promotion if it no longer qualifies. A code the directory no longer
    /// offers counts as disabled.
    fn recompute(
        &mut self,
        directory: &PromotionDirectory,
        now: DateTime<Utc>,
    ) -> Result<Option<CartNotice>, PricingError> {
        let promotion = match &self.applied_code {
            None => None,
            Some(code) => match directory.find(code) {
                Ok(promotion) => Some(promotion),
                Err(_) => {
                    let code = self.applied_code.take().unwrap_or_default();
                    let (summary, _) = compose(&self.lines, self.service_fee, None, now)?;
                    self.summary = summary;
                    return Ok(Some(CartNotice::PromotionRemoved {
                        code,
                        reason: IneligibilityReason::Disabled,
                    }));
                }
            },
        };

        let (summary, notice) = compose(&self.lines, self.service_fee, promotion, now)?;
        if notice.is_some() {
            self.applied_code = None;
        }
        self.summary = summary;
        Ok(notice)
    }
}
