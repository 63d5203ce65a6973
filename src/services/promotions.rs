use chrono::{DateTime, Utc};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
    errors::PricingError,
    models::promotion::{IneligibilityReason, Promotion, PromotionKind, PromotionState},
};

/// In-memory directory of promotion codes.
///
/// Lookup is case-insensitive and tolerates surrounding whitespace.
/// Administrative mutations validate the definition before accepting it, so a
/// malformed promotion never enters the directory.
#[derive(Debug, Clone, Default)]
pub struct PromotionDirectory {
    promotions: Vec<Promotion>,
}

impl PromotionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a directory from a fetched promotion list, validating every
    /// entry and rejecting duplicate codes.
    pub fn with_promotions(promotions: Vec<Promotion>) -> Result<Self, PricingError> {
        let mut directory = Self::new();
        for promotion in promotions {
            directory.add(promotion)?;
        }
        Ok(directory)
    }

    fn normalize(code: &str) -> String {
        code.trim().to_lowercase()
    }

    /// Finds a promotion by code. Empty or whitespace-only input never
    /// matches. The directory is not mutated.
    pub fn find(&self, code: &str) -> Result<&Promotion, PricingError> {
        let normalized = Self::normalize(code);
        if normalized.is_empty() {
            return Err(PricingError::PromotionNotFound(code.to_string()));
        }
        self.promotions
            .iter()
            .find(|p| Self::normalize(&p.code) == normalized)
            .ok_or_else(|| PricingError::PromotionNotFound(code.trim().to_string()))
    }

    pub fn get(&self, id: Uuid) -> Option<&Promotion> {
        self.promotions.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Promotion> {
        self.promotions.iter()
    }

    pub fn len(&self) -> usize {
        self.promotions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.promotions.is_empty()
    }

    /// Adds a new promotion after validating it and checking for a
    /// case-insensitive code collision.
    #[instrument(skip(self, promotion), fields(code = %promotion.code))]
    pub fn add(&mut self, promotion: Promotion) -> Result<(), PricingError> {
        promotion.ensure_valid()?;
        if self.find(&promotion.code).is_ok() {
            return Err(PricingError::DuplicateCode(promotion.code));
        }
        debug!("promotion added");
        self.promotions.push(promotion);
        Ok(())
    }

    /// Replaces an existing promotion (matched by id) with an edited
    /// definition. Renaming onto another entry's code is rejected.
    pub fn update(&mut self, promotion: Promotion) -> Result<(), PricingError> {
        promotion.ensure_valid()?;
        let index = self
            .promotions
            .iter()
            .position(|p| p.id == promotion.id)
            .ok_or_else(|| PricingError::NotFound(format!("promotion {}", promotion.id)))?;
        let collision = self.promotions.iter().any(|p| {
            p.id != promotion.id && Self::normalize(&p.code) == Self::normalize(&promotion.code)
        });
        if collision {
            return Err(PricingError::DuplicateCode(promotion.code));
        }
        self.promotions[index] = promotion;
        Ok(())
    }

    pub fn remove(&mut self, id: Uuid) -> Result<Promotion, PricingError> {
        let index = self
            .promotions
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| PricingError::NotFound(format!("promotion {}", id)))?;
        Ok(self.promotions.remove(index))
    }

    /// Flips the enabled toggle without touching the date window.
    pub fn set_enabled(&mut self, id: Uuid, enabled: bool) -> Result<(), PricingError> {
        let promotion = self
            .promotions
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PricingError::NotFound(format!("promotion {}", id)))?;
        promotion.is_enabled = enabled;
        Ok(())
    }

    /// Display state of every promotion at `now`, for admin listings.
    pub fn states(&self, now: DateTime<Utc>) -> Vec<(Uuid, PromotionState)> {
        self.promotions
            .iter()
            .map(|p| (p.id, p.state(now)))
            .collect()
    }
}

/// Checks every eligibility rule for a promotion against a subtotal at a
/// given instant, returning the first failing rule. The window is inclusive
/// on both ends. No side effects; `usage_count` is never touched here.
pub fn eligibility(
    promotion: &Promotion,
    subtotal: i64,
    now: DateTime<Utc>,
) -> Result<(), IneligibilityReason> {
    if !promotion.is_enabled {
        return Err(IneligibilityReason::Disabled);
    }
    if now < promotion.active_from {
        return Err(IneligibilityReason::NotStarted);
    }
    if now > promotion.active_until {
        return Err(IneligibilityReason::Expired);
    }
    if subtotal < promotion.minimum_order_amount {
        return Err(IneligibilityReason::BelowMinimum);
    }
    if let Some(limit) = promotion.usage_limit {
        if promotion.usage_count >= limit {
            return Err(IneligibilityReason::UsageExhausted);
        }
    }
    Ok(())
}

/// Boolean convenience wrapper around [`eligibility`].
pub fn is_eligible(promotion: &Promotion, subtotal: i64, now: DateTime<Utc>) -> bool {
    eligibility(promotion, subtotal, now).is_ok()
}

/// Computes the discount for an already-eligible promotion.
///
/// Integer arithmetic only. Percentage math floors, so the shopper is never
/// overcharged relative to the advertised rate; a fixed discount never
/// exceeds the subtotal. The cap applies to percentage promotions only.
/// The result is always in `[0, subtotal]`.
pub fn compute_discount(promotion: &Promotion, subtotal: i64) -> Result<i64, PricingError> {
    promotion.ensure_valid()?;
    if subtotal < 0 {
        return Err(PricingError::InvalidInput(format!(
            "subtotal must be non-negative, got {}",
            subtotal
        )));
    }

    let discount = match promotion.kind {
        PromotionKind::FixedAmount => promotion.value.min(subtotal),
        PromotionKind::Percentage => {
            let raw = subtotal
                .checked_mul(promotion.value)
                .ok_or_else(|| {
                    PricingError::ArithmeticOverflow(format!(
                        "{}% of subtotal {} overflows i64",
                        promotion.value, subtotal
                    ))
                })?
                / 100;
            match promotion.maximum_discount_amount {
                Some(cap) => raw.min(cap),
                None => raw,
            }
        }
    };

    Ok(discount.min(subtotal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;
    use rstest::rstest;

    fn welcome20(now: DateTime<Utc>) -> Promotion {
        Promotion {
            id: Uuid::new_v4(),
            code: "WELCOME20".to_string(),
            description: Some("20% off for new customers".to_string()),
            kind: PromotionKind::Percentage,
            value: 20,
            minimum_order_amount: 30000,
            maximum_discount_amount: Some(15000),
            active_from: now - Duration::days(7),
            active_until: now + Duration::days(7),
            usage_limit: None,
            usage_count: 0,
            is_enabled: true,
        }
    }

    fn hemat10k(now: DateTime<Utc>) -> Promotion {
        Promotion {
            id: Uuid::new_v4(),
            code: "HEMAT10K".to_string(),
            description: Some("Flat 10000 off".to_string()),
            kind: PromotionKind::FixedAmount,
            value: 10000,
            minimum_order_amount: 0,
            maximum_discount_amount: None,
            active_from: now - Duration::days(7),
            active_until: now + Duration::days(7),
            usage_limit: Some(100),
            usage_count: 45,
            is_enabled: true,
        }
    }

    fn directory(now: DateTime<Utc>) -> PromotionDirectory {
        PromotionDirectory::with_promotions(vec![welcome20(now), hemat10k(now)]).unwrap()
    }

    #[rstest]
    #[case("WELCOME20")]
    #[case("welcome20")]
    #[case("WeLcOmE20")]
    #[case("  WELCOME20  ")]
    fn find_is_case_insensitive_and_trims(#[case] input: &str) {
        let directory = directory(Utc::now());
        let found = directory.find(input).unwrap();
        assert_eq!(found.code, "WELCOME20");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("NOPE")]
    fn find_rejects_blank_and_unknown(#[case] input: &str) {
        let directory = directory(Utc::now());
        assert_matches!(
            directory.find(input),
            Err(PricingError::PromotionNotFound(_))
        );
    }

    #[test]
    fn duplicate_code_is_rejected_case_insensitively() {
        let now = Utc::now();
        let mut directory = directory(now);
        let mut dup = welcome20(now);
        dup.code = "welcome20".to_string();
        assert_matches!(directory.add(dup), Err(PricingError::DuplicateCode(_)));
    }

    #[test]
    fn update_rejects_renaming_onto_existing_code() {
        let now = Utc::now();
        let mut directory = PromotionDirectory::new();
        let a = welcome20(now);
        let b = hemat10k(now);
        let b_id = b.id;
        directory.add(a).unwrap();
        directory.add(b).unwrap();

        let mut renamed = directory.get(b_id).unwrap().clone();
        renamed.code = "welcome20".to_string();
        assert_matches!(
            directory.update(renamed),
            Err(PricingError::DuplicateCode(_))
        );
    }

    #[test]
    fn set_enabled_toggles_without_touching_window() {
        let now = Utc::now();
        let mut directory = PromotionDirectory::new();
        let promo = welcome20(now);
        let id = promo.id;
        let window = (promo.active_from, promo.active_until);
        directory.add(promo).unwrap();

        directory.set_enabled(id, false).unwrap();
        let stored = directory.get(id).unwrap();
        assert!(!stored.is_enabled);
        assert_eq!((stored.active_from, stored.active_until), window);
        assert_eq!(stored.state(now), PromotionState::Disabled);
    }

    #[rstest]
    #[case(40000, Ok(()))]
    #[case(30000, Ok(()))]
    #[case(29999, Err(IneligibilityReason::BelowMinimum))]
    fn eligibility_minimum_order(
        #[case] subtotal: i64,
        #[case] expected: Result<(), IneligibilityReason>,
    ) {
        let now = Utc::now();
        assert_eq!(eligibility(&welcome20(now), subtotal, now), expected);
    }

    #[test]
    fn eligibility_distinguishes_window_reasons() {
        let now = Utc::now();
        let mut promo = welcome20(now);

        promo.active_from = now + Duration::days(1);
        promo.active_until = now + Duration::days(2);
        assert_eq!(
            eligibility(&promo, 50000, now),
            Err(IneligibilityReason::NotStarted)
        );

        promo.active_from = now - Duration::days(2);
        promo.active_until = now - Duration::days(1);
        assert_eq!(
            eligibility(&promo, 50000, now),
            Err(IneligibilityReason::Expired)
        );
    }

    #[test]
    fn eligibility_window_is_inclusive() {
        let now = Utc::now();
        let mut promo = welcome20(now);
        promo.active_from = now;
        promo.active_until = now;
        assert!(is_eligible(&promo, 50000, now));
    }

    #[test]
    fn eligibility_disabled_wins() {
        let now = Utc::now();
        let mut promo = welcome20(now);
        promo.is_enabled = false;
        assert_eq!(
            eligibility(&promo, 50000, now),
            Err(IneligibilityReason::Disabled)
        );
    }

    #[test]
    fn eligibility_usage_limit() {
        let now = Utc::now();
        let mut promo = hemat10k(now);
        promo.usage_count = 100;
        assert_eq!(
            eligibility(&promo, 50000, now),
            Err(IneligibilityReason::UsageExhausted)
        );

        promo.usage_count = 99;
        assert!(is_eligible(&promo, 50000, now));
    }

    #[test]
    fn percentage_discount_floors() {
        let now = Utc::now();
        let mut promo = welcome20(now);
        promo.value = 33;
        promo.maximum_discount_amount = None;
        promo.minimum_order_amount = 0;
        // floor(100 * 33 / 100) = 33, floor(101 * 33 / 100) = 33
        assert_eq!(compute_discount(&promo, 100).unwrap(), 33);
        assert_eq!(compute_discount(&promo, 101).unwrap(), 33);
    }

    #[test]
    fn percentage_discount_respects_cap() {
        let now = Utc::now();
        let promo = welcome20(now);
        // 20% of 1_000_000 is 200_000, capped at 15_000
        assert_eq!(compute_discount(&promo, 1_000_000).unwrap(), 15000);
    }

    #[test]
    fn fixed_discount_never_exceeds_subtotal() {
        let now = Utc::now();
        let promo = hemat10k(now);
        assert_eq!(compute_discount(&promo, 4000).unwrap(), 4000);
        assert_eq!(compute_discount(&promo, 40000).unwrap(), 10000);
    }

    #[test]
    fn cap_does_not_apply_to_fixed_amount() {
        let now = Utc::now();
        let mut promo = hemat10k(now);
        promo.maximum_discount_amount = Some(500);
        assert_eq!(compute_discount(&promo, 40000).unwrap(), 10000);
    }

    #[test]
    fn malformed_promotion_is_a_fatal_error() {
        let now = Utc::now();
        let mut promo = welcome20(now);
        promo.value = 150;
        assert_matches!(
            compute_discount(&promo, 40000),
            Err(PricingError::InvalidPromotion(_))
        );
    }

    #[test]
    fn negative_subtotal_is_rejected() {
        let now = Utc::now();
        let promo = welcome20(now);
        assert_matches!(
            compute_discount(&promo, -1),
            Err(PricingError::InvalidInput(_))
        );
    }
}
