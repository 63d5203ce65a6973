pub mod cart_line;
pub mod promotion;
pub mod summary;

pub use cart_line::CartLine;
pub use promotion::{IneligibilityReason, Promotion, PromotionKind, PromotionState};
pub use summary::{AppliedPromotion, CartSummary};
