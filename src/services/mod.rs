pub mod cart;
pub mod promotions;

pub use cart::{CartNotice, CartSession, CheckoutSnapshot};
pub use promotions::PromotionDirectory;
