//! Cart pricing and promotion-code engine for a campus canteen ordering
//! platform.
//!
//! The engine is a pure, synchronous computation over in-memory values: the
//! storefront fetches cart lines and the promotion directory from its
//! backend, hands them to this crate, and gets back a [`CartSummary`] plus
//! any notices. Nothing here blocks, retries, or persists. The cart session
//! takes the directory and the current instant as parameters rather than
//! reading ambient state, so every computation is reproducible in tests.
//!
//! ```
//! use canteen_pricing::{CartSession, Promotion, PromotionDirectory, PromotionKind};
//! use chrono::{Duration, Utc};
//! use uuid::Uuid;
//!
//! let now = Utc::now();
//! let directory = PromotionDirectory::with_promotions(vec![Promotion {
//!     id: Uuid::new_v4(),
//!     code: "WELCOME20".into(),
//!     description: None,
//!     kind: PromotionKind::Percentage,
//!     value: 20,
//!     minimum_order_amount: 30000,
//!     maximum_discount_amount: Some(15000),
//!     active_from: now - Duration::days(1),
//!     active_until: now + Duration::days(30),
//!     usage_limit: None,
//!     usage_count: 0,
//!     is_enabled: true,
//! }])?;
//!
//! let mut cart = CartSession::new(2000)?;
//! cart.add_line(Uuid::new_v4(), 15000, 2, &directory, now)?;
//! cart.add_line(Uuid::new_v4(), 5000, 2, &directory, now)?;
//! cart.apply_code(&directory, "welcome20", now)?;
//!
//! assert_eq!(cart.summary().subtotal, 40000);
//! assert_eq!(cart.summary().discount_amount, 8000);
//! assert_eq!(cart.summary().total, 34000);
//! # Ok::<(), canteen_pricing::PricingError>(())
//! ```
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod errors;
pub mod models;
pub mod money;
pub mod services;

pub use config::{load_config, PricingConfig, PricingConfigError};
pub use errors::PricingError;
pub use models::{
    AppliedPromotion, CartLine, CartSummary, IneligibilityReason, Promotion, PromotionKind,
    PromotionState,
};
pub use money::{format_amount, CurrencyFormat};
pub use services::cart::{compose, CartNotice, CartSession, CheckoutSnapshot};
pub use services::promotions::{
    compute_discount, eligibility, is_eligible, PromotionDirectory,
};
